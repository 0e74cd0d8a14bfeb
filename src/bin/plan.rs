use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::info;

use gaffer::config::{Config, ConfigDelta};
use gaffer::domain::Horizon;
use gaffer::feed;
use gaffer::filter;
use gaffer::model;
use gaffer::optimiser;
use gaffer::print;
use gaffer::projections;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// projection tables to blend (ID,Name,Pos,Team,Value,{gw}_Pts,{gw}_xMins);
    /// the first table doubles as the authoritative player list
    #[clap(short = 'p', long, required = true, num_args = 1..)]
    projections: Vec<PathBuf>,

    /// blend weight per projection table; defaults to 1 each
    #[clap(short = 'w', long, num_args = 0..)]
    weights: Vec<f64>,

    /// current squad state (JSON)
    #[clap(short = 's', long)]
    squad: PathBuf,

    /// config layers, overlaid left to right (JSON)
    #[clap(short = 'c', long, num_args = 0..)]
    config: Vec<PathBuf>,

    /// first gameweek of the horizon; defaults to the earliest projected
    #[clap(long)]
    first_gw: Option<u8>,

    /// planning horizon override
    #[clap(long)]
    horizon: Option<u8>,

    /// alternative plans to produce
    #[clap(long)]
    iterations: Option<u32>,

    /// write the returned solutions as JSON
    #[clap(short = 'o', long)]
    out: Option<PathBuf>,

    /// dump the built model in MPS before solving
    #[clap(long)]
    mps: Option<PathBuf>,

    /// print the full squad sheet for every gameweek
    #[clap(long)]
    detail: bool,
}

impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if !self.weights.is_empty() && self.weights.len() != self.projections.len() {
            bail!("one -w per projection table, or none at all");
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    args.validate()?;

    let mut layers = vec![];
    for path in &args.config {
        layers.push(Config::load_layer(path)?);
    }
    layers.push(ConfigDelta {
        horizon: args.horizon,
        num_iterations: args.iterations,
        ..ConfigDelta::default()
    });
    let config = Config::resolve(layers);
    config.validate()?;

    let mut listing = vec![];
    let mut sources = vec![];
    for (index, path) in args.projections.iter().enumerate() {
        let weight = args.weights.get(index).copied().unwrap_or(1.0);
        let (table_listing, source) = feed::read_projection_csv(path, weight)?;
        if listing.is_empty() {
            listing = table_listing;
        }
        sources.push(source);
    }
    let first = args
        .first_gw
        .or_else(|| {
            sources
                .iter()
                .filter_map(feed::first_projected_gameweek)
                .min()
        })
        .ok_or("no projected gameweeks found")?;
    let horizon = Horizon::new(first, config.horizon);

    let pool = projections::merge(&listing, &sources, horizon)?;
    let squad = feed::read_squad_json(&args.squad)?;

    if let Some(path) = &args.mps {
        let shortlist = filter::shortlist(&pool, &squad, &config);
        let problem = model::build(&shortlist, &squad, &config)?;
        problem.lp.write_mps(&mut File::create(path)?)?;
        info!(
            "dumped {} columns and {} rows to {}",
            problem.lp.num_columns(),
            problem.lp.num_rows(),
            path.display()
        );
    }

    let solutions = optimiser::plan(&pool, &squad, &config)?;
    for (index, solution) in solutions.iter().enumerate() {
        println!(
            "plan {} of {} | score {:.3}{} | config {}",
            index + 1,
            solutions.len(),
            solution.score,
            if solution.optimal { "" } else { " (suboptimal)" },
            solution.fingerprint
        );
        println!(
            "{}",
            Console::default().render(&print::tabulate_horizon(solution))
        );
        if args.detail {
            for plan in &solution.plans {
                println!("gameweek {}", plan.gameweek);
                println!(
                    "{}",
                    Console::default().render(&print::tabulate_gameweek(plan))
                );
            }
        }
    }
    if let Some(path) = &args.out {
        feed::write_solutions_json(path, &solutions)?;
        info!("persisted {} solutions to {}", solutions.len(), path.display());
    }
    Ok(())
}
