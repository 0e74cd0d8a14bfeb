//! Sensitivity mode: re-plans over independently perturbed projections and
//! tallies how often the first-week decisions recur. Runs are embarrassingly
//! parallel; each owns its model and shares only the base pool and config.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tinyrand::{Rand, Seeded, StdRand};
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::{PlayerId, Pool, SquadState};
use crate::error::{PlanFailure, SolverError};
use crate::optimiser;

#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityOptions {
    pub runs: u32,
    /// Standard deviation of the multiplicative noise applied to expected
    /// points, e.g. 0.1 for ten percent.
    pub noise: f64,
    pub seed: u64,
}

impl Default for SensitivityOptions {
    fn default() -> Self {
        Self {
            runs: 20,
            noise: 0.1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensitivityReport {
    pub runs: u32,
    pub infeasible: u32,
    pub failed: u32,
    /// First-week transfer arrivals by frequency, most common first.
    pub transfer_ins: Vec<(PlayerId, u32)>,
    /// First-week captains by frequency, most common first.
    pub captains: Vec<(PlayerId, u32)>,
}

pub fn run(
    pool: &Pool,
    squad: &SquadState,
    config: &Config,
    options: &SensitivityOptions,
) -> SensitivityReport {
    let single = Config {
        num_iterations: 1,
        ..config.clone()
    };
    let outcomes: Vec<_> = (0..options.runs)
        .into_par_iter()
        .map(|run| {
            let perturbed = perturb(pool, options.seed.wrapping_add(run as u64), options.noise);
            optimiser::plan(&perturbed, squad, &single)
        })
        .collect();

    let mut report = SensitivityReport {
        runs: options.runs,
        ..SensitivityReport::default()
    };
    let mut ins: FxHashMap<PlayerId, u32> = FxHashMap::default();
    let mut captains: FxHashMap<PlayerId, u32> = FxHashMap::default();
    for outcome in outcomes {
        match outcome {
            Ok(solutions) => {
                let first = &solutions[0].plans[0];
                for id in first.transfer_ins() {
                    *ins.entry(id).or_default() += 1;
                }
                if let Some(captain) = first.captain() {
                    *captains.entry(captain.player).or_default() += 1;
                }
            }
            Err(err) if matches!(err.kind, PlanFailure::Solver(SolverError::Infeasible)) => {
                report.infeasible += 1;
            }
            Err(err) => {
                warn!("sensitivity run failed: {err}");
                report.failed += 1;
            }
        }
    }

    let ranked = |counts: FxHashMap<PlayerId, u32>| {
        let mut ranked: Vec<_> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    };
    report.transfer_ins = ranked(ins);
    report.captains = ranked(captains);
    info!(
        "sensitivity: {} runs, {} infeasible, {} failed",
        report.runs, report.infeasible, report.failed
    );
    report
}

/// Scales every projected score by an independent draw of
/// `max(0, 1 + noise * z)` with `z` standard normal.
fn perturb(pool: &Pool, seed: u64, noise: f64) -> Pool {
    let mut rand = StdRand::seed(seed);
    let players = pool
        .players()
        .iter()
        .map(|player| {
            let mut player = player.clone();
            for forecast in &mut player.forecasts {
                let factor = (1.0 + noise * standard_normal(&mut rand)).max(0.0);
                forecast.points *= factor;
            }
            player
        })
        .collect();
    Pool::new(pool.horizon(), players).expect("perturbation preserves player identities")
}

fn standard_normal(rand: &mut StdRand) -> f64 {
    // Box-Muller on two uniform draws in (0, 1].
    let u1 = ((rand.next_u64() >> 11) + 1) as f64 / (1u64 << 53) as f64;
    let u2 = ((rand.next_u64() >> 11) + 1) as f64 / (1u64 << 53) as f64;
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use crate::domain::Horizon;
    use crate::testing;

    use super::*;

    #[test]
    fn perturbation_is_deterministic_per_seed() {
        let pool = testing::synthetic_pool(Horizon::new(1, 2));
        let a = perturb(&pool, 7, 0.2);
        let b = perturb(&pool, 7, 0.2);
        let c = perturb(&pool, 8, 0.2);
        assert_eq!(a.players(), b.players());
        assert_ne!(a.players(), c.players());
    }

    #[test]
    fn perturbation_never_flips_sign() {
        let pool = testing::synthetic_pool(Horizon::new(1, 2));
        let perturbed = perturb(&pool, 11, 3.0);
        for player in perturbed.players() {
            for forecast in &player.forecasts {
                assert!(forecast.points >= 0.0);
            }
        }
    }

    #[test]
    fn aggregates_recurring_decisions() {
        let pool = testing::pool_with(Horizon::new(1, 1), |id, _| match id {
            17 => 10.0,
            id if testing::INITIAL_IDS.contains(&id) => 1.0,
            _ => 0.0,
        });
        let squad = testing::initial_squad();
        let config = testing::base_config();
        let report = run(
            &pool,
            &squad,
            &config,
            &SensitivityOptions {
                runs: 4,
                noise: 0.05,
                seed: 1,
            },
        );
        assert_eq!(4, report.runs);
        assert_eq!(0, report.infeasible);
        assert_eq!(0, report.failed);
        // Player 17 towers over the field in every perturbation.
        assert_eq!(PlayerId(17), report.captains[0].0);
        assert_eq!(4, report.captains[0].1);
    }
}
