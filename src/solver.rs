//! Narrow solver coupling: a backend accepts a [LinearModel](crate::linear::LinearModel)
//! and returns a primal vector and status. Backends are swappable behind
//! [MilpSolver]; HiGHS is the one that ships.

use tracing::{debug, info};

use crate::config::{Config, SolverKind};
use crate::error::SolverError;
use crate::linear::{LinearModel, Relation, Sense};

#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    pub time_limit_secs: f64,
    pub mip_gap: f64,
    pub random_seed: Option<u64>,
    pub verbose: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit_secs: 600.0,
            mip_gap: 0.0,
            random_seed: None,
            verbose: false,
        }
    }
}

impl From<&Config> for SolveOptions {
    fn from(config: &Config) -> Self {
        Self {
            time_limit_secs: config.time_limit_secs,
            mip_gap: config.optimality_gap,
            random_seed: config.random_seed,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    /// The time limit elapsed with an incumbent in hand.
    TimedOut,
}

/// A primal point returned by a backend. The objective is recomputed from the
/// model so every backend reports on the same basis, offset included.
#[derive(Debug, Clone, PartialEq)]
pub struct Primal {
    pub values: Vec<f64>,
    pub objective: f64,
    pub status: SolveStatus,
}

impl Primal {
    pub fn optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}

pub trait MilpSolver {
    fn name(&self) -> &'static str;

    fn solve(&self, model: &LinearModel, options: &SolveOptions)
        -> Result<Primal, SolverError>;
}

pub fn solver_for(kind: SolverKind) -> Box<dyn MilpSolver> {
    match kind {
        SolverKind::Highs => Box::new(HighsSolver),
    }
}

pub struct HighsSolver;

impl MilpSolver for HighsSolver {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(
        &self,
        model: &LinearModel,
        options: &SolveOptions,
    ) -> Result<Primal, SolverError> {
        let mut problem = highs::RowProblem::default();
        let mut columns = Vec::with_capacity(model.num_columns());
        for column in model.columns() {
            let col = match (column.integer, column.upper.is_finite()) {
                (true, true) => {
                    problem.add_integer_column(column.objective, column.lower..=column.upper)
                }
                (true, false) => problem.add_integer_column(column.objective, column.lower..),
                (false, true) => {
                    problem.add_column(column.objective, column.lower..=column.upper)
                }
                (false, false) => problem.add_column(column.objective, column.lower..),
            };
            columns.push(col);
        }
        for row in model.rows() {
            let factors: Vec<(highs::Col, f64)> = row
                .terms
                .iter()
                .map(|&(column, coefficient)| (columns[column], coefficient))
                .collect();
            match row.relation {
                Relation::Le => problem.add_row(..=row.rhs, &factors),
                Relation::Ge => problem.add_row(row.rhs.., &factors),
                Relation::Eq => problem.add_row(row.rhs..=row.rhs, &factors),
            }
        }

        let sense = match model.sense {
            Sense::Maximise => highs::Sense::Maximise,
            Sense::Minimise => highs::Sense::Minimise,
        };
        debug!(
            "handing {} columns and {} rows to HiGHS",
            model.num_columns(),
            model.num_rows()
        );
        let mut solver_model = problem.optimise(sense);
        solver_model.set_option("output_flag", options.verbose);
        solver_model.set_option("time_limit", options.time_limit_secs);
        solver_model.set_option("mip_rel_gap", options.mip_gap);
        if let Some(seed) = options.random_seed {
            solver_model.set_option("random_seed", seed as i32);
        }

        let solved = solver_model.solve();
        match solved.status() {
            highs::HighsModelStatus::Optimal => {
                let values = solved.get_solution().columns().to_vec();
                let objective = model.objective_value(&values);
                Ok(Primal {
                    values,
                    objective,
                    status: SolveStatus::Optimal,
                })
            }
            highs::HighsModelStatus::Infeasible => Err(SolverError::Infeasible),
            highs::HighsModelStatus::ReachedTimeLimit => {
                let values = solved.get_solution().columns().to_vec();
                if values.len() != model.num_columns() || values.iter().any(|v| !v.is_finite()) {
                    return Err(SolverError::NoSolution);
                }
                let objective = model.objective_value(&values);
                info!("time limit reached; returning the incumbent at {objective:.3}");
                Ok(Primal {
                    values,
                    objective,
                    status: SolveStatus::TimedOut,
                })
            }
            other => Err(SolverError::Backend(format!("{other:?}"))),
        }
    }
}
