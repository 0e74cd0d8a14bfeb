//! The end-to-end pipeline: validate, shortlist, build, solve, extract, and
//! loop with iteration cuts when alternative plans are requested.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::{PlayerId, Pool, SquadState};
use crate::error::{DataError, PlanError, PlanFailure, SolverError};
use crate::filter;
use crate::linear::Relation;
use crate::model::{self, PlanProblem};
use crate::plan::{self, Solution};
use crate::solver::{self, Primal, SolveOptions};

#[cfg(test)]
mod tests;

/// Alternatives are abandoned once they fall this far, relative to the best
/// objective, below it.
pub const ALTERNATIVE_DEGRADATION_TOLERANCE: f64 = 0.05;

/// Produces up to `num_iterations` plans, best first. Each subsequent solve
/// carries a cut forbidding the previous first-week transfer-in profile; the
/// loop ends early on infeasibility or once alternatives degrade too far.
pub fn plan(
    pool: &Pool,
    squad: &SquadState,
    config: &Config,
) -> Result<Vec<Solution>, PlanError> {
    let fingerprint = config.fingerprint();
    let fail = |kind: PlanFailure| PlanError {
        fingerprint: fingerprint.clone(),
        kind,
    };

    config.validate().map_err(|err| fail(err.into()))?;
    config
        .validate_for(pool.horizon(), &squad.chips)
        .map_err(|err| fail(err.into()))?;
    check_references(pool, config).map_err(|err| fail(err.into()))?;
    squad.validate(pool).map_err(|err| fail(err.into()))?;

    let shortlist = filter::shortlist(pool, squad, config);
    let mut problem = model::build(&shortlist, squad, config).map_err(|err| fail(err.into()))?;
    let backend = solver::solver_for(config.solver);
    let options = SolveOptions::from(config);
    info!(
        "planning {} gameweeks over {} candidates with {} [config {fingerprint}]",
        shortlist.horizon().len(),
        shortlist.len(),
        backend.name()
    );

    let mut solutions: Vec<Solution> = vec![];
    for iteration in 0..config.num_iterations {
        let primal = match backend.solve(&problem.lp, &options) {
            Ok(primal) => primal,
            Err(SolverError::Infeasible) if !solutions.is_empty() => {
                debug!("iteration {iteration} is infeasible; no further alternatives exist");
                break;
            }
            Err(err) => return Err(fail(err.into())),
        };
        let solution = plan::extract(&problem, &shortlist, config, &primal);
        if let Some(first) = solutions.first() {
            let degradation = first.score - solution.score;
            if degradation > ALTERNATIVE_DEGRADATION_TOLERANCE * first.score.abs() {
                debug!(
                    "iteration {iteration} degrades the objective by {degradation:.3}; stopping"
                );
                break;
            }
        }
        info!(
            "iteration {iteration}: score {:.3}{}",
            solution.score,
            if solution.optimal { "" } else { " (suboptimal)" }
        );
        if iteration + 1 < config.num_iterations {
            forbid_first_week_profile(&mut problem, &primal, iteration);
        }
        solutions.push(solution);
    }
    Ok(solutions)
}

/// Adds the iteration cut: at least one first-week transfer-in must differ
/// from the profile just returned.
fn forbid_first_week_profile(problem: &mut PlanProblem, primal: &Primal, iteration: u32) {
    let vars = &problem.vars;
    let mut terms = Vec::with_capacity(vars.players());
    let mut chosen = 0usize;
    for p in 0..vars.players() {
        let column = vars.transfer_in(p, 0);
        if primal.values[column] > 0.5 {
            terms.push((column, -1.0));
            chosen += 1;
        } else {
            terms.push((column, 1.0));
        }
    }
    problem.lp.push_row(
        format!("cut_{iteration}"),
        Relation::Ge,
        1.0 - chosen as f64,
        terms,
    );
}

/// Ids named by the config must resolve against the full pool before the
/// filter has had a chance to hide the mistake.
fn check_references(pool: &Pool, config: &Config) -> Result<(), DataError> {
    let check = |ids: &[PlayerId], context: &'static str| -> Result<(), DataError> {
        match ids.iter().find(|&&id| pool.index_of(id).is_none()) {
            Some(&id) => Err(DataError::UnknownPlayer { id, context }),
            None => Ok(()),
        }
    };
    check(&config.locked, "locked")?;
    check(&config.banned, "banned")?;
    for booking in &config.booked_transfers {
        for id in booking.transfer_in.into_iter().chain(booking.transfer_out) {
            if pool.index_of(id).is_none() {
                return Err(DataError::UnknownPlayer {
                    id,
                    context: "booked transfer",
                });
            }
        }
    }
    for &id in &config.keep {
        if pool.index_of(id).is_none() {
            warn!("keep-listed player {id} is not in the pool; ignored");
        }
    }
    Ok(())
}
