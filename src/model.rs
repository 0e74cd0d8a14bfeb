//! The squad model: decision variables over (player, gameweek[, slot]), the
//! full rule set as linear constraints, and the decayed objective. Building is
//! pure; the result is handed to a solver backend untouched.

use tracing::{debug, warn};

use crate::config::Config;
use crate::domain::{selling_price, Horizon, Pool, SquadState};
use crate::error::ModelError;
use crate::linear::{LinearModel, Sense};

mod constraints;
mod objective;
pub mod vars;


pub use vars::VarGrid;

/// A built model plus the side tables extraction needs: per-player buy and
/// sell prices in tenths and the initial squad membership, all indexed like
/// the pool.
#[derive(Debug, Clone)]
pub struct PlanProblem {
    pub lp: LinearModel,
    pub vars: VarGrid,
    pub horizon: Horizon,
    pub buy: Vec<f64>,
    pub sell: Vec<f64>,
    pub initial: Vec<bool>,
}

/// Builds the full multi-week model over the (already shortlisted) pool.
pub fn build(
    pool: &Pool,
    squad: &SquadState,
    config: &Config,
) -> Result<PlanProblem, ModelError> {
    let horizon = pool.horizon();
    if horizon.is_empty() {
        return Err(ModelError::EmptyHorizon);
    }
    squad.validate(pool)?;

    // Buying always costs the listed price. Selling an owned player realises
    // the recorded sell value; anyone acquired during the plan moves on at
    // the price they came in at.
    let mut buy = Vec::with_capacity(pool.len());
    let mut sell = Vec::with_capacity(pool.len());
    let mut initial = Vec::with_capacity(pool.len());
    for player in pool.players() {
        let owned = squad.players.iter().find(|owned| owned.id == player.id);
        buy.push(player.price as f64);
        sell.push(match owned {
            Some(owned) => {
                let expected = selling_price(owned.purchase_price, player.price);
                if owned.selling_price != expected {
                    warn!(
                        "sell price {} of player {} does not follow the half-rise rule \
                         (expected {expected})",
                        owned.selling_price, player.id
                    );
                }
                owned.selling_price as f64
            }
            None => player.price as f64,
        });
        initial.push(owned.is_some());
    }

    let mut lp = LinearModel::new(Sense::Maximise);
    let vars = VarGrid::allocate(&mut lp, pool, squad.free_transfers)?;
    constraints::emit(&mut lp, &vars, pool, squad, config, &buy, &sell, &initial);
    objective::apply(&mut lp, &vars, pool, config, squad.free_transfers);

    debug!(
        "built model: {} columns, {} rows over {} players and {} gameweeks",
        lp.num_columns(),
        lp.num_rows(),
        pool.len(),
        horizon.len()
    );
    Ok(PlanProblem {
        lp,
        vars,
        horizon,
        buy,
        sell,
        initial,
    })
}
