//! The produced plan: one [GameweekPlan] per planned round, extracted from a
//! solver's primal vector. Decision variables do not outlive extraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::domain::{Chip, Gameweek, PlayerId, Pool, Position, BENCH_SLOTS, SQUAD_SIZE};
use crate::model::PlanProblem;
use crate::solver::Primal;

/// Nominal rounding tolerance for binary variables. The sanity check below
/// allows extra headroom over the solver's integrality tolerance.
const BINARY_TOLERANCE: f64 = 1e-6;
const BINARY_SLACK: f64 = 100.0 * BINARY_TOLERANCE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub player: PlayerId,
    pub name: String,
    pub position: Position,
    pub price: u32,
    pub lineup: bool,
    pub bench_slot: Option<u8>,
    pub captain: bool,
    pub vice_captain: bool,
    pub transfer_in: bool,
    /// Scoring multiplier: 0 benched, 1 starting, 2 captain, 3 triple captain.
    pub multiplier: u8,
    pub expected_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Departure {
    pub player: PlayerId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameweekPlan {
    pub gameweek: Gameweek,
    pub picks: Vec<Pick>,
    pub transfers_out: Vec<Departure>,
    pub chip: Option<Chip>,
    pub free_transfers: u8,
    pub transfers_made: u32,
    pub hits: u32,
    /// Money in the bank after the week's transfers, in tenths.
    pub bank: f64,
    pub expected_points: f64,
}

impl GameweekPlan {
    pub fn captain(&self) -> Option<&Pick> {
        self.picks.iter().find(|pick| pick.captain)
    }

    pub fn vice_captain(&self) -> Option<&Pick> {
        self.picks.iter().find(|pick| pick.vice_captain)
    }

    pub fn lineup(&self) -> impl Iterator<Item = &Pick> {
        self.picks.iter().filter(|pick| pick.lineup)
    }

    pub fn transfer_ins(&self) -> Vec<PlayerId> {
        self.picks
            .iter()
            .filter(|pick| pick.transfer_in)
            .map(|pick| pick.player)
            .collect()
    }

    pub fn pick(&self, player: PlayerId) -> Option<&Pick> {
        self.picks.iter().find(|pick| pick.player == player)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub score: f64,
    pub fingerprint: String,
    pub optimal: bool,
    /// Relative gap guaranteed by the solve; absent when the time limit cut
    /// the search short of a bound.
    pub optimality_gap: Option<f64>,
    pub solved_at: DateTime<Utc>,
    pub plans: Vec<GameweekPlan>,
}

fn rounded(value: f64) -> bool {
    debug_assert!(
        value < BINARY_SLACK || value > 1.0 - BINARY_SLACK,
        "value {value} is not within tolerance of a binary bound"
    );
    value > 0.5
}

/// Materialises per-gameweek plans from the primal vector. In a free-hit week
/// the picks show the one-week squad actually fielded; the held squad carries
/// through algebraically untouched.
pub fn extract(
    problem: &PlanProblem,
    pool: &Pool,
    config: &Config,
    primal: &Primal,
) -> Solution {
    let vars = &problem.vars;
    let values = &primal.values;
    let mut plans = Vec::with_capacity(vars.weeks());

    for w in 0..vars.weeks() {
        let free_hit = rounded(values[vars.use_fh(w)]);
        let bench_boost = rounded(values[vars.use_bb(w)]);
        let mut chip = None;
        if rounded(values[vars.use_wc(w)]) {
            chip = Some(Chip::Wildcard);
        } else if free_hit {
            chip = Some(Chip::FreeHit);
        } else if bench_boost {
            chip = Some(Chip::BenchBoost);
        } else if (0..pool.len()).any(|p| rounded(values[vars.use_tc(p, w)])) {
            chip = Some(Chip::TripleCaptain);
        }

        let mut picks = vec![];
        let mut expected_points = 0.0;
        for (p, player) in pool.players().iter().enumerate() {
            let held = if free_hit {
                rounded(values[vars.squad_fh(p, w)])
            } else {
                rounded(values[vars.squad(p, w)])
            };
            if !held {
                continue;
            }
            let lineup = rounded(values[vars.lineup(p, w)]);
            let captain = rounded(values[vars.captain(p, w)]);
            let vice_captain = rounded(values[vars.vicecap(p, w)]);
            let triple = rounded(values[vars.use_tc(p, w)]);
            let bench_slot = (0..BENCH_SLOTS)
                .find(|&slot| rounded(values[vars.bench(p, w, slot)]))
                .map(|slot| slot as u8);
            let multiplier = if captain {
                if triple {
                    3
                } else {
                    2
                }
            } else {
                lineup as u8
            };

            let points = player.forecast(w).points;
            expected_points += points * multiplier as f64;
            if vice_captain {
                expected_points += config.vcap_weight * points;
            }
            if let Some(slot) = bench_slot {
                expected_points += config.bench_weight(slot) * points;
            }

            picks.push(Pick {
                player: player.id,
                name: player.name.clone(),
                position: player.position,
                price: player.price,
                lineup,
                bench_slot,
                captain,
                vice_captain,
                transfer_in: rounded(values[vars.transfer_in(p, w)]),
                multiplier,
                expected_points: points,
            });
        }
        picks.sort_by(|a, b| {
            let order = |pick: &Pick| {
                (
                    pick.bench_slot.map(|slot| slot + 1).unwrap_or(0),
                    pick.position.index(),
                    pick.player.0,
                )
            };
            order(a).cmp(&order(b))
        });
        debug_assert_eq!(SQUAD_SIZE, picks.len(), "extracted squad is not full");

        let transfers_out: Vec<Departure> = pool
            .players()
            .iter()
            .enumerate()
            .filter(|&(p, _)| rounded(values[vars.transfer_out(p, w)]))
            .map(|(_, player)| Departure {
                player: player.id,
                name: player.name.clone(),
            })
            .collect();

        plans.push(GameweekPlan {
            gameweek: problem.horizon.gameweek(w),
            picks,
            transfers_made: transfers_out.len() as u32,
            transfers_out,
            chip,
            free_transfers: values[vars.fts(w)].round() as u8,
            hits: values[vars.penalised(w)].round() as u32,
            bank: values[vars.itb(w)],
            expected_points,
        });
    }

    Solution {
        score: primal.objective,
        fingerprint: config.fingerprint(),
        optimal: primal.optimal(),
        optimality_gap: primal.optimal().then_some(config.optimality_gap),
        solved_at: Utc::now(),
        plans,
    }
}
