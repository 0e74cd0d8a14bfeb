//! Objective assembly: decayed expected points for the chosen roles, minus
//! hit penalties, plus the valuations of banked transfers and bank balance.

use crate::config::Config;
use crate::domain::{Pool, BENCH_SLOTS, MAX_FREE_TRANSFERS};
use crate::linear::LinearModel;
use crate::model::vars::VarGrid;

pub(super) fn apply(
    lp: &mut LinearModel,
    vars: &VarGrid,
    pool: &Pool,
    config: &Config,
    initial_free_transfers: u8,
) {
    let weeks = pool.horizon().len();
    for w in 0..weeks {
        let decay = config.decay_base.powi(w as i32);

        for (p, player) in pool.players().iter().enumerate() {
            let points = player.forecast(w).points;
            if points != 0.0 {
                lp.add_objective(vars.lineup(p, w), decay * points);
                lp.add_objective(vars.captain(p, w), decay * points);
                lp.add_objective(vars.vicecap(p, w), decay * config.vcap_weight * points);
                lp.add_objective(vars.use_tc(p, w), decay * points);
                for slot in 0..BENCH_SLOTS {
                    let weight = config.bench_weight(slot as u8);
                    if weight != 0.0 {
                        lp.add_objective(vars.bench(p, w, slot), decay * weight * points);
                    }
                }
            }
        }

        lp.add_objective(vars.penalised(w), -decay * config.hit_cost);
        lp.add_objective(vars.itb(w), decay * config.itb_value);

        // The free-transfer valuation telescopes across the horizon: week w
        // contributes value(fts[w]) - value(fts[w-1]), decayed. Collected per
        // state indicator, the interior weeks carry decay^w * (1 - decay),
        // the final week decay^w, and the entry state a constant offset.
        if w > 0 {
            let weight = if w + 1 < weeks {
                decay * (1.0 - config.decay_base)
            } else {
                decay
            };
            for s in 1..=MAX_FREE_TRANSFERS {
                let value = config.ft_value(s);
                if value != 0.0 {
                    lp.add_objective(vars.ft_state(w, s), weight * value);
                }
            }
        }
    }
    if weeks > 1 {
        lp.objective_offset -= config.decay_base * config.ft_value(initial_free_transfers);
    }
}
