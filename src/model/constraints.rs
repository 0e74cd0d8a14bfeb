//! The constraint families. Everything the rules of the game say about
//! squads, transfers and chips is emitted here as rows or bound fixes on the
//! canonical model.

use rustc_hash::FxHashSet;
use strum::IntoEnumIterator;
use tracing::warn;

use crate::config::Config;
use crate::domain::{
    Chip, PlayerId, Pool, Position, SquadState, BENCH_SLOTS, LINEUP_SIZE, MAX_FREE_TRANSFERS,
    MAX_PER_TEAM, SQUAD_SIZE,
};
use crate::linear::{LinearModel, Relation};
use crate::model::vars::VarGrid;

/// Relaxation constant for the hit count under a wildcard; a week can never
/// need more than a full squad of transfers.
const WILDCARD_M: f64 = SQUAD_SIZE as f64;
/// Relaxation constant for the free-transfer transition rows. The transition
/// expression is bounded by the squad size plus the state band.
const TRANSITION_M: f64 = 20.0;
/// Widest possible move of the free-transfer state in one week.
const STATE_BAND: f64 = (MAX_FREE_TRANSFERS - 1) as f64;

pub(super) fn emit(
    lp: &mut LinearModel,
    vars: &VarGrid,
    pool: &Pool,
    squad: &SquadState,
    config: &Config,
    buy: &[f64],
    sell: &[f64],
    initial: &[bool],
) {
    let players = pool.len();
    let weeks = pool.horizon().len();
    let horizon = pool.horizon();

    let by_position: Vec<Vec<usize>> = Position::iter()
        .map(|position| {
            (0..players)
                .filter(|&p| pool.players()[p].position == position)
                .collect()
        })
        .collect();
    let teams: Vec<Vec<usize>> = {
        let mut grouped: Vec<Vec<usize>> = vec![vec![]; 256];
        for p in 0..players {
            grouped[pool.players()[p].team as usize].push(p);
        }
        grouped
    };

    for w in 0..weeks {
        let gw = horizon.gameweek(w);

        // Squad composition.
        lp.push_row(
            format!("squad_size_w{gw}"),
            Relation::Eq,
            SQUAD_SIZE as f64,
            (0..players).map(|p| (vars.squad(p, w), 1.0)).collect(),
        );
        for position in Position::iter() {
            lp.push_row(
                format!("quota_{position}_w{gw}"),
                Relation::Eq,
                position.squad_quota() as f64,
                by_position[position.index()]
                    .iter()
                    .map(|&p| (vars.squad(p, w), 1.0))
                    .collect(),
            );
        }

        // The free-hit squad only exists in a free-hit week.
        let mut fh_size: Vec<(usize, f64)> =
            (0..players).map(|p| (vars.squad_fh(p, w), 1.0)).collect();
        fh_size.push((vars.use_fh(w), -(SQUAD_SIZE as f64)));
        lp.push_row(format!("fh_size_w{gw}"), Relation::Eq, 0.0, fh_size);
        for position in Position::iter() {
            let mut terms: Vec<(usize, f64)> = by_position[position.index()]
                .iter()
                .map(|&p| (vars.squad_fh(p, w), 1.0))
                .collect();
            terms.push((vars.use_fh(w), -(position.squad_quota() as f64)));
            lp.push_row(format!("fh_quota_{position}_w{gw}"), Relation::Eq, 0.0, terms);
        }

        for (team, members) in teams.iter().enumerate().filter(|(_, m)| !m.is_empty()) {
            lp.push_row(
                format!("team_cap_{team}_w{gw}"),
                Relation::Le,
                MAX_PER_TEAM as f64,
                members.iter().map(|&p| (vars.squad(p, w), 1.0)).collect(),
            );
            let mut terms: Vec<(usize, f64)> = members
                .iter()
                .map(|&p| (vars.squad_fh(p, w), 1.0))
                .collect();
            terms.push((vars.use_fh(w), -(MAX_PER_TEAM as f64)));
            lp.push_row(format!("fh_team_cap_{team}_w{gw}"), Relation::Le, 0.0, terms);
        }

        // Lineup size, relaxed to the full squad under a bench boost.
        let mut lineup_size: Vec<(usize, f64)> =
            (0..players).map(|p| (vars.lineup(p, w), 1.0)).collect();
        lineup_size.push((vars.use_bb(w), -((SQUAD_SIZE - LINEUP_SIZE) as f64)));
        lp.push_row(
            format!("xi_size_w{gw}"),
            Relation::Eq,
            LINEUP_SIZE as f64,
            lineup_size,
        );

        for position in Position::iter() {
            let starters: Vec<(usize, f64)> = by_position[position.index()]
                .iter()
                .map(|&p| (vars.lineup(p, w), 1.0))
                .collect();
            lp.push_row(
                format!("formation_min_{position}_w{gw}"),
                Relation::Ge,
                position.min_play() as f64,
                starters.clone(),
            );
            let headroom = (position.squad_quota() - position.max_play()) as f64;
            let mut bounded = starters;
            bounded.push((vars.use_bb(w), -headroom));
            lp.push_row(
                format!("formation_max_{position}_w{gw}"),
                Relation::Le,
                position.max_play() as f64,
                bounded,
            );
        }

        // Armbands: one captain, one vice, both starting, never the same player.
        lp.push_row(
            format!("captain_w{gw}"),
            Relation::Eq,
            1.0,
            (0..players).map(|p| (vars.captain(p, w), 1.0)).collect(),
        );
        lp.push_row(
            format!("vice_w{gw}"),
            Relation::Eq,
            1.0,
            (0..players).map(|p| (vars.vicecap(p, w), 1.0)).collect(),
        );
        for p in 0..players {
            lp.push_row(
                format!("armband_{}_w{gw}", pool.players()[p].id),
                Relation::Le,
                0.0,
                vec![
                    (vars.captain(p, w), 1.0),
                    (vars.vicecap(p, w), 1.0),
                    (vars.lineup(p, w), -1.0),
                ],
            );
            lp.push_row(
                format!("tc_cap_{}_w{gw}", pool.players()[p].id),
                Relation::Le,
                0.0,
                vec![(vars.use_tc(p, w), 1.0), (vars.captain(p, w), -1.0)],
            );
        }

        // Bench slots collapse when the bench is boosted; slot 0 is the keeper.
        let mut gk_slot: Vec<(usize, f64)> = by_position[Position::Goalkeeper.index()]
            .iter()
            .map(|&p| (vars.bench(p, w, 0), 1.0))
            .collect();
        gk_slot.push((vars.use_bb(w), 1.0));
        lp.push_row(format!("bench_gk_w{gw}"), Relation::Eq, 1.0, gk_slot);
        for slot in 0..BENCH_SLOTS {
            let mut terms: Vec<(usize, f64)> = (0..players)
                .map(|p| (vars.bench(p, w, slot), 1.0))
                .collect();
            terms.push((vars.use_bb(w), 1.0));
            lp.push_row(format!("bench_slot{slot}_w{gw}"), Relation::Eq, 1.0, terms);
        }

        // A player fills one role, drawn from the active squad. In a free-hit
        // week the active squad is the free-hit squad.
        for p in 0..players {
            let id = pool.players()[p].id;
            let roles = |grid: &VarGrid| {
                let mut terms = vec![(grid.lineup(p, w), 1.0)];
                terms.extend((0..BENCH_SLOTS).map(|slot| (grid.bench(p, w, slot), 1.0)));
                terms
            };
            let mut from_squad = roles(vars);
            from_squad.push((vars.squad(p, w), -1.0));
            from_squad.push((vars.use_fh(w), -1.0));
            lp.push_row(format!("role_{id}_w{gw}"), Relation::Le, 0.0, from_squad);

            let mut from_fh = roles(vars);
            from_fh.push((vars.squad_fh(p, w), -1.0));
            from_fh.push((vars.use_fh(w), 1.0));
            lp.push_row(format!("role_fh_{id}_w{gw}"), Relation::Le, 1.0, from_fh);
        }

        // One chip a week, at most.
        let mut chips: Vec<(usize, f64)> = vec![
            (vars.use_wc(w), 1.0),
            (vars.use_fh(w), 1.0),
            (vars.use_bb(w), 1.0),
        ];
        chips.extend((0..players).map(|p| (vars.use_tc(p, w), 1.0)));
        lp.push_row(format!("one_chip_w{gw}"), Relation::Le, 1.0, chips);

        // Squad evolution and transfer legality.
        for p in 0..players {
            let id = pool.players()[p].id;
            let mut evolve = vec![
                (vars.squad(p, w), 1.0),
                (vars.transfer_in(p, w), -1.0),
                (vars.transfer_out(p, w), 1.0),
            ];
            let rhs = if w == 0 {
                initial[p] as u8 as f64
            } else {
                evolve.push((vars.squad(p, w - 1), -1.0));
                0.0
            };
            lp.push_row(format!("evolve_{id}_w{gw}"), Relation::Eq, rhs, evolve);

            lp.push_row(
                format!("in_out_{id}_w{gw}"),
                Relation::Le,
                1.0,
                vec![(vars.transfer_in(p, w), 1.0), (vars.transfer_out(p, w), 1.0)],
            );
            lp.push_row(
                format!("fh_freeze_in_{id}_w{gw}"),
                Relation::Le,
                1.0,
                vec![(vars.transfer_in(p, w), 1.0), (vars.use_fh(w), 1.0)],
            );
            lp.push_row(
                format!("fh_freeze_out_{id}_w{gw}"),
                Relation::Le,
                1.0,
                vec![(vars.transfer_out(p, w), 1.0), (vars.use_fh(w), 1.0)],
            );
        }

        // Money in the bank rolls forward with the transfer ledger.
        let mut bank_terms = vec![(vars.itb(w), 1.0)];
        for p in 0..players {
            bank_terms.push((vars.transfer_out(p, w), -sell[p]));
            bank_terms.push((vars.transfer_in(p, w), buy[p]));
        }
        let bank_rhs = if w == 0 {
            squad.bank as f64
        } else {
            bank_terms.push((vars.itb(w - 1), -1.0));
            0.0
        };
        lp.push_row(format!("bank_w{gw}"), Relation::Eq, bank_rhs, bank_terms);

        // A free-hit squad is funded by selling the held squad plus the bank.
        let mut fh_budget: Vec<(usize, f64)> = (0..players)
            .map(|p| (vars.squad_fh(p, w), buy[p]))
            .collect();
        let fh_rhs = if w == 0 {
            squad.bank as f64
                + (0..players)
                    .filter(|&p| initial[p])
                    .map(|p| sell[p])
                    .sum::<f64>()
        } else {
            for p in 0..players {
                fh_budget.push((vars.squad(p, w - 1), -sell[p]));
            }
            fh_budget.push((vars.itb(w - 1), -1.0));
            0.0
        };
        lp.push_row(format!("fh_budget_w{gw}"), Relation::Le, fh_rhs, fh_budget);

        // Hits: transfers beyond the banked free ones, unless wildcarding.
        let mut hits = vec![
            (vars.penalised(w), 1.0),
            (vars.fts(w), 1.0),
            (vars.use_wc(w), WILDCARD_M),
        ];
        hits.extend((0..players).map(|p| (vars.transfer_out(p, w), -1.0)));
        lp.push_row(format!("hits_w{gw}"), Relation::Ge, 0.0, hits);
        if config.weekly_hit_limit > 0 {
            lp.set_upper(vars.penalised(w), config.weekly_hit_limit as f64);
        }

        // The state indicators pick out exactly one free-transfer count.
        lp.push_row(
            format!("ft_state_one_w{gw}"),
            Relation::Eq,
            1.0,
            (1..=MAX_FREE_TRANSFERS)
                .map(|s| (vars.ft_state(w, s), 1.0))
                .collect(),
        );
        let mut link = vec![(vars.fts(w), 1.0)];
        link.extend((1..=MAX_FREE_TRANSFERS).map(|s| (vars.ft_state(w, s), -(s as f64))));
        lp.push_row(format!("ft_state_link_w{gw}"), Relation::Eq, 0.0, link);
    }

    emit_ft_transitions(lp, vars, pool);
    emit_hit_budget(lp, vars, config, weeks);
    emit_selection_edicts(lp, vars, pool, squad, config);
    emit_chip_schedule(lp, vars, pool, squad, config);
}

/// The free-transfer state machine: a chip week carries the state across;
/// any other week banks one transfer net of those spent, clamped to the legal
/// band. The clamp is resolved by the floor and cap binaries.
fn emit_ft_transitions(lp: &mut LinearModel, vars: &VarGrid, pool: &Pool) {
    let players = pool.len();
    let horizon = pool.horizon();
    for w in 0..horizon.len().saturating_sub(1) {
        let gw = horizon.gameweek(w);
        let next = vars.fts(w + 1);
        let carry = [(vars.use_wc(w), STATE_BAND), (vars.use_fh(w), STATE_BAND)];

        let mut hi = vec![(next, 1.0), (vars.fts(w), -1.0)];
        hi.extend(carry);
        lp.push_row(format!("ft_carry_hi_w{gw}"), Relation::Le, STATE_BAND, hi);
        let mut lo = vec![(next, -1.0), (vars.fts(w), 1.0)];
        lo.extend(carry);
        lp.push_row(format!("ft_carry_lo_w{gw}"), Relation::Le, STATE_BAND, lo);

        let spend: Vec<(usize, f64)> = (0..players)
            .map(|p| (vars.transfer_out(p, w), 1.0))
            .collect();

        let mut step_hi = vec![
            (next, 1.0),
            (vars.fts(w), -1.0),
            (vars.ft_floor(w), -TRANSITION_M),
            (vars.use_wc(w), -TRANSITION_M),
            (vars.use_fh(w), -TRANSITION_M),
        ];
        step_hi.extend(spend.clone());
        lp.push_row(format!("ft_step_hi_w{gw}"), Relation::Le, 1.0, step_hi);

        let mut step_lo = vec![
            (next, 1.0),
            (vars.fts(w), -1.0),
            (vars.ft_cap(w), TRANSITION_M),
            (vars.use_wc(w), TRANSITION_M),
            (vars.use_fh(w), TRANSITION_M),
        ];
        step_lo.extend(spend);
        lp.push_row(format!("ft_step_lo_w{gw}"), Relation::Ge, 1.0, step_lo);

        lp.push_row(
            format!("ft_floor_w{gw}"),
            Relation::Le,
            1.0 + TRANSITION_M,
            vec![
                (next, 1.0),
                (vars.ft_floor(w), TRANSITION_M),
                (vars.use_wc(w), -TRANSITION_M),
                (vars.use_fh(w), -TRANSITION_M),
            ],
        );
        lp.push_row(
            format!("ft_cap_w{gw}"),
            Relation::Ge,
            MAX_FREE_TRANSFERS as f64 - TRANSITION_M,
            vec![
                (next, 1.0),
                (vars.ft_cap(w), -TRANSITION_M),
                (vars.use_wc(w), TRANSITION_M),
                (vars.use_fh(w), TRANSITION_M),
            ],
        );
    }
}

fn emit_hit_budget(lp: &mut LinearModel, vars: &VarGrid, config: &Config, weeks: usize) {
    if let Some(limit) = config.hit_limit {
        lp.push_row(
            "hit_total".into(),
            Relation::Le,
            limit as f64,
            (0..weeks).map(|w| (vars.penalised(w), 1.0)).collect(),
        );
    }
}

/// Locks, bans, the frozen tail and booked transfers, all expressed as bound
/// fixes on individual columns.
fn emit_selection_edicts(
    lp: &mut LinearModel,
    vars: &VarGrid,
    pool: &Pool,
    squad: &SquadState,
    config: &Config,
) {
    let weeks = pool.horizon().len();
    let owned: FxHashSet<PlayerId> = squad.players.iter().map(|owned| owned.id).collect();
    let locked: FxHashSet<PlayerId> = config.locked.iter().copied().collect();

    for &id in &config.locked {
        if let Some(p) = pool.index_of(id) {
            for w in 0..weeks {
                lp.set_lower(vars.squad(p, w), 1.0);
            }
        }
    }
    for &id in &config.banned {
        if owned.contains(&id) || locked.contains(&id) {
            continue;
        }
        if let Some(p) = pool.index_of(id) {
            for w in 0..weeks {
                lp.set_upper(vars.squad(p, w), 0.0);
                lp.set_upper(vars.squad_fh(p, w), 0.0);
            }
        }
    }

    let frozen = (config.no_transfer_last_gws as usize).min(weeks);
    for w in weeks - frozen..weeks {
        for p in 0..pool.len() {
            lp.set_upper(vars.transfer_in(p, w), 0.0);
            lp.set_upper(vars.transfer_out(p, w), 0.0);
        }
    }

    for booking in &config.booked_transfers {
        let Some(w) = pool.horizon().offset(booking.gameweek) else {
            warn!(
                "booked transfer for gameweek {} is outside the horizon; ignored",
                booking.gameweek
            );
            continue;
        };
        if let Some(id) = booking.transfer_in {
            match pool.index_of(id) {
                Some(p) => lp.fix(vars.transfer_in(p, w), 1.0),
                None => warn!("booked arrival {id} is not in the shortlisted pool; ignored"),
            }
        }
        if let Some(id) = booking.transfer_out {
            match pool.index_of(id) {
                Some(p) => lp.fix(vars.transfer_out(p, w), 1.0),
                None => warn!("booked departure {id} is not in the shortlisted pool; ignored"),
            }
        }
    }
}

/// Chip availability, per-chip horizon caps and forced activations.
fn emit_chip_schedule(
    lp: &mut LinearModel,
    vars: &VarGrid,
    pool: &Pool,
    squad: &SquadState,
    config: &Config,
) {
    let players = pool.len();
    let weeks = pool.horizon().len();
    let horizon = pool.horizon();

    for chip in [Chip::Wildcard, Chip::FreeHit, Chip::BenchBoost] {
        let column = |w: usize| match chip {
            Chip::Wildcard => vars.use_wc(w),
            Chip::FreeHit => vars.use_fh(w),
            _ => vars.use_bb(w),
        };
        if !squad.chips.has(chip) {
            for w in 0..weeks {
                lp.set_upper(column(w), 0.0);
            }
            continue;
        }
        lp.push_row(
            format!("chip_cap_{chip}"),
            Relation::Le,
            config.chip_limits.limit(chip) as f64,
            (0..weeks).map(|w| (column(w), 1.0)).collect(),
        );
    }
    if !squad.chips.has(Chip::TripleCaptain) {
        for p in 0..players {
            for w in 0..weeks {
                lp.set_upper(vars.use_tc(p, w), 0.0);
            }
        }
    } else {
        let mut terms = vec![];
        for p in 0..players {
            for w in 0..weeks {
                terms.push((vars.use_tc(p, w), 1.0));
            }
        }
        lp.push_row(
            format!("chip_cap_{}", Chip::TripleCaptain),
            Relation::Le,
            config.chip_limits.limit(Chip::TripleCaptain) as f64,
            terms,
        );
    }

    for (chip, gameweek) in config.forced_chips() {
        let Some(w) = horizon.offset(gameweek) else {
            continue;
        };
        match chip {
            Chip::Wildcard => lp.fix(vars.use_wc(w), 1.0),
            Chip::FreeHit => lp.fix(vars.use_fh(w), 1.0),
            Chip::BenchBoost => lp.fix(vars.use_bb(w), 1.0),
            Chip::TripleCaptain => lp.push_row(
                format!("force_tc_w{gameweek}"),
                Relation::Eq,
                1.0,
                (0..players).map(|p| (vars.use_tc(p, w), 1.0)).collect(),
            ),
        }
    }
}
