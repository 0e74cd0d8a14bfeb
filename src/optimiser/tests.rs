use std::collections::BTreeMap;

use assert_float_eq::*;

use crate::config::{BookedTransfer, Config};
use crate::domain::{Chip, Horizon, PlayerId};
use crate::error::{ConfigError, PlanFailure, SolverError};
use crate::testing::{self, INITIAL_IDS};

use super::plan;

fn owned(id: u32) -> bool {
    INITIAL_IDS.contains(&id)
}

#[test]
fn lone_week_selects_the_standout_captain() {
    let pool = testing::pool_with(Horizon::new(1, 1), |id, _| if id == 17 { 10.0 } else { 1.0 });
    let squad = testing::initial_squad();
    let config = testing::base_config();

    let solutions = plan(&pool, &squad, &config).unwrap();
    assert_eq!(1, solutions.len());
    assert_eq!(config.fingerprint(), solutions[0].fingerprint);
    assert!(solutions[0].optimal);

    let week = &solutions[0].plans[0];
    testing::assert_plan_legal(week, &pool);
    assert_eq!(None, week.chip);
    let captain = week.captain().unwrap();
    assert_eq!(PlayerId(17), captain.player);
    assert_eq!(2, captain.multiplier);
    assert!(week.expected_points >= 21.0);
    assert_float_absolute_eq!(solutions[0].score, week.expected_points, 1e-6);
}

#[test]
fn forced_triple_captain_triples_the_standout() {
    let pool = testing::pool_with(Horizon::new(1, 1), |id, _| if id == 17 { 10.0 } else { 1.0 });
    let mut squad = testing::initial_squad();
    squad.chips.tc = true;
    let config = Config {
        use_tc: vec![1],
        ..testing::base_config()
    };

    let solutions = plan(&pool, &squad, &config).unwrap();
    let week = &solutions[0].plans[0];
    testing::assert_plan_legal(week, &pool);
    assert_eq!(Some(Chip::TripleCaptain), week.chip);
    let captain = week.captain().unwrap();
    assert_eq!(PlayerId(17), captain.player);
    assert_eq!(3, captain.multiplier);
    assert!(week.expected_points >= 30.0);
}

/// Player 15 limps along while 20 (same position, same price) flies; a single
/// banked transfer covers the swap.
fn swap_pool(upgrade_points: f64) -> crate::domain::Pool {
    testing::pool_with(Horizon::new(1, 2), move |id, _| match id {
        15 => 1.5,
        20 => upgrade_points,
        id if owned(id) => 2.0,
        _ => 0.0,
    })
}

fn swap_config() -> Config {
    Config {
        // Transfers only in the opening week; holding the free transfer back
        // banks a valuable two-transfer state.
        no_transfer_last_gws: 1,
        ft_value_list: BTreeMap::from([(2, 4.0)]),
        ..testing::base_config()
    }
}

#[test]
fn clear_upgrade_spends_the_free_transfer() {
    let pool = swap_pool(4.0);
    let solutions = plan(&pool, &testing::initial_squad(), &swap_config()).unwrap();
    let first = &solutions[0].plans[0];
    testing::assert_plan_legal(first, &pool);
    assert_eq!(vec![PlayerId(20)], first.transfer_ins());
    assert_eq!(1, first.transfers_out.len());
    assert_eq!(PlayerId(15), first.transfers_out[0].player);
    assert_eq!(1, first.transfers_made);
    assert_eq!(0, first.hits);
    let second = &solutions[0].plans[1];
    assert_eq!(0, second.hits);
    assert_eq!(1, second.free_transfers);
}

#[test]
fn marginal_upgrade_is_declined_for_the_banked_transfer() {
    let pool = swap_pool(3.0);
    let solutions = plan(&pool, &testing::initial_squad(), &swap_config()).unwrap();
    for week in &solutions[0].plans {
        testing::assert_plan_legal(week, &pool);
        assert_eq!(0, week.transfers_made);
        assert_eq!(0, week.hits);
    }
    assert_eq!(2, solutions[0].plans[1].free_transfers);
}

#[test]
fn forced_bench_boost_cashes_the_strong_bench_week() {
    let bench_ids = [2, 18, 19, 26];
    let pool = testing::pool_with(Horizon::new(1, 3), move |id, week| {
        if bench_ids.contains(&id) {
            if week == 1 {
                5.0
            } else {
                0.0
            }
        } else if owned(id) {
            1.0
        } else {
            0.0
        }
    });
    let mut squad = testing::initial_squad();
    squad.chips.bb = true;
    let config = Config {
        use_bb: vec![2],
        ..testing::base_config()
    };

    let solutions = plan(&pool, &squad, &config).unwrap();
    let plans = &solutions[0].plans;
    for week in plans {
        testing::assert_plan_legal(week, &pool);
    }
    assert_eq!(None, plans[0].chip);
    assert_eq!(Some(Chip::BenchBoost), plans[1].chip);
    assert_eq!(15, plans[1].lineup().count());
    assert!(plans[1].expected_points >= 30.0);
    // Outside the boost the weak four sit on the bench, keeper first.
    let reserves: Vec<PlayerId> = plans[0]
        .picks
        .iter()
        .filter(|pick| pick.bench_slot.is_some())
        .map(|pick| pick.player)
        .collect();
    for id in bench_ids {
        assert!(reserves.contains(&PlayerId(id)));
    }
}

#[test]
fn iteration_cut_yields_a_distinct_runner_up() {
    let pool = testing::pool_with(Horizon::new(1, 2), |id, _| match id {
        15 => 1.5,
        20 => 4.0,
        21 => 3.85,
        id if owned(id) => 2.0,
        _ => 0.0,
    });
    let config = Config {
        num_iterations: 2,
        hit_limit: Some(0),
        no_transfer_last_gws: 1,
        ..testing::base_config()
    };

    let solutions = plan(&pool, &testing::initial_squad(), &config).unwrap();
    assert_eq!(2, solutions.len());
    let first_ins = solutions[0].plans[0].transfer_ins();
    let second_ins = solutions[1].plans[0].transfer_ins();
    assert_eq!(vec![PlayerId(20)], first_ins);
    assert_ne!(first_ins, second_ins);
    assert!(solutions[1].score <= solutions[0].score + 1e-6);
    for solution in &solutions {
        for week in &solution.plans {
            testing::assert_plan_legal(week, &pool);
        }
    }
}

#[test]
fn profitable_hit_is_taken() {
    let pool = testing::pool_with(Horizon::new(1, 1), |id, _| match id {
        20 => 10.0,
        21 => 9.0,
        id if owned(id) => 1.0,
        _ => 0.0,
    });
    let solutions = plan(&pool, &testing::initial_squad(), &testing::base_config()).unwrap();
    let week = &solutions[0].plans[0];
    testing::assert_plan_legal(week, &pool);
    assert_eq!(2, week.transfers_made);
    assert_eq!(1, week.hits);
    let ins = week.transfer_ins();
    assert!(ins.contains(&PlayerId(20)) && ins.contains(&PlayerId(21)));
}

#[test]
fn forced_wildcard_rebuilds_without_hits() {
    let pool = testing::pool_with(Horizon::new(1, 2), |id, _| match id {
        21 | 22 | 23 => 4.0,
        id if owned(id) => 1.0,
        _ => 0.0,
    });
    let mut squad = testing::initial_squad();
    squad.chips.wc = true;
    let config = Config {
        use_wc: vec![1],
        ..testing::base_config()
    };

    let solutions = plan(&pool, &squad, &config).unwrap();
    let plans = &solutions[0].plans;
    for week in plans {
        testing::assert_plan_legal(week, &pool);
        assert_eq!(0, week.hits);
    }
    assert_eq!(Some(Chip::Wildcard), plans[0].chip);
    assert!(plans[0].transfers_made >= 3);
    // A wildcard week carries the banked transfers through unchanged.
    assert_eq!(plans[0].free_transfers, plans[1].free_transfers);
}

#[test]
fn forced_free_hit_reverts_the_squad() {
    let pool = testing::pool_with(Horizon::new(1, 2), |id, week| match id {
        21 if week == 0 => 20.0,
        id if owned(id) => 1.0,
        _ => 0.0,
    });
    let mut squad = testing::initial_squad();
    squad.chips.fh = true;
    let config = Config {
        use_fh: vec![1],
        no_transfer_last_gws: 1,
        ..testing::base_config()
    };

    let solutions = plan(&pool, &squad, &config).unwrap();
    let plans = &solutions[0].plans;
    for week in plans {
        testing::assert_plan_legal(week, &pool);
    }
    assert_eq!(Some(Chip::FreeHit), plans[0].chip);
    assert!(plans[0].pick(PlayerId(21)).is_some());
    assert_eq!(0, plans[0].transfers_made);
    // The held squad re-emerges untouched, with the bank and the banked
    // transfer carried through.
    assert!(plans[1].pick(PlayerId(21)).is_none());
    for id in INITIAL_IDS {
        assert!(plans[1].pick(PlayerId(id)).is_some());
    }
    assert_float_absolute_eq!(1000.0, plans[0].bank, 1e-6);
    assert_float_absolute_eq!(1000.0, plans[1].bank, 1e-6);
    assert_eq!(1, plans[1].free_transfers);
}

#[test]
fn banked_transfers_stay_capped_at_five() {
    let pool = testing::synthetic_pool(Horizon::new(1, 2));
    let mut squad = testing::initial_squad();
    squad.free_transfers = 5;
    let config = Config {
        no_transfer_last_gws: 2,
        ..testing::base_config()
    };
    let solutions = plan(&pool, &squad, &config).unwrap();
    assert_eq!(5, solutions[0].plans[0].free_transfers);
    assert_eq!(5, solutions[0].plans[1].free_transfers);
}

#[test]
fn booked_transfer_is_honoured_even_when_pointless() {
    let pool = testing::pool_with(Horizon::new(1, 1), |id, _| {
        if owned(id) {
            1.0
        } else {
            0.0
        }
    });
    let config = Config {
        booked_transfers: vec![BookedTransfer {
            gameweek: 1,
            transfer_in: Some(PlayerId(20)),
            transfer_out: Some(PlayerId(15)),
        }],
        ..testing::base_config()
    };
    let solutions = plan(&pool, &testing::initial_squad(), &config).unwrap();
    let week = &solutions[0].plans[0];
    testing::assert_plan_legal(week, &pool);
    assert!(week.transfer_ins().contains(&PlayerId(20)));
    assert_eq!(PlayerId(15), week.transfers_out[0].player);
}

#[test]
fn unaffordable_lock_is_infeasible() {
    let pool = testing::priced_pool(
        Horizon::new(1, 1),
        |_, _| 1.0,
        |id| if id == 20 { 500 } else { 50 },
    );
    let mut squad = testing::initial_squad();
    squad.bank = 0;
    let config = Config {
        locked: vec![PlayerId(20)],
        ..testing::base_config()
    };
    let err = plan(&pool, &squad, &config).unwrap_err();
    assert!(matches!(
        err.kind,
        PlanFailure::Solver(SolverError::Infeasible)
    ));
}

#[test]
fn clashing_forced_chips_fail_before_the_solve() {
    let pool = testing::synthetic_pool(Horizon::new(1, 1));
    let mut squad = testing::initial_squad();
    squad.chips.wc = true;
    squad.chips.bb = true;
    let config = Config {
        use_wc: vec![1],
        use_bb: vec![1],
        ..testing::base_config()
    };
    let err = plan(&pool, &squad, &config).unwrap_err();
    assert!(matches!(
        err.kind,
        PlanFailure::Config(ConfigError::ChipClash { gameweek: 1, .. })
    ));
}

#[test]
fn unknown_locked_player_is_fatal() {
    let pool = testing::synthetic_pool(Horizon::new(1, 1));
    let config = Config {
        locked: vec![PlayerId(99)],
        ..testing::base_config()
    };
    let err = plan(&pool, &testing::initial_squad(), &config).unwrap_err();
    assert!(matches!(
        err.kind,
        PlanFailure::Data(crate::error::DataError::UnknownPlayer {
            id: PlayerId(99),
            context: "locked"
        })
    ));
}
