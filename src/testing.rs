//! Shared fixtures for the solver-backed tests: a small synthetic league with
//! legal quotas, a held squad, and the invariant checks every returned plan
//! must satisfy.

use rustc_hash::{FxHashMap, FxHashSet};
use strum::IntoEnumIterator;

use crate::config::Config;
use crate::domain::{
    Chip, Forecast, Horizon, OwnedPlayer, Player, PlayerId, Pool, Position, SquadState,
    BENCH_SLOTS, MAX_PER_TEAM, SQUAD_SIZE,
};
use crate::plan::GameweekPlan;

/// A legal 15 drawn from the synthetic league: two keepers, five defenders,
/// five midfielders, three forwards, no more than three per team.
pub const INITIAL_IDS: [u32; SQUAD_SIZE] = [1, 2, 5, 6, 7, 8, 9, 15, 16, 17, 18, 19, 25, 26, 27];

fn position_of(id: u32) -> Position {
    match id {
        1..=4 => Position::Goalkeeper,
        5..=14 => Position::Defender,
        15..=24 => Position::Midfielder,
        _ => Position::Forward,
    }
}

fn team_of(id: u32) -> u8 {
    ((id - 1) % 10 + 1) as u8
}

/// Thirty players (4 GK, 10 DEF, 10 MID, 6 FWD) across ten teams, with
/// projections and prices supplied by the closures.
pub fn priced_pool(
    horizon: Horizon,
    points: impl Fn(u32, usize) -> f64,
    price: impl Fn(u32) -> u32,
) -> Pool {
    let players = (1..=30)
        .map(|id| Player {
            id: PlayerId(id),
            name: format!("Player {id}"),
            position: position_of(id),
            team: team_of(id),
            price: price(id),
            forecasts: (0..horizon.len())
                .map(|week| Forecast {
                    points: points(id, week),
                    minutes: 90.0,
                })
                .collect(),
        })
        .collect();
    Pool::new(horizon, players).unwrap()
}

pub fn pool_with(horizon: Horizon, points: impl Fn(u32, usize) -> f64) -> Pool {
    priced_pool(horizon, points, |_| 50)
}

pub fn synthetic_pool(horizon: Horizon) -> Pool {
    pool_with(horizon, |_, _| 1.0)
}

/// The held squad over [INITIAL_IDS], flat prices, a deep bank, one free
/// transfer and no chips.
pub fn initial_squad() -> SquadState {
    SquadState {
        players: INITIAL_IDS
            .iter()
            .map(|&id| OwnedPlayer {
                id: PlayerId(id),
                purchase_price: 50,
                selling_price: 50,
            })
            .collect(),
        bank: 1000,
        free_transfers: 1,
        chips: Default::default(),
        chips_used: vec![],
    }
}

/// A config with the shortlist filters and soft valuations switched off, so
/// scenarios control the objective entirely through projections.
pub fn base_config() -> Config {
    Config {
        no_transfer_last_gws: 0,
        itb_value: 0.0,
        xmin_lb: 0.0,
        ev_per_price_cutoff: 0.0,
        keep_top_ev_percent: 0.0,
        ft_value_list: Default::default(),
        time_limit_secs: 60.0,
        ..Config::default()
    }
}

/// Every invariant a returned gameweek plan must satisfy, regardless of the
/// scenario that produced it.
pub fn assert_plan_legal(plan: &GameweekPlan, pool: &Pool) {
    assert_eq!(SQUAD_SIZE, plan.picks.len(), "gw{}: squad size", plan.gameweek);
    let distinct: FxHashSet<PlayerId> = plan.picks.iter().map(|pick| pick.player).collect();
    assert_eq!(SQUAD_SIZE, distinct.len(), "gw{}: duplicate picks", plan.gameweek);

    let boosted = plan.chip == Some(Chip::BenchBoost);
    let starters = plan.lineup().count();
    assert_eq!(
        if boosted { 15 } else { 11 },
        starters,
        "gw{}: lineup size",
        plan.gameweek
    );

    for position in Position::iter() {
        let held = plan
            .picks
            .iter()
            .filter(|pick| pick.position == position)
            .count();
        assert_eq!(
            position.squad_quota(),
            held,
            "gw{}: {position} quota",
            plan.gameweek
        );
        if !boosted {
            let starting = plan
                .lineup()
                .filter(|pick| pick.position == position)
                .count();
            assert!(
                (position.min_play()..=position.max_play()).contains(&starting),
                "gw{}: {starting} starting {position}",
                plan.gameweek
            );
        }
    }

    let mut per_team: FxHashMap<u8, usize> = Default::default();
    for pick in &plan.picks {
        let team = pool
            .player(pick.player)
            .map(|player| player.team)
            .unwrap_or_default();
        *per_team.entry(team).or_default() += 1;
    }
    assert!(
        per_team.values().all(|&count| count <= MAX_PER_TEAM),
        "gw{}: team cap breached",
        plan.gameweek
    );

    let captain = plan.captain().expect("a captain is always named");
    let vice = plan.vice_captain().expect("a vice-captain is always named");
    assert_ne!(captain.player, vice.player, "gw{}: armbands clash", plan.gameweek);
    assert!(captain.lineup && vice.lineup, "gw{}: armbands on the bench", plan.gameweek);
    assert!(captain.multiplier >= 2);
    assert_eq!(1, vice.multiplier);

    if !boosted {
        let mut slots: Vec<u8> = plan.picks.iter().filter_map(|pick| pick.bench_slot).collect();
        slots.sort_unstable();
        assert_eq!(
            (0..BENCH_SLOTS as u8).collect::<Vec<_>>(),
            slots,
            "gw{}: bench slots",
            plan.gameweek
        );
        let first_reserve = plan
            .picks
            .iter()
            .find(|pick| pick.bench_slot == Some(0))
            .unwrap();
        assert_eq!(
            Position::Goalkeeper,
            first_reserve.position,
            "gw{}: bench slot 0 must be a keeper",
            plan.gameweek
        );
        for pick in &plan.picks {
            assert!(
                pick.lineup ^ pick.bench_slot.is_some(),
                "gw{}: player {} has no single role",
                plan.gameweek,
                pick.player
            );
            if pick.bench_slot.is_some() {
                assert_eq!(0, pick.multiplier);
            }
        }
    }

    assert!(plan.bank >= -1e-6, "gw{}: bank overdrawn", plan.gameweek);
    assert!(
        (1..=5).contains(&plan.free_transfers),
        "gw{}: free transfers out of band",
        plan.gameweek
    );
}
