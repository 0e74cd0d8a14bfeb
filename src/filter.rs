//! Pre-solve shortlisting. Cuts the player universe down to a tractable model
//! without ever losing a player the solve is obliged to include.

use rustc_hash::FxHashSet;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::{PlayerId, Pool, SquadState};

/// Applies the shortlisting passes in order: retention, expected minutes,
/// value-per-price percentile, bans. Owned and locked players always survive;
/// a ban on either is ignored with a warning.
pub fn shortlist(pool: &Pool, squad: &SquadState, config: &Config) -> Pool {
    let owned: FxHashSet<PlayerId> = squad.players.iter().map(|owned| owned.id).collect();
    let locked: FxHashSet<PlayerId> = config.locked.iter().copied().collect();

    let mut retained: FxHashSet<PlayerId> = owned.clone();
    retained.extend(&locked);
    retained.extend(&config.keep);
    for booking in &config.booked_transfers {
        retained.extend(booking.transfer_in);
        retained.extend(booking.transfer_out);
    }

    // Top slice by total expected points over the horizon.
    if config.keep_top_ev_percent > 0.0 && !pool.is_empty() {
        let mut ranked: Vec<usize> = (0..pool.len()).collect();
        ranked.sort_by(|&a, &b| {
            pool.players()[b]
                .total_points()
                .total_cmp(&pool.players()[a].total_points())
        });
        let slice = ((config.keep_top_ev_percent / 100.0) * pool.len() as f64).ceil() as usize;
        retained.extend(ranked.iter().take(slice).map(|&i| pool.players()[i].id));
    }

    let mut alive: Vec<bool> = vec![true; pool.len()];

    // Expected-minutes floor.
    let mut dropped_minutes = 0usize;
    for (index, player) in pool.players().iter().enumerate() {
        if !retained.contains(&player.id) && player.total_minutes() < config.xmin_lb {
            alive[index] = false;
            dropped_minutes += 1;
        }
    }

    // Value-for-money percentile over whoever is still standing.
    let mut dropped_value = 0usize;
    if config.ev_per_price_cutoff > 0.0 {
        let value_of = |index: usize| {
            let player = &pool.players()[index];
            player.total_points() / f64::max(player.price as f64, 1.0)
        };
        let candidates: Vec<usize> = (0..pool.len())
            .filter(|&i| alive[i] && !retained.contains(&pool.players()[i].id))
            .collect();
        if !candidates.is_empty() {
            let mut values: Vec<f64> = candidates.iter().map(|&i| value_of(i)).collect();
            values.sort_by(f64::total_cmp);
            let threshold = percentile(&values, config.ev_per_price_cutoff);
            for index in candidates {
                if value_of(index) < threshold {
                    alive[index] = false;
                    dropped_value += 1;
                }
            }
        }
    }

    // Retention shields players from the passive drops above.
    for (index, player) in pool.players().iter().enumerate() {
        if retained.contains(&player.id) {
            alive[index] = true;
        }
    }

    // Bans trump retention, except for owned and locked players.
    for &id in &config.banned {
        if owned.contains(&id) || locked.contains(&id) {
            warn!("ban on player {id} ignored: the player is owned or locked");
            continue;
        }
        if let Some(index) = pool.index_of(id) {
            alive[index] = false;
        }
    }

    let shortlisted = pool.restrict(|player| {
        pool.index_of(player.id)
            .map(|index| alive[index])
            .unwrap_or(false)
    });
    info!(
        "shortlisted {} of {} players ({dropped_minutes} below the minutes floor, \
         {dropped_value} below the value percentile)",
        shortlisted.len(),
        pool.len()
    );
    shortlisted
}

/// Nearest-rank percentile of an ascending-sorted slice.
fn percentile(sorted: &[f64], percent: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let rank = ((percent / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
