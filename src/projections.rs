//! Joins the authoritative player listing with one or more weighted
//! projection sources into the uniform pool the rest of the pipeline shares.

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::domain::{Forecast, Gameweek, Horizon, Player, PlayerId, Pool, Position, TeamId};
use crate::error::DataError;

/// One row of the authoritative player list.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub team: TeamId,
    pub price: u32,
}

/// A projection feed keyed by player id, with a blend weight.
#[derive(Debug, Clone, Default)]
pub struct ProjectionSource {
    pub name: String,
    pub weight: f64,
    pub forecasts: FxHashMap<PlayerId, FxHashMap<Gameweek, Forecast>>,
}

/// Produces exactly one pool entry per authoritative player. Each (player,
/// gameweek, field) is the weight-normalised blend across sources, with absent
/// entries contributing zero. Projection rows for unknown ids are dropped with
/// a diagnostic.
pub fn merge(
    listing: &[Listing],
    sources: &[ProjectionSource],
    horizon: Horizon,
) -> Result<Pool, DataError> {
    for source in sources {
        if source.weight <= 0.0 {
            return Err(DataError::BadSourceWeight {
                source_name: source.name.clone(),
                weight: source.weight,
            });
        }
    }
    let total_weight: f64 = sources.iter().map(|source| source.weight).sum();

    let known: FxHashMap<PlayerId, ()> = listing.iter().map(|entry| (entry.id, ())).collect();
    for source in sources {
        let unknown = source
            .forecasts
            .keys()
            .filter(|id| !known.contains_key(id))
            .count();
        if unknown > 0 {
            warn!(
                "dropping {unknown} unknown player ids from projection source {}",
                source.name
            );
        }
    }

    let players = listing
        .iter()
        .map(|entry| {
            let forecasts = horizon
                .gameweeks()
                .map(|gameweek| {
                    let mut blended = Forecast::default();
                    for source in sources {
                        if let Some(forecast) = source
                            .forecasts
                            .get(&entry.id)
                            .and_then(|by_week| by_week.get(&gameweek))
                        {
                            blended.points += source.weight * forecast.points;
                            blended.minutes += source.weight * forecast.minutes;
                        }
                    }
                    if total_weight > 0.0 {
                        blended.points /= total_weight;
                        blended.minutes /= total_weight;
                    }
                    blended
                })
                .collect();
            Player {
                id: entry.id,
                name: entry.name.clone(),
                position: entry.position,
                team: entry.team,
                price: entry.price,
                forecasts,
            }
        })
        .collect();

    let pool = Pool::new(horizon, players)?;
    debug!(
        "merged {} sources into a pool of {} players over gameweeks {}..={}",
        sources.len(),
        pool.len(),
        horizon.first,
        horizon.last()
    );
    Ok(pool)
}
