//! Reconstruction of the banked free-transfer count from the season's
//! transfer history. The game never reports the number directly; it has to be
//! replayed from the weekly counts and the chip ledger.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::domain::{Gameweek, MAX_FREE_TRANSFERS};

/// The raw transfer history of an entry, as fetched from the game.
#[derive(Debug, Clone, Default)]
pub struct TransferLedger {
    pub first_gameweek: Gameweek,
    pub current_gameweek: Gameweek,
    /// Transfers made per gameweek; absent weeks made none.
    pub transfers: FxHashMap<Gameweek, u32>,
    pub wildcard_weeks: Vec<Gameweek>,
    pub free_hit_weeks: Vec<Gameweek>,
}

impl TransferLedger {
    fn chip_played(&self, gameweek: Gameweek) -> bool {
        self.wildcard_weeks.contains(&gameweek) || self.free_hit_weeks.contains(&gameweek)
    }
}

/// Replays the ledger to the free-transfer count entering the next gameweek.
/// A chip week carries the count through unchanged; every other week banks one
/// more transfer net of those spent, clamped to 1..=5. An override, when set,
/// replaces the replayed result (still clamped).
pub fn reconstruct(ledger: &TransferLedger, override_next: Option<u8>) -> u8 {
    if let Some(forced) = override_next {
        return forced.clamp(1, MAX_FREE_TRANSFERS);
    }

    let mut banked: i32 = 1;
    for gameweek in ledger.first_gameweek + 1..=ledger.current_gameweek {
        if ledger.chip_played(gameweek) {
            continue;
        }
        let spent = ledger.transfers.get(&gameweek).copied().unwrap_or(0) as i32;
        banked = (banked - spent + 1).clamp(1, MAX_FREE_TRANSFERS as i32);
    }
    debug!(
        "reconstructed {banked} free transfers entering gameweek {}",
        ledger.current_gameweek + 1
    );
    banked as u8
}
