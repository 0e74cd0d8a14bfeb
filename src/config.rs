//! Planner configuration: a fully-resolved, immutable value assembled by
//! overlaying partial layers (files, then flags) onto the documented defaults.

use std::collections::BTreeMap;
use std::fs;
use std::hash::Hasher;
use std::path::Path;

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::domain::{Chip, ChipAvailability, Gameweek, Horizon, PlayerId};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum SolverKind {
    #[serde(rename = "highs")]
    #[strum(serialize = "highs")]
    Highs,
}

/// A transfer committed ahead of the solve. Either side may be open; a booking
/// with both sides fixes the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedTransfer {
    #[serde(rename = "gw")]
    pub gameweek: Gameweek,
    #[serde(default)]
    pub transfer_in: Option<PlayerId>,
    #[serde(default)]
    pub transfer_out: Option<PlayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipLimits {
    pub wc: u8,
    pub fh: u8,
    pub bb: u8,
    pub tc: u8,
}

impl Default for ChipLimits {
    fn default() -> Self {
        Self {
            wc: 1,
            fh: 1,
            bb: 1,
            tc: 1,
        }
    }
}

impl ChipLimits {
    pub fn limit(&self, chip: Chip) -> u8 {
        match chip {
            Chip::Wildcard => self.wc,
            Chip::FreeHit => self.fh,
            Chip::BenchBoost => self.bb,
            Chip::TripleCaptain => self.tc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub horizon: u8,
    pub decay_base: f64,
    pub bench_weights: BTreeMap<u8, f64>,
    pub vcap_weight: f64,
    pub ft_value_list: BTreeMap<u8, f64>,
    pub itb_value: f64,
    pub hit_cost: f64,
    pub banned: Vec<PlayerId>,
    pub locked: Vec<PlayerId>,
    pub keep: Vec<PlayerId>,
    pub no_transfer_last_gws: u8,
    pub hit_limit: Option<u32>,
    /// Hits allowed in any single gameweek; 0 leaves the week uncapped.
    pub weekly_hit_limit: u32,
    pub booked_transfers: Vec<BookedTransfer>,
    pub use_wc: Vec<Gameweek>,
    pub use_bb: Vec<Gameweek>,
    pub use_fh: Vec<Gameweek>,
    pub use_tc: Vec<Gameweek>,
    pub chip_limits: ChipLimits,
    pub xmin_lb: f64,
    pub ev_per_price_cutoff: f64,
    pub keep_top_ev_percent: f64,
    pub solver: SolverKind,
    pub time_limit_secs: f64,
    pub optimality_gap: f64,
    pub random_seed: Option<u64>,
    pub num_iterations: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            horizon: 8,
            decay_base: 0.9,
            bench_weights: BTreeMap::from([(0, 0.03), (1, 0.21), (2, 0.06), (3, 0.002)]),
            vcap_weight: 0.1,
            ft_value_list: BTreeMap::from([(2, 2.0), (3, 1.6), (4, 1.3), (5, 1.1)]),
            itb_value: 0.08,
            hit_cost: 4.0,
            banned: vec![],
            locked: vec![],
            keep: vec![],
            no_transfer_last_gws: 2,
            hit_limit: None,
            weekly_hit_limit: 0,
            booked_transfers: vec![],
            use_wc: vec![],
            use_bb: vec![],
            use_fh: vec![],
            use_tc: vec![],
            chip_limits: ChipLimits::default(),
            xmin_lb: 300.0,
            ev_per_price_cutoff: 30.0,
            keep_top_ev_percent: 5.0,
            solver: SolverKind::Highs,
            time_limit_secs: 600.0,
            optimality_gap: 0.0,
            random_seed: None,
            num_iterations: 1,
        }
    }
}

impl Config {
    /// Stable hash of the canonical serialisation. Two configs with the same
    /// resolved values always fingerprint identically.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_string(self).expect("config serialises");
        let mut hasher = FxHasher::default();
        hasher.write(canonical.as_bytes());
        format!("{:016x}", hasher.finish())
    }

    pub fn bench_weight(&self, slot: u8) -> f64 {
        self.bench_weights.get(&slot).copied().unwrap_or(0.0)
    }

    pub fn ft_value(&self, state: u8) -> f64 {
        self.ft_value_list.get(&state).copied().unwrap_or(0.0)
    }

    pub fn forced_chips(&self) -> impl Iterator<Item = (Chip, Gameweek)> + '_ {
        let lists = [
            (Chip::Wildcard, &self.use_wc),
            (Chip::FreeHit, &self.use_fh),
            (Chip::BenchBoost, &self.use_bb),
            (Chip::TripleCaptain, &self.use_tc),
        ];
        lists
            .into_iter()
            .flat_map(|(chip, weeks)| weeks.iter().map(move |&gw| (chip, gw)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let out_of_range = |field: &'static str, detail: String| -> Result<(), ConfigError> {
            Err(ConfigError::OutOfRange { field, detail })
        };
        if self.horizon == 0 {
            return out_of_range("horizon", "must cover at least one gameweek".into());
        }
        if !(self.decay_base > 0.0 && self.decay_base <= 1.0) {
            return out_of_range("decay_base", format!("{} not in (0, 1]", self.decay_base));
        }
        if !(0.0..=1.0).contains(&self.vcap_weight) {
            return out_of_range("vcap_weight", format!("{} not in [0, 1]", self.vcap_weight));
        }
        if let Some(&slot) = self.bench_weights.keys().find(|&&slot| slot > 3) {
            return out_of_range("bench_weights", format!("slot {slot} does not exist"));
        }
        if self.hit_cost < 0.0 {
            return out_of_range("hit_cost", format!("{} is negative", self.hit_cost));
        }
        if !(0.0..=100.0).contains(&self.keep_top_ev_percent) {
            return out_of_range(
                "keep_top_ev_percent",
                format!("{} not in [0, 100]", self.keep_top_ev_percent),
            );
        }
        if !(0.0..=100.0).contains(&self.ev_per_price_cutoff) {
            return out_of_range(
                "ev_per_price_cutoff",
                format!("{} not in [0, 100]", self.ev_per_price_cutoff),
            );
        }
        if self.time_limit_secs <= 0.0 {
            return out_of_range(
                "time_limit_secs",
                format!("{} is not a usable budget", self.time_limit_secs),
            );
        }
        if self.optimality_gap < 0.0 {
            return out_of_range(
                "optimality_gap",
                format!("{} is negative", self.optimality_gap),
            );
        }
        if self.num_iterations == 0 {
            return out_of_range("num_iterations", "at least one solve is required".into());
        }

        let mut forced: Vec<(Chip, Gameweek)> = self.forced_chips().collect();
        forced.sort_by_key(|&(_, gw)| gw);
        for pair in forced.windows(2) {
            let ((first, gw_a), (second, gw_b)) = (pair[0], pair[1]);
            if gw_a == gw_b && first != second {
                return Err(ConfigError::ChipClash {
                    first,
                    second,
                    gameweek: gw_a,
                });
            }
        }
        Ok(())
    }

    /// Checks that depend on the run's horizon and chip ledger rather than the
    /// config alone.
    pub fn validate_for(
        &self,
        horizon: Horizon,
        chips: &ChipAvailability,
    ) -> Result<(), ConfigError> {
        for (chip, gameweek) in self.forced_chips() {
            if !horizon.contains(gameweek) {
                return Err(ConfigError::ChipOutsideHorizon { chip, gameweek });
            }
            if !chips.has(chip) {
                return Err(ConfigError::ChipUnavailable { chip, gameweek });
            }
        }
        let frozen_from = horizon
            .last()
            .saturating_sub(self.no_transfer_last_gws.saturating_sub(1));
        for booking in &self.booked_transfers {
            if self.no_transfer_last_gws > 0
                && horizon.contains(booking.gameweek)
                && booking.gameweek >= frozen_from
            {
                return Err(ConfigError::BookedInFrozenWeek {
                    gameweek: booking.gameweek,
                });
            }
        }
        Ok(())
    }

    /// Overlays partial layers left to right onto the defaults.
    pub fn resolve(layers: impl IntoIterator<Item = ConfigDelta>) -> Self {
        layers
            .into_iter()
            .fold(Self::default(), |config, layer| layer.onto(config))
    }

    pub fn load_layer(path: impl AsRef<Path>) -> Result<ConfigDelta, ConfigError> {
        let path = path.as_ref();
        let malformed = |detail: String| ConfigError::Malformed {
            path: path.display().to_string(),
            detail,
        };
        let raw = fs::read_to_string(path).map_err(|err| malformed(err.to_string()))?;
        serde_json::from_str(&raw).map_err(|err| malformed(err.to_string()))
    }
}

/// One overlay layer: any subset of config fields. Unknown fields are rejected
/// so a typo cannot silently fall back to a default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigDelta {
    pub horizon: Option<u8>,
    pub decay_base: Option<f64>,
    pub bench_weights: Option<BTreeMap<u8, f64>>,
    pub vcap_weight: Option<f64>,
    pub ft_value_list: Option<BTreeMap<u8, f64>>,
    pub itb_value: Option<f64>,
    pub hit_cost: Option<f64>,
    pub banned: Option<Vec<PlayerId>>,
    pub locked: Option<Vec<PlayerId>>,
    pub keep: Option<Vec<PlayerId>>,
    pub no_transfer_last_gws: Option<u8>,
    pub hit_limit: Option<Option<u32>>,
    pub weekly_hit_limit: Option<u32>,
    pub booked_transfers: Option<Vec<BookedTransfer>>,
    pub use_wc: Option<Vec<Gameweek>>,
    pub use_bb: Option<Vec<Gameweek>>,
    pub use_fh: Option<Vec<Gameweek>>,
    pub use_tc: Option<Vec<Gameweek>>,
    pub chip_limits: Option<ChipLimits>,
    pub xmin_lb: Option<f64>,
    pub ev_per_price_cutoff: Option<f64>,
    pub keep_top_ev_percent: Option<f64>,
    pub solver: Option<SolverKind>,
    pub time_limit_secs: Option<f64>,
    pub optimality_gap: Option<f64>,
    pub random_seed: Option<Option<u64>>,
    pub num_iterations: Option<u32>,
}

macro_rules! overlay {
    ($delta:expr, $config:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $delta.$field {
                $config.$field = value;
            }
        )+
    };
}

impl ConfigDelta {
    pub fn onto(self, mut config: Config) -> Config {
        overlay!(
            self,
            config,
            horizon,
            decay_base,
            bench_weights,
            vcap_weight,
            ft_value_list,
            itb_value,
            hit_cost,
            banned,
            locked,
            keep,
            no_transfer_last_gws,
            hit_limit,
            weekly_hit_limit,
            booked_transfers,
            use_wc,
            use_bb,
            use_fh,
            use_tc,
            chip_limits,
            xmin_lb,
            ev_per_price_cutoff,
            keep_top_ev_percent,
            solver,
            time_limit_secs,
            optimality_gap,
            random_seed,
            num_iterations,
        );
        config
    }
}
