//! Core vocabulary of the planner: players, positions, chips, money and the
//! state the season has left the squad in.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumCount, EnumIter};
use tracing::warn;

use crate::error::{DataError, ModelError};
use crate::lookup::IdLookup;

pub type Gameweek = u8;
pub type TeamId = u8;

pub const SQUAD_SIZE: usize = 15;
pub const LINEUP_SIZE: usize = 11;
pub const BENCH_SLOTS: usize = 4;
pub const MAX_PER_TEAM: usize = 3;
pub const MAX_FREE_TRANSFERS: u8 = 5;
pub const TEAMS: usize = 20;

/// The FPL element id. Stable across a season; the key that joins the
/// authoritative listing, projection feeds and the owned squad.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumCount,
    EnumIter,
)]
pub enum Position {
    #[serde(rename = "G")]
    #[strum(serialize = "GK")]
    Goalkeeper,
    #[serde(rename = "D")]
    #[strum(serialize = "DEF")]
    Defender,
    #[serde(rename = "M")]
    #[strum(serialize = "MID")]
    Midfielder,
    #[serde(rename = "F")]
    #[strum(serialize = "FWD")]
    Forward,
}

impl Position {
    pub fn rank(self) -> u8 {
        self as u8 + 1
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Players of this position a legal squad must hold.
    pub fn squad_quota(self) -> usize {
        match self {
            Position::Goalkeeper => 2,
            Position::Defender => 5,
            Position::Midfielder => 5,
            Position::Forward => 3,
        }
    }

    /// Fewest starters of this position in a legal formation.
    pub fn min_play(self) -> usize {
        match self {
            Position::Goalkeeper => 1,
            Position::Defender => 3,
            Position::Midfielder => 2,
            Position::Forward => 1,
        }
    }

    /// Most starters of this position in a legal formation.
    pub fn max_play(self) -> usize {
        match self {
            Position::Goalkeeper => 1,
            Position::Defender => 5,
            Position::Midfielder => 5,
            Position::Forward => 3,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "G" | "GK" | "GKP" => Some(Position::Goalkeeper),
            "D" | "DEF" => Some(Position::Defender),
            "M" | "MID" => Some(Position::Midfielder),
            "F" | "FWD" => Some(Position::Forward),
            _ => None,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumCount, EnumIter,
)]
pub enum Chip {
    #[serde(rename = "wc")]
    #[strum(serialize = "WC")]
    Wildcard,
    #[serde(rename = "fh")]
    #[strum(serialize = "FH")]
    FreeHit,
    #[serde(rename = "bb")]
    #[strum(serialize = "BB")]
    BenchBoost,
    #[serde(rename = "tc")]
    #[strum(serialize = "TC")]
    TripleCaptain,
}

/// A single gameweek's projection for one player.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Forecast {
    pub points: f64,
    pub minutes: f64,
}

/// A player in the merged pool. Price is in tenths of a million. Forecasts are
/// dense over the planning horizon; absent feed entries have been zero-filled.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub team: TeamId,
    pub price: u32,
    pub forecasts: Vec<Forecast>,
}

impl Player {
    pub fn forecast(&self, week_index: usize) -> Forecast {
        self.forecasts.get(week_index).copied().unwrap_or_default()
    }

    pub fn total_points(&self) -> f64 {
        self.forecasts.iter().map(|f| f.points).sum()
    }

    pub fn total_minutes(&self) -> f64 {
        self.forecasts.iter().map(|f| f.minutes).sum()
    }
}

/// A contiguous run of gameweeks starting at the next unplayed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub first: Gameweek,
    pub length: u8,
}

impl Horizon {
    pub fn new(first: Gameweek, length: u8) -> Self {
        Self { first, length }
    }

    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn last(&self) -> Gameweek {
        self.first + self.length - 1
    }

    pub fn gameweek(&self, week_index: usize) -> Gameweek {
        debug_assert!(week_index < self.len());
        self.first + week_index as Gameweek
    }

    pub fn contains(&self, gameweek: Gameweek) -> bool {
        gameweek >= self.first && gameweek <= self.last()
    }

    pub fn offset(&self, gameweek: Gameweek) -> Option<usize> {
        self.contains(gameweek)
            .then(|| (gameweek - self.first) as usize)
    }

    pub fn gameweeks(&self) -> impl Iterator<Item = Gameweek> {
        self.first..=self.last()
    }
}

/// The sell value the game grants for a held player: purchase price plus half
/// the rise, rounded down, or the full current price after a fall.
pub fn selling_price(purchase: u32, current: u32) -> u32 {
    if current > purchase {
        purchase + (current - purchase) / 2
    } else {
        current
    }
}

/// A player currently held, with the prices that matter for transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedPlayer {
    pub id: PlayerId,
    #[serde(rename = "purchase_tenths")]
    pub purchase_price: u32,
    #[serde(rename = "sell_tenths")]
    pub selling_price: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipPlay {
    pub chip: Chip,
    #[serde(rename = "gw")]
    pub gameweek: Gameweek,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChipAvailability {
    pub wc: bool,
    pub fh: bool,
    pub bb: bool,
    pub tc: bool,
}

impl ChipAvailability {
    pub fn all() -> Self {
        Self {
            wc: true,
            fh: true,
            bb: true,
            tc: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn has(&self, chip: Chip) -> bool {
        match chip {
            Chip::Wildcard => self.wc,
            Chip::FreeHit => self.fh,
            Chip::BenchBoost => self.bb,
            Chip::TripleCaptain => self.tc,
        }
    }
}

/// Initial conditions for the plan: the held squad, the bank, the banked free
/// transfers and the chip ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadState {
    pub players: Vec<OwnedPlayer>,
    #[serde(rename = "bank_tenths")]
    pub bank: u32,
    pub free_transfers: u8,
    #[serde(rename = "chips_available")]
    pub chips: ChipAvailability,
    #[serde(rename = "chips_used", default)]
    pub chips_used: Vec<ChipPlay>,
}

impl SquadState {
    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.iter().any(|owned| owned.id == id)
    }

    pub fn validate(&self, pool: &Pool) -> Result<(), ModelError> {
        let inconsistent = |detail: String| ModelError::InconsistentSquad { detail };
        if self.players.len() != SQUAD_SIZE {
            return Err(inconsistent(format!(
                "{} players held, expected {SQUAD_SIZE}",
                self.players.len()
            )));
        }
        if !(1..=MAX_FREE_TRANSFERS).contains(&self.free_transfers) {
            return Err(inconsistent(format!(
                "{} free transfers banked, expected 1 to {MAX_FREE_TRANSFERS}",
                self.free_transfers
            )));
        }

        let mut quota = [0usize; 4];
        let mut per_team = [0usize; 256];
        for owned in &self.players {
            if self.players.iter().filter(|o| o.id == owned.id).count() > 1 {
                return Err(inconsistent(format!("player {} held twice", owned.id)));
            }
            let player = pool
                .player(owned.id)
                .ok_or_else(|| inconsistent(format!("held player {} not in the pool", owned.id)))?;
            quota[player.position.index()] += 1;
            per_team[player.team as usize] += 1;
        }
        for position in Position::iter() {
            if quota[position.index()] != position.squad_quota() {
                return Err(inconsistent(format!(
                    "{} {position} players held, expected {}",
                    quota[position.index()],
                    position.squad_quota()
                )));
            }
        }
        if let Some((team, count)) = per_team
            .iter()
            .enumerate()
            .find(|(_, &count)| count > MAX_PER_TEAM)
        {
            return Err(inconsistent(format!(
                "{count} players held from team {team}, at most {MAX_PER_TEAM} allowed"
            )));
        }
        for play in &self.chips_used {
            if self.chips.has(play.chip) {
                warn!(
                    "chip {} recorded as used in gameweek {} but still flagged available",
                    play.chip, play.gameweek
                );
            }
        }
        Ok(())
    }
}

/// The shared read-only player universe over a fixed horizon. Players are
/// addressed by dense index in the model; the lookup maps ids back and forth.
#[derive(Debug, Clone)]
pub struct Pool {
    horizon: Horizon,
    players: Vec<Player>,
    lookup: IdLookup,
}

impl Pool {
    pub fn new(horizon: Horizon, mut players: Vec<Player>) -> Result<Self, DataError> {
        for player in &mut players {
            player.forecasts.resize(horizon.len(), Forecast::default());
        }
        let lookup = IdLookup::build(players.iter().map(|player| player.id))
            .map_err(|id| DataError::DuplicatePlayer { id })?;
        Ok(Self {
            horizon,
            players,
            lookup,
        })
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn index_of(&self, id: PlayerId) -> Option<usize> {
        self.lookup.index_of(id)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.index_of(id).map(|index| &self.players[index])
    }

    /// A pool containing only the players admitted by `keep`, in the original
    /// order. Forecast data is shared by clone; the lookup is rebuilt.
    pub fn restrict(&self, mut keep: impl FnMut(&Player) -> bool) -> Self {
        let players: Vec<_> = self
            .players
            .iter()
            .filter(|player| keep(player))
            .cloned()
            .collect();
        Self::new(self.horizon, players).expect("restriction cannot introduce duplicates")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selling_price_splits_the_rise() {
        assert_eq!(50, selling_price(50, 50));
        assert_eq!(51, selling_price(50, 53));
        assert_eq!(52, selling_price(50, 54));
        assert_eq!(47, selling_price(50, 47));
        assert_eq!(50, selling_price(50, 51));
    }

    #[test]
    fn position_codes() {
        assert_eq!(Some(Position::Goalkeeper), Position::from_code("G"));
        assert_eq!(Some(Position::Goalkeeper), Position::from_code("gkp"));
        assert_eq!(Some(Position::Defender), Position::from_code("DEF"));
        assert_eq!(Some(Position::Midfielder), Position::from_code("M"));
        assert_eq!(Some(Position::Forward), Position::from_code("FWD"));
        assert_eq!(None, Position::from_code("X"));
    }

    #[test]
    fn position_quota_sums_to_squad() {
        let total: usize = Position::iter().map(Position::squad_quota).sum();
        assert_eq!(SQUAD_SIZE, total);
    }

    #[test]
    fn horizon_offsets() {
        let horizon = Horizon::new(12, 4);
        assert_eq!(15, horizon.last());
        assert!(horizon.contains(12));
        assert!(horizon.contains(15));
        assert!(!horizon.contains(16));
        assert_eq!(Some(0), horizon.offset(12));
        assert_eq!(Some(3), horizon.offset(15));
        assert_eq!(None, horizon.offset(11));
        assert_eq!(vec![12, 13, 14, 15], horizon.gameweeks().collect::<Vec<_>>());
    }

    #[test]
    fn pool_zero_fills_forecasts() {
        let horizon = Horizon::new(1, 3);
        let pool = Pool::new(
            horizon,
            vec![Player {
                id: PlayerId(7),
                name: "Seven".into(),
                position: Position::Midfielder,
                team: 1,
                price: 50,
                forecasts: vec![Forecast {
                    points: 4.0,
                    minutes: 90.0,
                }],
            }],
        )
        .unwrap();
        let player = pool.player(PlayerId(7)).unwrap();
        assert_eq!(3, player.forecasts.len());
        assert_eq!(0.0, player.forecast(2).points);
        assert_eq!(4.0, player.total_points());
    }

    #[test]
    fn pool_rejects_duplicates() {
        let player = Player {
            id: PlayerId(7),
            name: "Seven".into(),
            position: Position::Midfielder,
            team: 1,
            price: 50,
            forecasts: vec![],
        };
        let result = Pool::new(Horizon::new(1, 1), vec![player.clone(), player]);
        assert!(matches!(
            result,
            Err(DataError::DuplicatePlayer { id: PlayerId(7) })
        ));
    }
}
