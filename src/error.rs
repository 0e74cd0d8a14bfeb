//! The failure taxonomy of the planning pipeline.

use thiserror::Error;

use crate::domain::{Chip, Gameweek, PlayerId};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} out of range: {detail}")]
    OutOfRange { field: &'static str, detail: String },

    #[error("chips {first} and {second} are both forced in gameweek {gameweek}")]
    ChipClash {
        first: Chip,
        second: Chip,
        gameweek: Gameweek,
    },

    #[error("chip {chip} is forced in gameweek {gameweek} but is not available")]
    ChipUnavailable { chip: Chip, gameweek: Gameweek },

    #[error("chip {chip} is forced in gameweek {gameweek}, outside the planning horizon")]
    ChipOutsideHorizon { chip: Chip, gameweek: Gameweek },

    #[error("a transfer is booked for gameweek {gameweek}, which falls in the frozen tail")]
    BookedInFrozenWeek { gameweek: Gameweek },

    #[error("malformed config layer {path}: {detail}")]
    Malformed { path: String, detail: String },
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("source {source_name} is missing required column {column}")]
    MissingColumn {
        column: String,
        source_name: String,
    },

    #[error("source {source_name}, record {record}: {detail}")]
    MalformedRow {
        source_name: String,
        record: usize,
        detail: String,
    },

    #[error("player {id} referenced by {context} is not in the player pool")]
    UnknownPlayer { id: PlayerId, context: &'static str },

    #[error("player {id} appears more than once in the pool")]
    DuplicatePlayer { id: PlayerId },

    #[error("projection source {source_name} has non-positive weight {weight}")]
    BadSourceWeight { source_name: String, weight: f64 },

    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {detail}")]
    Json { path: String, detail: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("inconsistent initial squad: {detail}")]
    InconsistentSquad { detail: String },

    #[error("model would require {count} decision variables, above the supported ceiling")]
    VariableOverflow { count: usize },

    #[error("empty planning horizon")]
    EmptyHorizon,
}

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("model has no feasible solution")]
    Infeasible,

    #[error("time limit reached with no incumbent solution")]
    NoSolution,

    #[error("solver terminated abnormally: {0}")]
    Backend(String),
}

/// Anything the planning entry point can fail with. The config fingerprint is
/// attached so persisted diagnostics can be traced back to the exact run.
#[derive(Debug, Error)]
#[error("{kind} [config {fingerprint}]")]
pub struct PlanError {
    pub fingerprint: String,
    #[source]
    pub kind: PlanFailure,
}

#[derive(Debug, Error)]
pub enum PlanFailure {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Solver(#[from] SolverError),
}
