//! Multi-period Fantasy Premier League squad planning as a mixed-integer
//! linear program. Given per-gameweek projections, the held squad and a
//! planning horizon, the planner jointly decides squads, lineups, armbands,
//! bench order, transfers and chip timing to maximise decay-weighted expected
//! points net of hit penalties and unspent resources.

#![allow(clippy::too_many_arguments)]

pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod filter;
pub mod linear;
pub mod lookup;
pub mod model;
pub mod optimiser;
pub mod plan;
pub mod print;
pub mod projections;
pub mod sensitivity;
pub mod solver;
pub mod transfers;

#[cfg(test)]
pub(crate) mod testing;

#[doc = include_str!("../README.md")]
#[cfg(doc)]
fn readme() {}
