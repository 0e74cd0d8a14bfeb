//! Collaborator-facing ingest: the projections CSV format and the JSON squad
//! state and solution files. Nothing here is part of the solve itself.

use std::fs::{self, File};
use std::io::{BufWriter, Read};
use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::domain::{Forecast, Gameweek, PlayerId, Position, SquadState};
use crate::error::DataError;
use crate::plan::Solution;
use crate::projections::{Listing, ProjectionSource};

const ID_COLUMN: &str = "ID";
const NAME_COLUMN: &str = "Name";
const POSITION_COLUMN: &str = "Pos";
const TEAM_COLUMN: &str = "Team";
const VALUE_COLUMN: &str = "Value";

/// Reads a projections table in the `ID,Name,Pos,Team,Value,{gw}_Pts,{gw}_xMins`
/// format, yielding both the authoritative listing and a projection source.
pub fn read_projection_csv(
    path: impl AsRef<Path>,
    weight: f64,
) -> Result<(Vec<Listing>, ProjectionSource), DataError> {
    let path = path.as_ref();
    let source_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_projection_csv(file, &source_name, weight)
}

pub fn parse_projection_csv(
    input: impl Read,
    source_name: &str,
    weight: f64,
) -> Result<(Vec<Listing>, ProjectionSource), DataError> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers()?.clone();

    let column = |name: &str| -> Result<usize, DataError> {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| DataError::MissingColumn {
                column: name.into(),
                source_name: source_name.into(),
            })
    };
    let id_col = column(ID_COLUMN)?;
    let name_col = column(NAME_COLUMN)?;
    let position_col = column(POSITION_COLUMN)?;
    let team_col = column(TEAM_COLUMN)?;
    let value_col = column(VALUE_COLUMN)?;

    // Per-gameweek columns are discovered from the header suffixes.
    let mut points_cols: Vec<(Gameweek, usize)> = vec![];
    let mut minutes_cols: Vec<(Gameweek, usize)> = vec![];
    for (index, header) in headers.iter().enumerate() {
        if let Some(week) = header.strip_suffix("_Pts") {
            if let Ok(gameweek) = week.parse::<Gameweek>() {
                points_cols.push((gameweek, index));
            }
        } else if let Some(week) = header.strip_suffix("_xMins") {
            if let Ok(gameweek) = week.parse::<Gameweek>() {
                minutes_cols.push((gameweek, index));
            }
        }
    }
    if points_cols.is_empty() {
        return Err(DataError::MissingColumn {
            column: "{gw}_Pts".into(),
            source_name: source_name.into(),
        });
    }

    let mut listing = vec![];
    let mut forecasts: FxHashMap<PlayerId, FxHashMap<Gameweek, Forecast>> = FxHashMap::default();
    for (record_index, record) in reader.records().enumerate() {
        let record = record?;
        let malformed = |detail: String| DataError::MalformedRow {
            source_name: source_name.into(),
            record: record_index + 1,
            detail,
        };
        let field = |index: usize| record.get(index).unwrap_or("").trim();

        let id = PlayerId(
            field(id_col)
                .parse()
                .map_err(|_| malformed(format!("unparseable id {:?}", field(id_col))))?,
        );
        let position = Position::from_code(field(position_col))
            .ok_or_else(|| malformed(format!("unknown position {:?}", field(position_col))))?;
        let team = field(team_col)
            .parse()
            .map_err(|_| malformed(format!("unparseable team {:?}", field(team_col))))?;
        let value: f64 = field(value_col)
            .parse()
            .map_err(|_| malformed(format!("unparseable value {:?}", field(value_col))))?;

        listing.push(Listing {
            id,
            name: field(name_col).to_string(),
            position,
            team,
            price: (value * 10.0).round() as u32,
        });

        let by_week = forecasts.entry(id).or_default();
        for &(gameweek, index) in &points_cols {
            let points: f64 = field(index).parse().unwrap_or(0.0);
            by_week.entry(gameweek).or_default().points = points;
        }
        for &(gameweek, index) in &minutes_cols {
            let minutes: f64 = field(index).parse().unwrap_or(0.0);
            by_week.entry(gameweek).or_default().minutes = minutes;
        }
    }

    debug!(
        "read {} players and {} projected gameweeks from {source_name}",
        listing.len(),
        points_cols.len()
    );
    Ok((
        listing,
        ProjectionSource {
            name: source_name.into(),
            weight,
            forecasts,
        },
    ))
}

/// The earliest projected gameweek in a source, used to anchor the horizon
/// when the caller does not pin it.
pub fn first_projected_gameweek(source: &ProjectionSource) -> Option<Gameweek> {
    source
        .forecasts
        .values()
        .flat_map(|by_week| by_week.keys().copied())
        .min()
}

pub fn read_squad_json(path: impl AsRef<Path>) -> Result<SquadState, DataError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|err| DataError::Json {
        path: path.display().to_string(),
        detail: err.to_string(),
    })
}

pub fn write_solutions_json(
    path: impl AsRef<Path>,
    solutions: &[Solution],
) -> Result<(), DataError> {
    let path = path.as_ref();
    let io_error = |source| DataError::Io {
        path: path.display().to_string(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    serde_json::to_writer_pretty(BufWriter::new(file), solutions).map_err(|err| DataError::Json {
        path: path.display().to_string(),
        detail: err.to_string(),
    })
}
