//! CLI command implementations.

pub mod serve;
pub mod validate;
pub mod zones;

use fieldsync_geo::ZonePolygon;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult = Result<(), CliError>;

/// Errors surfaced to the terminal.
#[derive(Error, Debug)]
pub enum CliError {
    /// No zone file was given for a command that needs one.
    #[error("a zone file is required; pass --zones <path>")]
    MissingZoneFile,

    /// The zone file could not be read.
    #[error("failed to read zone file: {0}")]
    Io(#[from] std::io::Error),

    /// The zone file was not valid JSON.
    #[error("failed to parse zone file: {0}")]
    Json(#[from] serde_json::Error),

    /// A ring in the zone file was not a valid polygon.
    #[error("zone {code}: {source}")]
    BadZone {
        /// Code of the offending zone.
        code: String,
        /// Underlying geometry error.
        source: fieldsync_geo::GeoError,
    },

    /// The bind address could not be parsed.
    #[error("invalid bind address: {0}")]
    BadBindAddr(String),

    /// The server failed.
    #[error(transparent)]
    Server(#[from] fieldsync_server::ServerError),

    /// Geometry failure during validation.
    #[error(transparent)]
    Geo(#[from] fieldsync_geo::GeoError),
}

#[derive(Debug, Deserialize)]
struct ZoneFileEntry {
    id: u64,
    code: String,
    ring: Vec<(f64, f64)>,
}

/// Loads and validates a zone file.
pub fn load_zones(path: Option<PathBuf>) -> Result<Vec<ZonePolygon>, CliError> {
    let path = path.ok_or(CliError::MissingZoneFile)?;
    read_zone_file(&path)
}

fn read_zone_file(path: &Path) -> Result<Vec<ZonePolygon>, CliError> {
    let raw = std::fs::read_to_string(path)?;
    let entries: Vec<ZoneFileEntry> = serde_json::from_str(&raw)?;
    entries
        .into_iter()
        .map(|entry| {
            ZonePolygon::new(entry.id, entry.code.clone(), entry.ring).map_err(|source| {
                CliError::BadZone {
                    code: entry.code,
                    source,
                }
            })
        })
        .collect()
}
