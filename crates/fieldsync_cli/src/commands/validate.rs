//! `fieldsync validate` - classify a point against a zone file.

use super::{load_zones, CliResult};
use fieldsync_geo::{GeoPoint, GeofenceEngine, GeofenceThresholds};
use std::path::PathBuf;

pub fn run(
    zones: Option<PathBuf>,
    lat: f64,
    lon: f64,
    accuracy: Option<f64>,
    warning_meters: f64,
    hard_reject_meters: f64,
) -> CliResult {
    let zones = load_zones(zones)?;

    let point = match accuracy {
        Some(accuracy) => GeoPoint::with_accuracy(lat, lon, accuracy),
        None => GeoPoint::new(lat, lon),
    };
    let thresholds = GeofenceThresholds::new(warning_meters, hard_reject_meters);

    let outcome = GeofenceEngine::new().validate(&point, &zones, &thresholds)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&outcome).unwrap_or_else(|_| "{}".into())
    );
    Ok(())
}
