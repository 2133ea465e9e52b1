//! `fieldsync zones` - inspect a zone file.

use super::{load_zones, CliResult};
use std::path::PathBuf;

pub fn run(zones: Option<PathBuf>) -> CliResult {
    let zones = load_zones(zones)?;

    println!("{} zone(s)", zones.len());
    for zone in &zones {
        let (lat, lon) = zone.centroid();
        println!(
            "  {:>4}  {:<12} {} vertices, centroid ({lat:.6}, {lon:.6})",
            zone.id,
            zone.code,
            zone.ring().len()
        );
    }
    Ok(())
}
