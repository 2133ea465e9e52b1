//! Benchmark utilities for Fieldsync.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use fieldsync_geo::ZonePolygon;

/// Generates a grid of square zones spanning out from the canonical one.
pub fn zone_grid(count: usize) -> Vec<ZonePolygon> {
    (0..count)
        .map(|i| {
            let lat0 = 31.900 + (i / 10) as f64 * 0.012;
            let lon0 = 35.200 + (i % 10) as f64 * 0.012;
            ZonePolygon::new(
                i as u64 + 1,
                format!("GRID-{i}"),
                vec![
                    (lat0, lon0),
                    (lat0, lon0 + 0.010),
                    (lat0 + 0.010, lon0 + 0.010),
                    (lat0 + 0.010, lon0),
                ],
            )
            .expect("grid ring is valid")
        })
        .collect()
}
