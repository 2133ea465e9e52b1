//! Authorization zone polygons.

use crate::error::{GeoError, GeoResult};
use crate::point::{haversine_meters, GeoPoint};
use serde::{Deserialize, Serialize};

/// An authorized zone: an immutable closed ring of `(lat, lon)` vertices.
///
/// The ring is stored open (no repeated closing vertex); an explicit
/// closing vertex in the input is stripped during construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonePolygon {
    /// Stable zone identifier; also the tie-break order for containment.
    pub id: u64,
    /// Human-assigned zone code, e.g. `"ZONE-014"`.
    pub code: String,
    /// Ordered ring of `(latitude, longitude)` vertices.
    ring: Vec<(f64, f64)>,
}

impl ZonePolygon {
    /// Builds a zone from an ordered vertex ring.
    ///
    /// Accepts both open and explicitly-closed rings. Fails on rings with
    /// fewer than three distinct vertices or non-finite coordinates.
    pub fn new(id: u64, code: impl Into<String>, ring: Vec<(f64, f64)>) -> GeoResult<Self> {
        let mut ring = ring;
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            return Err(GeoError::DegenerateRing {
                vertices: ring.len(),
            });
        }
        for &(lat, lon) in &ring {
            if !lat.is_finite() || !lon.is_finite() {
                return Err(GeoError::NonFiniteCoordinate);
            }
            if !(-90.0..=90.0).contains(&lat) {
                return Err(GeoError::InvalidLatitude(lat));
            }
            if !(-180.0..=180.0).contains(&lon) {
                return Err(GeoError::InvalidLongitude(lon));
            }
        }
        Ok(Self {
            id,
            code: code.into(),
            ring,
        })
    }

    /// The vertex ring, open form.
    pub fn ring(&self) -> &[(f64, f64)] {
        &self.ring
    }

    /// Vertex-average centroid as `(lat, lon)`.
    ///
    /// Used as the anchor for nudge direction and as a distance fallback;
    /// adequate for the small, roughly-convex municipal blocks this system
    /// manages.
    pub fn centroid(&self) -> (f64, f64) {
        let n = self.ring.len() as f64;
        let (lat_sum, lon_sum) = self
            .ring
            .iter()
            .fold((0.0, 0.0), |(la, lo), &(lat, lon)| (la + lat, lo + lon));
        (lat_sum / n, lon_sum / n)
    }

    /// Ray-casting containment test for a raw coordinate.
    ///
    /// Casts a ray in the +longitude direction and counts edge crossings.
    /// Points exactly on an edge may land on either side; the caller's
    /// buffer tolerance absorbs that boundary noise.
    pub fn contains_coordinate(&self, lat: f64, lon: f64) -> bool {
        let mut inside = false;
        let n = self.ring.len();
        let mut j = n - 1;
        for i in 0..n {
            let (lat_i, lon_i) = self.ring[i];
            let (lat_j, lon_j) = self.ring[j];
            if ((lat_i > lat) != (lat_j > lat))
                && lon < (lon_j - lon_i) * (lat - lat_i) / (lat_j - lat_i) + lon_i
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Containment test for a point.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.contains_coordinate(point.latitude, point.longitude)
    }

    /// Containment with a buffer tolerance in degrees.
    ///
    /// A point that fails the exact test is re-tested after being nudged
    /// `tolerance_degrees` toward the polygon centroid, so a genuinely
    /// inside point perturbed across the boundary by GPS noise is still
    /// accepted. The nudge never widens rejection for points far outside.
    pub fn contains_with_tolerance(&self, point: &GeoPoint, tolerance_degrees: f64) -> bool {
        if self.contains(point) {
            return true;
        }
        if tolerance_degrees <= 0.0 {
            return false;
        }
        let (c_lat, c_lon) = self.centroid();
        let d_lat = c_lat - point.latitude;
        let d_lon = c_lon - point.longitude;
        let norm = (d_lat * d_lat + d_lon * d_lon).sqrt();
        if norm == 0.0 {
            return false;
        }
        let lat = point.latitude + d_lat / norm * tolerance_degrees;
        let lon = point.longitude + d_lon / norm * tolerance_degrees;
        self.contains_coordinate(lat, lon)
    }

    /// Haversine distance from a point to the nearest ring vertex, in meters.
    ///
    /// The nearest vertex is the zone's representative anchor for
    /// distance-based classification; it slightly overestimates the
    /// distance to the boundary, which only makes classification stricter.
    pub fn nearest_vertex_distance_meters(&self, point: &GeoPoint) -> f64 {
        self.ring
            .iter()
            .map(|&(lat, lon)| haversine_meters(point.latitude, point.longitude, lat, lon))
            .fold(f64::INFINITY, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::METERS_PER_DEGREE_LATITUDE;

    fn unit_square() -> ZonePolygon {
        ZonePolygon::new(
            1,
            "SQ-1",
            vec![
                (31.900, 35.200),
                (31.900, 35.210),
                (31.910, 35.210),
                (31.910, 35.200),
            ],
        )
        .unwrap()
    }

    #[test]
    fn closed_ring_is_normalized() {
        let open = unit_square();
        let closed = ZonePolygon::new(
            1,
            "SQ-1",
            vec![
                (31.900, 35.200),
                (31.900, 35.210),
                (31.910, 35.210),
                (31.910, 35.200),
                (31.900, 35.200),
            ],
        )
        .unwrap();
        assert_eq!(open.ring(), closed.ring());
    }

    #[test]
    fn degenerate_ring_rejected() {
        let err = ZonePolygon::new(1, "BAD", vec![(31.9, 35.2), (31.91, 35.21)]).unwrap_err();
        assert_eq!(err, GeoError::DegenerateRing { vertices: 2 });

        // Closing vertex does not count as a distinct vertex.
        let err = ZonePolygon::new(1, "BAD", vec![(31.9, 35.2), (31.91, 35.21), (31.9, 35.2)])
            .unwrap_err();
        assert_eq!(err, GeoError::DegenerateRing { vertices: 2 });
    }

    #[test]
    fn center_is_contained() {
        let zone = unit_square();
        assert!(zone.contains(&GeoPoint::new(31.905, 35.205)));
    }

    #[test]
    fn outside_is_not_contained() {
        let zone = unit_square();
        assert!(!zone.contains(&GeoPoint::new(31.895, 35.205)));
        assert!(!zone.contains(&GeoPoint::new(31.905, 35.215)));
    }

    #[test]
    fn centroid_of_square() {
        let (lat, lon) = unit_square().centroid();
        assert!((lat - 31.905).abs() < 1e-9);
        assert!((lon - 35.205).abs() < 1e-9);
    }

    #[test]
    fn tolerance_accepts_boundary_noise() {
        let zone = unit_square();
        // ~10m south of the southern edge: outside exactly, inside with
        // the ~30m buffer tolerance.
        let noisy = GeoPoint::new(31.900 - 10.0 / METERS_PER_DEGREE_LATITUDE, 35.205);
        assert!(!zone.contains(&noisy));
        assert!(zone.contains_with_tolerance(&noisy, 0.0003));
    }

    #[test]
    fn tolerance_does_not_accept_far_points() {
        let zone = unit_square();
        let far = GeoPoint::new(31.880, 35.205);
        assert!(!zone.contains_with_tolerance(&far, 0.0003));
    }

    #[test]
    fn nearest_vertex_distance() {
        let zone = unit_square();
        // 150m due south of the south-west corner.
        let p = GeoPoint::new(31.900 - 150.0 / METERS_PER_DEGREE_LATITUDE, 35.200);
        let d = zone.nearest_vertex_distance_meters(&p);
        assert!((d - 150.0).abs() < 1.0, "got {d}");
    }
}
