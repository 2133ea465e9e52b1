//! Geographic points and great-circle distance.

use crate::error::{GeoError, GeoResult};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, matching the constant used by the mobile
/// clients so server and client agree on computed distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Meters spanned by one degree of latitude.
pub const METERS_PER_DEGREE_LATITUDE: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;

/// A reported GPS position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Caller-reported GPS uncertainty in meters, if the device provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_meters: Option<f64>,
}

impl GeoPoint {
    /// Creates a point without reported accuracy.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters: None,
        }
    }

    /// Creates a point with reported GPS accuracy.
    pub fn with_accuracy(latitude: f64, longitude: f64, accuracy_meters: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters: Some(accuracy_meters),
        }
    }

    /// Checks that the coordinates are finite and within WGS84 bounds.
    pub fn validate(&self) -> GeoResult<()> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(GeoError::NonFiniteCoordinate);
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GeoError::InvalidLatitude(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GeoError::InvalidLongitude(self.longitude));
        }
        if let Some(acc) = self.accuracy_meters {
            if !acc.is_finite() || acc < 0.0 {
                return Err(GeoError::InvalidAccuracy(acc));
            }
        }
        Ok(())
    }

    /// Great-circle distance to another point in meters.
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        haversine_meters(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Haversine great-circle distance between two coordinates, in meters.
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + (d_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance() {
        let p = GeoPoint::new(31.905, 35.205);
        assert_eq!(p.distance_meters(&p), 0.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_meters(31.0, 35.0, 32.0, 35.0);
        assert!((d - METERS_PER_DEGREE_LATITUDE).abs() < 1.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(31.9, 35.2);
        let b = GeoPoint::new(31.95, 35.25);
        assert_eq!(a.distance_meters(&b), b.distance_meters(&a));
    }

    #[test]
    fn validate_rejects_out_of_range() {
        assert!(GeoPoint::new(91.0, 0.0).validate().is_err());
        assert!(GeoPoint::new(0.0, 181.0).validate().is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).validate().is_err());
        assert!(GeoPoint::with_accuracy(0.0, 0.0, -5.0).validate().is_err());
        assert!(GeoPoint::new(31.905, 35.205).validate().is_ok());
    }

    #[test]
    fn accuracy_roundtrips_through_json() {
        let p = GeoPoint::with_accuracy(31.9, 35.2, 12.5);
        let json = serde_json::to_string(&p).unwrap();
        let back: GeoPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);

        // Absent accuracy stays absent rather than serializing as null.
        let p = GeoPoint::new(31.9, 35.2);
        let json = serde_json::to_string(&p).unwrap();
        assert!(!json.contains("accuracy"));
    }
}
