//! Error types for geometry and validation.

use thiserror::Error;

/// Result type for geo operations.
pub type GeoResult<T> = Result<T, GeoError>;

/// Errors that can occur during geometry construction or validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    /// Latitude outside [-90, 90].
    #[error("latitude out of range: {0}")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180].
    #[error("longitude out of range: {0}")]
    InvalidLongitude(f64),

    /// A coordinate was NaN or infinite.
    #[error("coordinate is not finite")]
    NonFiniteCoordinate,

    /// Reported GPS accuracy was negative or not finite.
    #[error("invalid reported accuracy: {0}")]
    InvalidAccuracy(f64),

    /// A polygon ring with fewer than three distinct vertices.
    #[error("degenerate polygon ring with {vertices} distinct vertices")]
    DegenerateRing {
        /// Number of distinct vertices supplied.
        vertices: usize,
    },

    /// Validation was requested with no candidate zones.
    #[error("no candidate zones to validate against")]
    NoCandidateZones,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            GeoError::InvalidLatitude(91.0).to_string(),
            "latitude out of range: 91"
        );
        assert_eq!(
            GeoError::DegenerateRing { vertices: 2 }.to_string(),
            "degenerate polygon ring with 2 distinct vertices"
        );
    }
}
