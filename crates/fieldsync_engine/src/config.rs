//! Engine configuration.

use fieldsync_geo::GeofenceThresholds;
use std::time::Duration;

/// Configuration for the sync coordinator.
///
/// Geofence thresholds are deployment configuration passed through to
/// the geofence engine on every validation; nothing here is consulted as
/// a hardcoded constant.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Distance thresholds for geofence classification.
    pub thresholds: GeofenceThresholds,
    /// Client clock skew beyond which a diagnostic warning is logged.
    pub clock_skew_warn: Duration,
}

impl EngineConfig {
    /// Creates a configuration with the given thresholds.
    pub fn new(thresholds: GeofenceThresholds) -> Self {
        Self {
            thresholds,
            ..Self::default()
        }
    }

    /// Sets the geofence thresholds.
    pub fn with_thresholds(mut self, thresholds: GeofenceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Sets the clock-skew warning threshold.
    pub fn with_clock_skew_warn(mut self, threshold: Duration) -> Self {
        self.clock_skew_warn = threshold;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: GeofenceThresholds::default(),
            clock_skew_warn: Duration::from_secs(120),
        }
    }
}
