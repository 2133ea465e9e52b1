//! Geofence classification engine.

use crate::error::{GeoError, GeoResult};
use crate::point::GeoPoint;
use crate::polygon::ZonePolygon;
use serde::{Deserialize, Serialize};

/// Classification of a reported location against candidate zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Inside a zone, or close enough that no review is needed.
    Accepted,
    /// Recorded, but flagged for supervisor review.
    AcceptedWithWarning,
    /// Too far from every candidate zone.
    Rejected,
}

/// Outcome of a geofence validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// The classification decision.
    pub decision: Decision,
    /// Zone that contained the point, if any.
    pub matched_zone_id: Option<u64>,
    /// Distance to the nearest zone anchor in meters; 0 when contained.
    pub distance_meters: f64,
    /// Accepted on distance rather than containment. Internal flag, not
    /// surfaced to workers as a warning.
    #[serde(skip)]
    pub borderline: bool,
}

impl ValidationOutcome {
    /// Outcome for a point contained in a zone.
    pub fn contained(zone_id: u64) -> Self {
        Self {
            decision: Decision::Accepted,
            matched_zone_id: Some(zone_id),
            distance_meters: 0.0,
            borderline: false,
        }
    }

    /// Returns true if the action may proceed (with or without a warning).
    pub fn is_accepted(&self) -> bool {
        matches!(
            self.decision,
            Decision::Accepted | Decision::AcceptedWithWarning
        )
    }
}

/// Distance thresholds for geofence classification.
///
/// These are deployment configuration, not engine constants: the engine
/// takes them as a parameter on every call. The defaults mirror the
/// original municipal deployment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceThresholds {
    /// Buffer tolerance for containment, in degrees (~30m by default).
    pub tolerance_degrees: f64,
    /// Distance at or below which a non-contained point is still accepted
    /// outright; above it the action is flagged for review.
    pub warning_meters: f64,
    /// Distance above which the action is rejected.
    pub hard_reject_meters: f64,
    /// Reported GPS accuracy above this ceiling no longer relaxes the
    /// thresholds.
    pub accuracy_ceiling_meters: f64,
}

impl GeofenceThresholds {
    /// Creates thresholds with the given warning and hard-reject distances.
    pub fn new(warning_meters: f64, hard_reject_meters: f64) -> Self {
        Self {
            warning_meters,
            hard_reject_meters,
            ..Self::default()
        }
    }

    /// Sets the containment buffer tolerance in degrees.
    pub fn with_tolerance_degrees(mut self, degrees: f64) -> Self {
        self.tolerance_degrees = degrees;
        self
    }

    /// Sets the accuracy sanity ceiling in meters.
    pub fn with_accuracy_ceiling(mut self, meters: f64) -> Self {
        self.accuracy_ceiling_meters = meters;
        self
    }
}

impl Default for GeofenceThresholds {
    fn default() -> Self {
        Self {
            tolerance_degrees: 0.0003,
            warning_meters: 100.0,
            hard_reject_meters: 500.0,
            accuracy_ceiling_meters: 150.0,
        }
    }
}

/// Pure geofence decision procedure.
///
/// Containment is tested first (with buffer tolerance); points contained
/// in no zone are classified by haversine distance to the nearest zone
/// anchor. When a point lies within tolerance of two overlapping zones,
/// the containing zone with the lowest id wins; candidates are always
/// evaluated in ascending id order so the tie-break is stable.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeofenceEngine;

impl GeofenceEngine {
    /// Creates the engine. The engine is stateless; this exists for
    /// symmetry with the other components.
    pub fn new() -> Self {
        Self
    }

    /// Classifies `point` against `candidates` using `thresholds`.
    ///
    /// Fails on malformed coordinates or an empty candidate set; every
    /// other input produces a deterministic `ValidationOutcome`.
    pub fn validate(
        &self,
        point: &GeoPoint,
        candidates: &[ZonePolygon],
        thresholds: &GeofenceThresholds,
    ) -> GeoResult<ValidationOutcome> {
        point.validate()?;
        if candidates.is_empty() {
            return Err(GeoError::NoCandidateZones);
        }

        let mut ordered: Vec<&ZonePolygon> = candidates.iter().collect();
        ordered.sort_by_key(|z| z.id);

        for zone in &ordered {
            if zone.contains_with_tolerance(point, thresholds.tolerance_degrees) {
                return Ok(ValidationOutcome::contained(zone.id));
            }
        }

        let (nearest_id, distance) = ordered
            .iter()
            .map(|z| (z.id, z.nearest_vertex_distance_meters(point)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, f64::INFINITY));

        let (warning, hard_reject) = effective_thresholds(point, thresholds);

        let outcome = if distance <= warning {
            ValidationOutcome {
                decision: Decision::Accepted,
                matched_zone_id: Some(nearest_id),
                distance_meters: distance,
                borderline: true,
            }
        } else if distance <= hard_reject {
            ValidationOutcome {
                decision: Decision::AcceptedWithWarning,
                matched_zone_id: Some(nearest_id),
                distance_meters: distance,
                borderline: false,
            }
        } else {
            ValidationOutcome {
                decision: Decision::Rejected,
                matched_zone_id: None,
                distance_meters: distance,
                borderline: false,
            }
        };
        Ok(outcome)
    }
}

/// Relaxes the thresholds by the reported GPS accuracy.
///
/// Accuracy above the sanity ceiling gets no relaxation at all, so a
/// device reporting kilometer-scale uncertainty is still bounded by the
/// unmodified hard-reject distance.
fn effective_thresholds(point: &GeoPoint, thresholds: &GeofenceThresholds) -> (f64, f64) {
    match point.accuracy_meters {
        Some(acc) if acc <= thresholds.accuracy_ceiling_meters => (
            thresholds.warning_meters + acc,
            thresholds.hard_reject_meters + acc,
        ),
        _ => (thresholds.warning_meters, thresholds.hard_reject_meters),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::METERS_PER_DEGREE_LATITUDE;

    fn unit_square(id: u64) -> ZonePolygon {
        ZonePolygon::new(
            id,
            format!("SQ-{id}"),
            vec![
                (31.900, 35.200),
                (31.900, 35.210),
                (31.910, 35.210),
                (31.910, 35.200),
            ],
        )
        .unwrap()
    }

    fn south_of_corner(meters: f64) -> GeoPoint {
        GeoPoint::new(31.900 - meters / METERS_PER_DEGREE_LATITUDE, 35.200)
    }

    #[test]
    fn contained_point_accepted_at_zero_distance() {
        let engine = GeofenceEngine::new();
        let outcome = engine
            .validate(
                &GeoPoint::new(31.905, 35.205),
                &[unit_square(1)],
                &GeofenceThresholds::default(),
            )
            .unwrap();
        assert_eq!(outcome.decision, Decision::Accepted);
        assert_eq!(outcome.matched_zone_id, Some(1));
        assert_eq!(outcome.distance_meters, 0.0);
        assert!(!outcome.borderline);
    }

    #[test]
    fn borderline_point_accepted_silently() {
        let engine = GeofenceEngine::new();
        let outcome = engine
            .validate(
                &south_of_corner(80.0),
                &[unit_square(1)],
                &GeofenceThresholds::new(100.0, 500.0),
            )
            .unwrap();
        assert_eq!(outcome.decision, Decision::Accepted);
        assert!(outcome.borderline);
        assert!(outcome.distance_meters > 0.0);
    }

    #[test]
    fn warning_band_point_flagged() {
        let engine = GeofenceEngine::new();
        let outcome = engine
            .validate(
                &south_of_corner(150.0),
                &[unit_square(1)],
                &GeofenceThresholds::new(100.0, 500.0),
            )
            .unwrap();
        assert_eq!(outcome.decision, Decision::AcceptedWithWarning);
        assert!((outcome.distance_meters - 150.0).abs() < 1.0);
    }

    #[test]
    fn far_point_rejected() {
        let engine = GeofenceEngine::new();
        let outcome = engine
            .validate(
                &south_of_corner(600.0),
                &[unit_square(1)],
                &GeofenceThresholds::new(100.0, 500.0),
            )
            .unwrap();
        assert_eq!(outcome.decision, Decision::Rejected);
        assert_eq!(outcome.matched_zone_id, None);
    }

    #[test]
    fn reported_accuracy_relaxes_thresholds() {
        let engine = GeofenceEngine::new();
        let mut point = south_of_corner(550.0);
        point.accuracy_meters = Some(100.0);

        let outcome = engine
            .validate(&point, &[unit_square(1)], &GeofenceThresholds::new(100.0, 500.0))
            .unwrap();
        assert_eq!(outcome.decision, Decision::AcceptedWithWarning);
    }

    #[test]
    fn accuracy_beyond_ceiling_gets_no_relaxation() {
        let engine = GeofenceEngine::new();
        let mut point = south_of_corner(550.0);
        point.accuracy_meters = Some(5_000.0);

        let outcome = engine
            .validate(&point, &[unit_square(1)], &GeofenceThresholds::new(100.0, 500.0))
            .unwrap();
        assert_eq!(outcome.decision, Decision::Rejected);
    }

    #[test]
    fn overlapping_zones_tie_break_by_id() {
        let engine = GeofenceEngine::new();
        // Identical geometry registered under two ids, in reverse order.
        let zones = vec![unit_square(7), unit_square(3)];
        let outcome = engine
            .validate(
                &GeoPoint::new(31.905, 35.205),
                &zones,
                &GeofenceThresholds::default(),
            )
            .unwrap();
        assert_eq!(outcome.matched_zone_id, Some(3));
    }

    #[test]
    fn no_candidates_is_an_error() {
        let engine = GeofenceEngine::new();
        let result = engine.validate(
            &GeoPoint::new(31.905, 35.205),
            &[],
            &GeofenceThresholds::default(),
        );
        assert_eq!(result.unwrap_err(), GeoError::NoCandidateZones);
    }

    #[test]
    fn identical_inputs_identical_outcomes() {
        let engine = GeofenceEngine::new();
        let zones = [unit_square(1), unit_square(2)];
        let point = south_of_corner(220.0);
        let thresholds = GeofenceThresholds::default();

        let a = engine.validate(&point, &zones, &thresholds).unwrap();
        let b = engine.validate(&point, &zones, &thresholds).unwrap();
        assert_eq!(a, b);
    }
}
