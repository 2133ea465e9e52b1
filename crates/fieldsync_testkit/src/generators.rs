//! Property-based test generators using proptest.
//!
//! Strategies generate data that maintains the model's invariants so
//! properties exercise reconciliation logic, not input validation.

use chrono::{TimeZone, Utc};
use fieldsync_geo::GeoPoint;
use fieldsync_model::{ChangePayload, ChangeRecord, IssueChange, IssueSeverity};
use proptest::prelude::*;

/// Strategy for valid WGS84 points, optionally with reported accuracy.
pub fn geo_point_strategy() -> impl Strategy<Value = GeoPoint> {
    (
        -85.0f64..85.0,
        -175.0f64..175.0,
        prop::option::of(0.0f64..300.0),
    )
        .prop_map(|(latitude, longitude, accuracy_meters)| GeoPoint {
            latitude,
            longitude,
            accuracy_meters,
        })
}

/// Strategy for points inside the canonical unit-square zone.
pub fn point_in_square_strategy() -> impl Strategy<Value = GeoPoint> {
    (31.901f64..31.909, 35.201f64..35.209).prop_map(|(lat, lon)| GeoPoint::new(lat, lon))
}

/// Strategy for client correlation keys.
pub fn client_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("dev[0-9]{1,2}-[a-z]{3,8}-[0-9]{1,4}").expect("valid regex")
}

/// Strategy for `(stored, incoming)` client version pairs covering
/// stale, equal, forward, and gapped submissions.
pub fn version_pair_strategy() -> impl Strategy<Value = (u32, u32)> {
    (0u32..20).prop_flat_map(|stored| (Just(stored), 0u32..(stored + 5)))
}

/// Strategy for issue severities.
pub fn severity_strategy() -> impl Strategy<Value = IssueSeverity> {
    prop_oneof![
        Just(IssueSeverity::Low),
        Just(IssueSeverity::Medium),
        Just(IssueSeverity::High),
        Just(IssueSeverity::Critical),
    ]
}

/// Strategy for issue-report change records with fresh client ids.
pub fn issue_record_strategy() -> impl Strategy<Value = ChangeRecord> {
    (
        client_id_strategy(),
        "[a-zA-Z ]{4,40}",
        severity_strategy(),
        prop::option::of(point_in_square_strategy()),
    )
        .prop_map(|(client_id, title, severity, location)| ChangeRecord {
            client_id,
            server_id: None,
            client_version: 0,
            client_timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
            payload: ChangePayload::Issue(IssueChange {
                title,
                description: "generated".into(),
                category: "general".into(),
                severity,
                location,
                photo_refs: Vec::new(),
            }),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_points_validate(point in geo_point_strategy()) {
            prop_assert!(point.validate().is_ok());
        }

        #[test]
        fn generated_issue_records_validate(record in issue_record_strategy()) {
            prop_assert!(record.validate().is_ok());
        }

        #[test]
        fn version_pairs_cover_gaps(pair in version_pair_strategy()) {
            let (stored, incoming) = pair;
            prop_assert!(incoming < stored + 5);
        }
    }
}
