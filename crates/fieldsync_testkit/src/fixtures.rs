//! Zone, entity, and batch fixtures.

use chrono::{DateTime, TimeZone, Utc};
use fieldsync_geo::{GeoPoint, ZonePolygon, METERS_PER_DEGREE_LATITUDE};
use fieldsync_model::{
    AttendanceChange, ChangePayload, ChangeRecord, IssueChange, IssueSeverity, SyncBatch,
    TaskChange, TaskRecord, TaskStatus,
};
use uuid::Uuid;

/// Southern-edge latitude of the canonical test zone.
pub const SQUARE_SOUTH_LAT: f64 = 31.900;
/// Western-edge longitude of the canonical test zone.
pub const SQUARE_WEST_LON: f64 = 35.200;

/// The canonical test zone: a square roughly 1.1 km on each side with
/// corners at (31.900, 35.200) and (31.910, 35.210).
pub fn unit_square_zone(id: u64) -> ZonePolygon {
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
    .expect("fixture ring is valid")
}

/// A point well inside the canonical zone.
pub fn inside_point() -> GeoPoint {
    GeoPoint::new(31.905, 35.205)
}

/// A point the given number of meters due south of the canonical zone's
/// south-west corner, so its nearest-vertex distance is exact.
pub fn point_south_of_square(meters: f64) -> GeoPoint {
    GeoPoint::new(
        SQUARE_SOUTH_LAT - meters / METERS_PER_DEGREE_LATITUDE,
        SQUARE_WEST_LON,
    )
}

/// A fixed instant for deterministic clocks.
pub fn test_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
}

/// A fresh pending task bound to a zone, ready for insertion.
pub fn pending_task(worker_id: u64, zone_id: Option<u64>) -> TaskRecord {
    TaskRecord {
        id: 0,
        worker_id,
        zone_id,
        title: "Inspect block".into(),
        status: TaskStatus::Pending,
        completion_notes: None,
        photo_refs: Vec::new(),
        reported_location: None,
        completed_at: None,
        needs_review: false,
        auto_rejected: false,
        rejection_reason: None,
        rejection_distance_meters: None,
        client_id: None,
        client_version: 0,
        server_version: 1,
        updated_at: test_epoch(),
    }
}

/// A task-completion change record.
pub fn task_completion(
    client_id: &str,
    server_id: Option<u64>,
    client_version: u32,
    location: GeoPoint,
) -> ChangeRecord {
    ChangeRecord {
        client_id: client_id.into(),
        server_id,
        client_version,
        client_timestamp: test_epoch(),
        payload: ChangePayload::Task(TaskChange {
            status: Some(TaskStatus::Completed),
            completion_notes: Some("done".into()),
            completed_at: Some(test_epoch()),
            location: Some(location),
            ..TaskChange::default()
        }),
    }
}

/// An attendance check-in change record.
pub fn check_in(client_id: &str, location: Option<GeoPoint>) -> ChangeRecord {
    ChangeRecord {
        client_id: client_id.into(),
        server_id: None,
        client_version: 0,
        client_timestamp: test_epoch(),
        payload: ChangePayload::Attendance(AttendanceChange {
            check_in_at: test_epoch(),
            check_out_at: None,
            check_in_location: location,
            check_out_location: None,
            manual_reason: None,
        }),
    }
}

/// An issue-report change record.
pub fn issue_report(client_id: &str, title: &str) -> ChangeRecord {
    ChangeRecord {
        client_id: client_id.into(),
        server_id: None,
        client_version: 0,
        client_timestamp: test_epoch(),
        payload: ChangePayload::Issue(IssueChange {
            title: title.into(),
            description: "observed during the round".into(),
            category: "sanitation".into(),
            severity: IssueSeverity::Medium,
            location: Some(inside_point()),
            photo_refs: Vec::new(),
        }),
    }
}

/// Wraps change records into a batch from a fixed device.
pub fn batch(items: Vec<ChangeRecord>) -> SyncBatch {
    SyncBatch {
        device_id: Uuid::from_u128(0x1234_5678_9abc_def0),
        client_clock: test_epoch(),
        items,
    }
}
