//! Server-side versioned entity records.
//!
//! Entities are kept in an arena keyed by integer id; relations are
//! explicit foreign-key fields resolved through the persistence
//! collaborator, never live object links. `server_version` increments
//! exactly once per accepted mutation and never decreases;
//! `client_version` mirrors the highest client version applied for the
//! originating change stream and drives replay/conflict detection.

use crate::status::{AttendanceApproval, IssueSeverity, IssueStatus, TaskStatus};
use chrono::{DateTime, Utc};
use fieldsync_geo::GeoPoint;
use serde::{Deserialize, Serialize};

/// An assigned field task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Arena key.
    pub id: u64,
    /// Worker the task is assigned to.
    pub worker_id: u64,
    /// Zone the work must happen in, if location-bound.
    pub zone_id: Option<u64>,
    /// Short description shown to the worker.
    pub title: String,
    /// Lifecycle state.
    pub status: TaskStatus,
    /// Worker-authored completion notes.
    pub completion_notes: Option<String>,
    /// Opaque references to uploaded completion photos.
    pub photo_refs: Vec<String>,
    /// Location the worker reported at completion.
    pub reported_location: Option<GeoPoint>,
    /// When the worker marked the task complete.
    pub completed_at: Option<DateTime<Utc>>,
    /// Completed outside the warning distance; flagged for supervisors.
    pub needs_review: bool,
    /// Rejected automatically on distance (appealable).
    pub auto_rejected: bool,
    /// Why the automatic rejection happened.
    pub rejection_reason: Option<String>,
    /// Distance from the zone at the rejected submission, in meters.
    pub rejection_distance_meters: Option<f64>,
    /// Client correlation key that created or last claimed this record.
    pub client_id: Option<String>,
    /// Highest client version applied.
    pub client_version: u32,
    /// Server version, +1 per accepted mutation.
    pub server_version: u32,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Marks an accepted mutation: bumps the server version and stamps
    /// the update time.
    pub fn record_mutation(&mut self, now: DateTime<Utc>) {
        self.server_version += 1;
        self.updated_at = now;
    }
}

/// An attendance check-in/check-out record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Arena key.
    pub id: u64,
    /// Worker who checked in.
    pub worker_id: u64,
    /// Zone the check-in validated against, if any.
    pub zone_id: Option<u64>,
    /// When the worker checked in (event time, not sync time).
    pub check_in_at: DateTime<Utc>,
    /// When the worker checked out, once known.
    pub check_out_at: Option<DateTime<Utc>>,
    /// Reported check-in location.
    pub check_in_location: Option<GeoPoint>,
    /// Reported check-out location.
    pub check_out_location: Option<GeoPoint>,
    /// Approval state.
    pub approval: AttendanceApproval,
    /// Entered through the manual fallback path.
    pub is_manual: bool,
    /// Worker's reason for a manual entry.
    pub manual_reason: Option<String>,
    /// Validated but borderline; flagged for supervisors.
    pub needs_review: bool,
    /// Human-readable validation detail.
    pub validation_message: Option<String>,
    /// Client correlation key.
    pub client_id: Option<String>,
    /// Highest client version applied.
    pub client_version: u32,
    /// Server version, +1 per accepted mutation.
    pub server_version: u32,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Marks an accepted mutation.
    pub fn record_mutation(&mut self, now: DateTime<Utc>) {
        self.server_version += 1;
        self.updated_at = now;
    }
}

/// A worker-reported issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Arena key.
    pub id: u64,
    /// Worker who reported the issue.
    pub worker_id: u64,
    /// Short summary.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Free-form category, e.g. `"sanitation"`.
    pub category: String,
    /// Reported severity.
    pub severity: IssueSeverity,
    /// Lifecycle state.
    pub status: IssueStatus,
    /// Where the issue was observed.
    pub location: Option<GeoPoint>,
    /// Opaque references to uploaded photos.
    pub photo_refs: Vec<String>,
    /// Client correlation key.
    pub client_id: Option<String>,
    /// Highest client version applied.
    pub client_version: u32,
    /// Server version, +1 per accepted mutation.
    pub server_version: u32,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl IssueRecord {
    /// Marks an accepted mutation.
    pub fn record_mutation(&mut self, now: DateTime<Utc>) {
        self.server_version += 1;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_task() -> TaskRecord {
        TaskRecord {
            id: 1,
            worker_id: 10,
            zone_id: Some(3),
            title: "Inspect drainage".into(),
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
            updated_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn mutation_bumps_version_once() {
        let mut task = sample_task();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        task.record_mutation(now);
        assert_eq!(task.server_version, 2);
        assert_eq!(task.updated_at, now);
    }

    #[test]
    fn task_roundtrips_through_json() {
        let task = sample_task();
        let json = serde_json::to_string(&task).unwrap();
        let back: TaskRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(task, back);
    }
}
