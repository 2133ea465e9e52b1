//! Projection functions from stored records to response views.
//!
//! Each projection is an explicit pure function from one stored record to
//! its response shape. Workflow provenance that only matters server-side
//! (client correlation keys, applied client versions) never leaves
//! through a view.

use crate::appeal::Appeal;
use crate::entity::{AttendanceRecord, IssueRecord, TaskRecord};
use crate::status::{AppealStatus, AttendanceApproval, IssueSeverity, IssueStatus, TaskStatus};
use chrono::{DateTime, Utc};
use fieldsync_geo::GeoPoint;
use serde::{Deserialize, Serialize};

/// Task as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    /// Server identity.
    pub id: u64,
    /// Assigned worker.
    pub worker_id: u64,
    /// Bound zone, if any.
    pub zone_id: Option<u64>,
    /// Title.
    pub title: String,
    /// Lifecycle state.
    pub status: TaskStatus,
    /// Completion notes.
    pub completion_notes: Option<String>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
    /// Flagged for supervisor review.
    pub needs_review: bool,
    /// Rejected automatically on distance.
    pub auto_rejected: bool,
    /// Rejection reason, when auto-rejected.
    pub rejection_reason: Option<String>,
    /// Server version for the client's next edit.
    pub server_version: u32,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

/// Projects a stored task to its response view.
pub fn project_task(record: &TaskRecord) -> TaskView {
    TaskView {
        id: record.id,
        worker_id: record.worker_id,
        zone_id: record.zone_id,
        title: record.title.clone(),
        status: record.status,
        completion_notes: record.completion_notes.clone(),
        completed_at: record.completed_at,
        needs_review: record.needs_review,
        auto_rejected: record.auto_rejected,
        rejection_reason: record.rejection_reason.clone(),
        server_version: record.server_version,
        updated_at: record.updated_at,
    }
}

/// Attendance record as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceView {
    /// Server identity.
    pub id: u64,
    /// Worker.
    pub worker_id: u64,
    /// Validated zone, if any.
    pub zone_id: Option<u64>,
    /// Check-in event time.
    pub check_in_at: DateTime<Utc>,
    /// Check-out event time, once known.
    pub check_out_at: Option<DateTime<Utc>>,
    /// Approval state.
    pub approval: AttendanceApproval,
    /// Entered through the manual fallback.
    pub is_manual: bool,
    /// Validation detail.
    pub validation_message: Option<String>,
    /// Server version.
    pub server_version: u32,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

/// Projects a stored attendance record to its response view.
pub fn project_attendance(record: &AttendanceRecord) -> AttendanceView {
    AttendanceView {
        id: record.id,
        worker_id: record.worker_id,
        zone_id: record.zone_id,
        check_in_at: record.check_in_at,
        check_out_at: record.check_out_at,
        approval: record.approval,
        is_manual: record.is_manual,
        validation_message: record.validation_message.clone(),
        server_version: record.server_version,
        updated_at: record.updated_at,
    }
}

/// Issue as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueView {
    /// Server identity.
    pub id: u64,
    /// Reporting worker.
    pub worker_id: u64,
    /// Title.
    pub title: String,
    /// Category.
    pub category: String,
    /// Severity.
    pub severity: IssueSeverity,
    /// Lifecycle state.
    pub status: IssueStatus,
    /// Observed location.
    pub location: Option<GeoPoint>,
    /// Server version.
    pub server_version: u32,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

/// Projects a stored issue to its response view.
pub fn project_issue(record: &IssueRecord) -> IssueView {
    IssueView {
        id: record.id,
        worker_id: record.worker_id,
        title: record.title.clone(),
        category: record.category.clone(),
        severity: record.severity,
        status: record.status,
        location: record.location,
        server_version: record.server_version,
        updated_at: record.updated_at,
    }
}

/// Appeal as shown to workers and supervisors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppealView {
    /// Server identity.
    pub id: u64,
    /// Appealed entity id.
    pub entity_id: u64,
    /// Review state.
    pub status: AppealStatus,
    /// Worker's explanation.
    pub explanation: String,
    /// Distance recorded at rejection.
    pub distance_meters: Option<f64>,
    /// Supervisor's response, once reviewed.
    pub review_notes: Option<String>,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
    /// Review time.
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Projects a stored appeal to its response view.
pub fn project_appeal(appeal: &Appeal) -> AppealView {
    AppealView {
        id: appeal.id,
        entity_id: appeal.target.entity_id,
        status: appeal.status,
        explanation: appeal.explanation.clone(),
        distance_meters: appeal.distance_meters,
        review_notes: appeal.review_notes.clone(),
        submitted_at: appeal.submitted_at,
        reviewed_at: appeal.reviewed_at,
    }
}

/// Server-authoritative changes downloaded after an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerChanges {
    /// Server time at projection.
    pub server_time: DateTime<Utc>,
    /// Tasks modified since the requested instant.
    pub tasks: Vec<TaskView>,
    /// Attendance records modified since the requested instant.
    pub attendance: Vec<AttendanceView>,
    /// Issues modified since the requested instant.
    pub issues: Vec<IssueView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn task_projection_drops_sync_provenance() {
        let record = TaskRecord {
            id: 5,
            worker_id: 9,
            zone_id: Some(2),
            title: "Sweep block 4".into(),
            status: TaskStatus::Completed,
            completion_notes: Some("done".into()),
            photo_refs: vec!["p/1.jpg".into()],
            reported_location: Some(GeoPoint::new(31.905, 35.205)),
            completed_at: Some(Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap()),
            needs_review: true,
            auto_rejected: false,
            rejection_reason: None,
            rejection_distance_meters: None,
            client_id: Some("dev1-task-5".into()),
            client_version: 2,
            server_version: 3,
            updated_at: Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 5).unwrap(),
        };

        let view = project_task(&record);
        assert_eq!(view.id, 5);
        assert_eq!(view.status, TaskStatus::Completed);
        assert_eq!(view.server_version, 3);
        assert!(view.needs_review);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("client_id").is_none());
        assert!(json.get("client_version").is_none());
    }
}
