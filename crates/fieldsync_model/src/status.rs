//! Lifecycle enums for synced entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of entity a change record targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Assigned field task.
    Task,
    /// Attendance check-in/check-out record.
    Attendance,
    /// Worker-reported issue.
    Issue,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Task => write!(f, "task"),
            EntityKind::Attendance => write!(f, "attendance"),
            EntityKind::Issue => write!(f, "issue"),
        }
    }
}

/// Task lifecycle.
///
/// Workflow: `Pending → InProgress → Completed → Approved | Rejected`,
/// or `Pending → Cancelled`. Completion is gated on geofence validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Assigned, not yet started.
    Pending,
    /// Worker has started the task.
    InProgress,
    /// Worker submitted completion; awaiting supervisor review.
    Completed,
    /// Withdrawn before completion.
    Cancelled,
    /// Supervisor approved the completed work.
    Approved,
    /// Rejected, either automatically on distance or by a supervisor.
    Rejected,
}

impl TaskStatus {
    /// Returns true for states that accept no further worker transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Approved | TaskStatus::Rejected | TaskStatus::Cancelled
        )
    }
}

/// Approval state of an attendance record.
///
/// Zone-validated check-ins auto-approve; manual or GPS-failed entries
/// start `Pending` and require a supervisor decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceApproval {
    /// Validated inside an authorized zone, no review needed.
    AutoApproved,
    /// Manual entry awaiting supervisor review.
    Pending,
    /// Supervisor approved a manual entry.
    Approved,
    /// Supervisor rejected the entry.
    Rejected,
}

impl AttendanceApproval {
    /// Returns true once no further approval decision is possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttendanceApproval::Pending)
    }
}

/// Issue report lifecycle. Mutated by supervisors outside the sync path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// Newly reported by a worker.
    Reported,
    /// A supervisor is looking into it.
    UnderReview,
    /// Fixed or otherwise addressed.
    Resolved,
    /// Closed without action.
    Dismissed,
}

/// Reported severity of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// Cosmetic or minor.
    Low,
    /// Needs attention soon.
    Medium,
    /// Significant impact.
    High,
    /// Safety hazard or outage.
    Critical,
}

/// Status of an appeal against an automatic rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealStatus {
    /// Submitted, awaiting supervisor review.
    Pending,
    /// Approved; the referenced entity was reinstated.
    Approved,
    /// Rejected; the original rejection stands.
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_task_states() {
        assert!(TaskStatus::Approved.is_terminal());
        assert!(TaskStatus::Rejected.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
        assert!(!TaskStatus::Completed.is_terminal());
    }

    #[test]
    fn terminal_approval_states() {
        assert!(AttendanceApproval::AutoApproved.is_terminal());
        assert!(AttendanceApproval::Approved.is_terminal());
        assert!(AttendanceApproval::Rejected.is_terminal());
        assert!(!AttendanceApproval::Pending.is_terminal());
    }

    #[test]
    fn kinds_render_lowercase() {
        assert_eq!(EntityKind::Task.to_string(), "task");
        assert_eq!(EntityKind::Attendance.to_string(), "attendance");
        assert_eq!(EntityKind::Issue.to_string(), "issue");
    }

    #[test]
    fn statuses_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::to_string(&AttendanceApproval::AutoApproved).unwrap(),
            "\"auto_approved\""
        );
    }
}
