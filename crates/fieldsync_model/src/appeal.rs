//! Appeals against automatic geofence rejections.

use crate::status::AppealStatus;
use chrono::{DateTime, Utc};
use fieldsync_geo::GeoPoint;
use serde::{Deserialize, Serialize};

/// Kind of entity an appeal references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealTargetKind {
    /// Auto-rejected task completion.
    Task,
    /// Rejected attendance check-in.
    Attendance,
}

/// Reference to the rejected entity being appealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppealTarget {
    /// Entity kind.
    pub kind: AppealTargetKind,
    /// Entity arena key.
    pub entity_id: u64,
}

/// A worker's appeal against an automatic rejection.
///
/// Created by the worker, mutated exactly once by a supervisor decision,
/// then immutable. At most one appeal exists per rejected entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appeal {
    /// Arena key.
    pub id: u64,
    /// The rejected entity.
    pub target: AppealTarget,
    /// Worker who submitted the appeal.
    pub worker_id: u64,
    /// Worker's explanation.
    pub explanation: String,
    /// Opaque reference to an evidence photo, if provided.
    pub evidence_ref: Option<String>,
    /// Location the worker reported at the rejected submission.
    pub reported_location: Option<GeoPoint>,
    /// Distance recorded at rejection, in meters.
    pub distance_meters: Option<f64>,
    /// Rejection reason copied from the entity.
    pub original_rejection_reason: Option<String>,
    /// Review state.
    pub status: AppealStatus,
    /// Supervisor's response.
    pub review_notes: Option<String>,
    /// When the worker submitted the appeal.
    pub submitted_at: DateTime<Utc>,
    /// When the supervisor decided, once reviewed.
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl Appeal {
    /// Returns true while the appeal still awaits review.
    pub fn is_pending(&self) -> bool {
        self.status == AppealStatus::Pending
    }
}
