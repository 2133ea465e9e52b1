//! Attendance check-in validation and approval machine.
//!
//! Check-ins validated inside a zone auto-approve. A rejected geofence
//! outcome or a check-in with no usable GPS falls back to the manual
//! path: the record is kept but its approval starts `Pending` and a
//! supervisor must decide.

use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};
use fieldsync_geo::{Decision, ValidationOutcome};
use fieldsync_model::{AttendanceApproval, AttendanceChange, AttendanceRecord};

/// How a check-in landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CheckInEffect {
    /// Validated; no review needed.
    AutoApproved,
    /// Validated but in the warning band; flagged for supervisors.
    AutoApprovedFlagged {
        /// Distance from the nearest zone in meters.
        distance_meters: f64,
    },
    /// Awaiting a supervisor decision.
    PendingReview {
        /// Entered without usable GPS.
        manual: bool,
    },
}

/// Builds a new attendance record from a check-in change.
///
/// `geofence` is `None` exactly when the change carried no usable GPS;
/// the caller computes it otherwise.
pub(crate) fn build_check_in(
    worker_id: u64,
    client_id: &str,
    client_version: u32,
    change: &AttendanceChange,
    geofence: Option<&ValidationOutcome>,
    clock: &dyn Clock,
) -> (AttendanceRecord, CheckInEffect) {
    let now = clock.now();
    let mut record = AttendanceRecord {
        id: 0,
        worker_id,
        zone_id: None,
        check_in_at: change.check_in_at,
        check_out_at: change.check_out_at,
        check_in_location: change.check_in_location,
        check_out_location: change.check_out_location,
        approval: AttendanceApproval::Pending,
        is_manual: false,
        manual_reason: change.manual_reason.clone(),
        needs_review: false,
        validation_message: None,
        client_id: Some(client_id.to_string()),
        client_version,
        server_version: 1,
        updated_at: now,
    };

    let effect = match geofence {
        None => {
            record.is_manual = true;
            record.validation_message = Some(
                change
                    .manual_reason
                    .clone()
                    .unwrap_or_else(|| "manual check-in awaiting supervisor review".to_string()),
            );
            CheckInEffect::PendingReview { manual: true }
        }
        Some(outcome) => match outcome.decision {
            Decision::Accepted => {
                record.approval = AttendanceApproval::AutoApproved;
                record.zone_id = outcome.matched_zone_id;
                CheckInEffect::AutoApproved
            }
            Decision::AcceptedWithWarning => {
                record.approval = AttendanceApproval::AutoApproved;
                record.zone_id = outcome.matched_zone_id;
                record.needs_review = true;
                record.validation_message = Some(format!(
                    "checked in {:.0} m from the nearest authorized zone",
                    outcome.distance_meters
                ));
                CheckInEffect::AutoApprovedFlagged {
                    distance_meters: outcome.distance_meters,
                }
            }
            Decision::Rejected => {
                record.validation_message = Some(format!(
                    "check-in {:.0} m outside authorized zones",
                    outcome.distance_meters
                ));
                CheckInEffect::PendingReview { manual: false }
            }
        },
    };

    (record, effect)
}

/// Supervisor decision on a pending attendance record.
pub(crate) fn review(record: &mut AttendanceRecord, approved: bool) -> EngineResult<()> {
    if record.approval != AttendanceApproval::Pending {
        return Err(EngineError::InvalidTransition {
            entity: "attendance",
            detail: format!("review of {:?} attendance", record.approval),
        });
    }
    record.approval = if approved {
        AttendanceApproval::Approved
    } else {
        AttendanceApproval::Rejected
    };
    record.needs_review = false;
    Ok(())
}

/// Client-owned fields in `change` whose values differ from `stored`.
///
/// Check-in data is fixed at creation; later mutations only carry
/// check-out data and the manual reason.
pub(crate) fn diverging_client_fields(
    stored: &AttendanceRecord,
    change: &AttendanceChange,
) -> Vec<String> {
    let mut fields = Vec::new();
    if let Some(out) = change.check_out_at {
        if stored.check_out_at != Some(out) {
            fields.push("check_out_at".to_string());
        }
    }
    if let Some(location) = &change.check_out_location {
        if stored.check_out_location.as_ref() != Some(location) {
            fields.push("check_out_location".to_string());
        }
    }
    if let Some(reason) = &change.manual_reason {
        if stored.manual_reason.as_ref() != Some(reason) {
            fields.push("manual_reason".to_string());
        }
    }
    fields
}

/// Applies client-owned fields from `change`.
pub(crate) fn apply_client_fields(record: &mut AttendanceRecord, change: &AttendanceChange) {
    if let Some(out) = change.check_out_at {
        record.check_out_at = Some(out);
    }
    if let Some(location) = change.check_out_location {
        record.check_out_location = Some(location);
    }
    if let Some(reason) = &change.manual_reason {
        record.manual_reason = Some(reason.clone());
    }
}
