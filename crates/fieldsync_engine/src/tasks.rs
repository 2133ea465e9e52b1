//! Task lifecycle state machine.
//!
//! Workflow: `Pending → InProgress → Completed → Approved | Rejected`,
//! or `Pending → Cancelled`. The transition into `Completed` is gated on
//! a geofence outcome; a `Rejected` outcome auto-rejects the task and
//! records the provenance an appeal needs.

use crate::error::{EngineError, EngineResult};
use fieldsync_geo::{Decision, ValidationOutcome};
use fieldsync_model::{ModelError, TaskChange, TaskRecord, TaskStatus};

/// What a requested transition did to the record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TaskTransition {
    /// Requested state equals the current state.
    NoChange,
    /// Ordinary move (started, cancelled).
    Moved,
    /// Completion accepted; `flagged_distance` is set when the
    /// submission landed in the warning band.
    Completed { flagged_distance: Option<f64> },
    /// Completion rejected on distance.
    AutoRejected {
        /// Distance from the zone in meters.
        distance_meters: f64,
    },
}

/// Applies a requested status transition.
///
/// `geofence` must be present for transitions into `Completed`; the
/// coordinator computes it from the reported location and candidate
/// zones. Invalid transitions fail without touching the record.
pub(crate) fn transition(
    record: &mut TaskRecord,
    requested: TaskStatus,
    geofence: Option<&ValidationOutcome>,
) -> EngineResult<TaskTransition> {
    use TaskStatus::*;

    if requested == record.status {
        return Ok(TaskTransition::NoChange);
    }

    match (record.status, requested) {
        (Pending, InProgress) => {
            record.status = InProgress;
            Ok(TaskTransition::Moved)
        }
        (Pending, Cancelled) => {
            record.status = Cancelled;
            Ok(TaskTransition::Moved)
        }
        (Pending | InProgress, Completed) => {
            let outcome = geofence
                .ok_or(EngineError::Validation(ModelError::MissingField("location")))?;
            match outcome.decision {
                Decision::Accepted => {
                    record.status = Completed;
                    Ok(TaskTransition::Completed {
                        flagged_distance: None,
                    })
                }
                Decision::AcceptedWithWarning => {
                    record.status = Completed;
                    record.needs_review = true;
                    Ok(TaskTransition::Completed {
                        flagged_distance: Some(outcome.distance_meters),
                    })
                }
                Decision::Rejected => {
                    record.status = Rejected;
                    record.auto_rejected = true;
                    record.rejection_distance_meters = Some(outcome.distance_meters);
                    record.rejection_reason = Some(format!(
                        "completed {:.0} m outside the authorized zone",
                        outcome.distance_meters
                    ));
                    Ok(TaskTransition::AutoRejected {
                        distance_meters: outcome.distance_meters,
                    })
                }
            }
        }
        (from, to) => Err(EngineError::InvalidTransition {
            entity: "task",
            detail: format!("{from:?} -> {to:?}"),
        }),
    }
}

/// Supervisor decision on a completed task.
pub(crate) fn review(record: &mut TaskRecord, approved: bool) -> EngineResult<()> {
    if record.status != TaskStatus::Completed {
        return Err(EngineError::InvalidTransition {
            entity: "task",
            detail: format!("review of {:?} task", record.status),
        });
    }
    record.status = if approved {
        TaskStatus::Approved
    } else {
        TaskStatus::Rejected
    };
    record.needs_review = false;
    Ok(())
}

/// Client-owned fields in `change` whose values differ from `stored`.
pub(crate) fn diverging_client_fields(stored: &TaskRecord, change: &TaskChange) -> Vec<String> {
    let mut fields = Vec::new();
    if let Some(notes) = &change.completion_notes {
        if stored.completion_notes.as_ref() != Some(notes) {
            fields.push("completion_notes".to_string());
        }
    }
    if !change
        .photo_refs
        .iter()
        .all(|r| stored.photo_refs.contains(r))
    {
        fields.push("photo_refs".to_string());
    }
    if let Some(location) = &change.location {
        if stored.reported_location.as_ref() != Some(location) {
            fields.push("reported_location".to_string());
        }
    }
    if let Some(at) = change.completed_at {
        if stored.completed_at != Some(at) {
            fields.push("completed_at".to_string());
        }
    }
    fields
}

/// Applies client-owned fields from `change`. Photo references append;
/// everything else overwrites.
pub(crate) fn apply_client_fields(record: &mut TaskRecord, change: &TaskChange) {
    if let Some(notes) = &change.completion_notes {
        record.completion_notes = Some(notes.clone());
    }
    for photo in &change.photo_refs {
        if !record.photo_refs.contains(photo) {
            record.photo_refs.push(photo.clone());
        }
    }
    if let Some(location) = change.location {
        record.reported_location = Some(location);
    }
    if let Some(at) = change.completed_at {
        record.completed_at = Some(at);
    }
}
