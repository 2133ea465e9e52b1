//! Version conflict resolution.
//!
//! The resolver compares an incoming change's client version against the
//! stored record's applied client version and decides, per the policy in
//! the order below, what the coordinator should do:
//!
//! 1. `incoming < stored` — stale replay, ignore silently.
//! 2. `incoming == stored`, client-owned fields equivalent — duplicate
//!    replay, ignore silently.
//! 3. `incoming == stored`, fields diverge — merge: workflow-state
//!    fields stay server-authoritative, client-owned fields accept the
//!    incoming values, and the result names which side kept what.
//! 4. `incoming == stored + 1` — normal forward edit, apply fully.
//! 5. `incoming > stored + 1` — version gap, reject and request a full
//!    resync. The gap is never silently filled.
//!
//! The resolver is pure: it never touches the store and holds no state.

use crate::error::{EngineError, EngineResult};
use crate::{attendance, issues, tasks};
use fieldsync_model::{
    AttendanceChange, AttendanceRecord, ConflictDescriptor, IssueChange, IssueRecord, TaskChange,
    TaskRecord,
};

/// What the coordinator should do with an incoming change.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Stale or equivalent replay: return the stored identity and
    /// version, mutate nothing.
    Duplicate,
    /// Normal forward edit: apply the full change, state machine
    /// included.
    Apply,
    /// Equal-version divergence: apply client-owned fields only and
    /// report the merge.
    Override(ConflictDescriptor),
}

/// Per-entity-type conflict policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionConflictResolver;

impl VersionConflictResolver {
    /// Creates the resolver. Stateless; exists for wiring symmetry.
    pub fn new() -> Self {
        Self
    }

    /// Resolves an incoming task change against its stored record.
    pub fn resolve_task(
        &self,
        stored: &TaskRecord,
        incoming_version: u32,
        change: &TaskChange,
    ) -> EngineResult<Resolution> {
        match version_step(stored.client_version, incoming_version)? {
            VersionStep::Stale => Ok(Resolution::Duplicate),
            VersionStep::Forward => Ok(Resolution::Apply),
            VersionStep::Equal => {
                let applied = tasks::diverging_client_fields(stored, change);
                let status_conflict = change
                    .status
                    .is_some_and(|requested| requested != stored.status);
                if applied.is_empty() && !status_conflict {
                    return Ok(Resolution::Duplicate);
                }
                let kept = if status_conflict {
                    vec!["status".to_string()]
                } else {
                    Vec::new()
                };
                Ok(Resolution::Override(descriptor(kept, applied)))
            }
        }
    }

    /// Resolves an incoming attendance change against its stored record.
    pub fn resolve_attendance(
        &self,
        stored: &AttendanceRecord,
        incoming_version: u32,
        change: &AttendanceChange,
    ) -> EngineResult<Resolution> {
        match version_step(stored.client_version, incoming_version)? {
            VersionStep::Stale => Ok(Resolution::Duplicate),
            VersionStep::Forward => Ok(Resolution::Apply),
            VersionStep::Equal => {
                let applied = attendance::diverging_client_fields(stored, change);
                if applied.is_empty() {
                    return Ok(Resolution::Duplicate);
                }
                Ok(Resolution::Override(descriptor(Vec::new(), applied)))
            }
        }
    }

    /// Resolves an incoming issue change against its stored record.
    pub fn resolve_issue(
        &self,
        stored: &IssueRecord,
        incoming_version: u32,
        change: &IssueChange,
    ) -> EngineResult<Resolution> {
        match version_step(stored.client_version, incoming_version)? {
            VersionStep::Stale => Ok(Resolution::Duplicate),
            VersionStep::Forward => Ok(Resolution::Apply),
            VersionStep::Equal => {
                let applied = issues::diverging_client_fields(stored, change);
                if applied.is_empty() {
                    return Ok(Resolution::Duplicate);
                }
                Ok(Resolution::Override(descriptor(Vec::new(), applied)))
            }
        }
    }
}

enum VersionStep {
    Stale,
    Equal,
    Forward,
}

fn version_step(stored: u32, incoming: u32) -> EngineResult<VersionStep> {
    if incoming < stored {
        Ok(VersionStep::Stale)
    } else if incoming == stored {
        Ok(VersionStep::Equal)
    } else if incoming == stored + 1 {
        Ok(VersionStep::Forward)
    } else {
        Err(EngineError::VersionGap { stored, incoming })
    }
}

fn descriptor(kept: Vec<String>, applied: Vec<String>) -> ConflictDescriptor {
    let reason = match (kept.is_empty(), applied.is_empty()) {
        (false, false) => "server kept workflow state; client-owned fields applied",
        (false, true) => "server kept workflow state; no client-owned changes",
        _ => "client-owned fields applied over an equal-version replay",
    };
    ConflictDescriptor {
        kept_fields: kept,
        applied_fields: applied,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fieldsync_model::TaskStatus;

    fn stored_task(client_version: u32, status: TaskStatus) -> TaskRecord {
        TaskRecord {
            id: 1,
            worker_id: 1,
            zone_id: None,
            title: "t".into(),
            status,
            completion_notes: None,
            photo_refs: Vec::new(),
            reported_location: None,
            completed_at: None,
            needs_review: false,
            auto_rejected: false,
            rejection_reason: None,
            rejection_distance_meters: None,
            client_id: Some("c1".into()),
            client_version,
            server_version: 3,
            updated_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn stale_replay_is_duplicate() {
        let resolver = VersionConflictResolver::new();
        let stored = stored_task(4, TaskStatus::InProgress);
        let resolution = resolver
            .resolve_task(&stored, 2, &TaskChange::default())
            .unwrap();
        assert_eq!(resolution, Resolution::Duplicate);
    }

    #[test]
    fn equal_version_equivalent_is_duplicate() {
        let resolver = VersionConflictResolver::new();
        let mut stored = stored_task(3, TaskStatus::Completed);
        stored.completion_notes = Some("done".into());

        // The replayed payload matches what was already applied, and its
        // status request matches a state the server has since moved past
        // only in server-authoritative ways.
        let change = TaskChange {
            status: Some(TaskStatus::Completed),
            completion_notes: Some("done".into()),
            ..TaskChange::default()
        };
        let resolution = resolver.resolve_task(&stored, 3, &change).unwrap();
        assert_eq!(resolution, Resolution::Duplicate);
    }

    #[test]
    fn equal_version_divergence_is_override() {
        // Stored task at client version 3, InProgress; incoming version 3
        // asks for Completed with new notes. The server keeps its status,
        // the notes come through.
        let resolver = VersionConflictResolver::new();
        let stored = stored_task(3, TaskStatus::InProgress);
        let change = TaskChange {
            status: Some(TaskStatus::Completed),
            completion_notes: Some("replaced pipe".into()),
            ..TaskChange::default()
        };

        let resolution = resolver.resolve_task(&stored, 3, &change).unwrap();
        match resolution {
            Resolution::Override(desc) => {
                assert_eq!(desc.kept_fields, vec!["status"]);
                assert_eq!(desc.applied_fields, vec!["completion_notes"]);
            }
            other => panic!("expected override, got {other:?}"),
        }
    }

    #[test]
    fn forward_edit_applies() {
        let resolver = VersionConflictResolver::new();
        let stored = stored_task(3, TaskStatus::InProgress);
        let resolution = resolver
            .resolve_task(&stored, 4, &TaskChange::default())
            .unwrap();
        assert_eq!(resolution, Resolution::Apply);
    }

    #[test]
    fn version_gap_rejects() {
        let resolver = VersionConflictResolver::new();
        let stored = stored_task(2, TaskStatus::InProgress);
        let err = resolver
            .resolve_task(&stored, 5, &TaskChange::default())
            .unwrap_err();
        match err {
            EngineError::VersionGap { stored, incoming } => {
                assert_eq!(stored, 2);
                assert_eq!(incoming, 5);
            }
            other => panic!("expected gap, got {other:?}"),
        }
    }
}
