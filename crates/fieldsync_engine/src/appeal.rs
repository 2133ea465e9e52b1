//! Appeal workflow.
//!
//! The only path that overrides a geofence-driven rejection without a
//! new location submission. A worker submits at most one appeal per
//! rejected entity; a supervisor decides it exactly once, and approval
//! forces the entity into `Approved`, bypassing the normal geofence
//! gate.

use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};
use crate::notify::{Notifier, SyncEvent};
use crate::store::EntityStore;
use fieldsync_model::{
    Appeal, AppealStatus, AppealTarget, AppealTargetKind, AttendanceApproval, TaskStatus,
};
use std::sync::Arc;
use tracing::info;

/// Secondary reconciliation over rejected entities.
pub struct AppealWorkflow<S: EntityStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl<S: EntityStore> AppealWorkflow<S> {
    /// Creates the workflow over the shared store.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            clock,
            notifier,
        }
    }

    /// Submits an appeal against a rejected entity.
    ///
    /// Fails if the entity does not exist, is not in an appealable
    /// rejected state, or already has an appeal (reviewed or not).
    pub fn submit(
        &self,
        target: AppealTarget,
        worker_id: u64,
        explanation: impl Into<String>,
        evidence_ref: Option<String>,
    ) -> EngineResult<Appeal> {
        let explanation = explanation.into();
        if explanation.trim().is_empty() {
            return Err(EngineError::Appeal("explanation is required".into()));
        }
        if self.store.appeal_for_target(target)?.is_some() {
            return Err(EngineError::Appeal(
                "an appeal for this entity was already submitted".into(),
            ));
        }

        let (reported_location, distance_meters, original_reason) = match target.kind {
            AppealTargetKind::Task => {
                let task = self
                    .store
                    .task(target.entity_id)?
                    .ok_or(EngineError::NotFound {
                        entity: "task",
                        id: target.entity_id,
                    })?;
                if task.status != TaskStatus::Rejected || !task.auto_rejected {
                    return Err(EngineError::Appeal(
                        "task was not automatically rejected".into(),
                    ));
                }
                (
                    task.reported_location,
                    task.rejection_distance_meters,
                    task.rejection_reason,
                )
            }
            AppealTargetKind::Attendance => {
                let record =
                    self.store
                        .attendance(target.entity_id)?
                        .ok_or(EngineError::NotFound {
                            entity: "attendance",
                            id: target.entity_id,
                        })?;
                if record.approval != AttendanceApproval::Rejected {
                    return Err(EngineError::Appeal("attendance was not rejected".into()));
                }
                (record.check_in_location, None, record.validation_message)
            }
        };

        let appeal = self.store.insert_appeal(Appeal {
            id: 0,
            target,
            worker_id,
            explanation,
            evidence_ref,
            reported_location,
            distance_meters,
            original_rejection_reason: original_reason,
            status: AppealStatus::Pending,
            review_notes: None,
            submitted_at: self.clock.now(),
            reviewed_at: None,
        })?;

        info!(
            appeal_id = appeal.id,
            entity_id = target.entity_id,
            worker_id,
            "appeal submitted"
        );
        self.notifier.notify(SyncEvent::AppealSubmitted {
            appeal_id: appeal.id,
        });
        Ok(appeal)
    }

    /// Records a supervisor decision on a pending appeal.
    ///
    /// On approval the referenced entity is reinstated into `Approved`,
    /// deliberately outside the normal state machine.
    pub fn review(
        &self,
        appeal_id: u64,
        approved: bool,
        notes: Option<String>,
    ) -> EngineResult<Appeal> {
        let mut appeal = self.store.appeal(appeal_id)?.ok_or(EngineError::NotFound {
            entity: "appeal",
            id: appeal_id,
        })?;
        if !appeal.is_pending() {
            return Err(EngineError::Appeal("appeal was already reviewed".into()));
        }

        appeal.status = if approved {
            AppealStatus::Approved
        } else {
            AppealStatus::Rejected
        };
        appeal.review_notes = notes;
        appeal.reviewed_at = Some(self.clock.now());
        self.store.save_appeal(&appeal)?;

        if approved {
            self.reinstate(appeal.target)?;
        }

        info!(appeal_id, approved, "appeal reviewed");
        self.notifier.notify(SyncEvent::AppealDecided {
            appeal_id,
            approved,
        });
        Ok(appeal)
    }

    fn reinstate(&self, target: AppealTarget) -> EngineResult<()> {
        match target.kind {
            AppealTargetKind::Task => {
                for attempt in 0..2 {
                    let mut task =
                        self.store
                            .task(target.entity_id)?
                            .ok_or(EngineError::NotFound {
                                entity: "task",
                                id: target.entity_id,
                            })?;
                    let expected = task.server_version;
                    task.status = TaskStatus::Approved;
                    task.auto_rejected = false;
                    task.rejection_reason = None;
                    task.needs_review = false;
                    task.record_mutation(self.clock.now());
                    match self.store.save_task(&task, expected) {
                        Ok(()) => return Ok(()),
                        Err(EngineError::CasConflict { .. }) if attempt == 0 => continue,
                        Err(e) => return Err(e),
                    }
                }
                Err(EngineError::CasConflict {
                    entity: "task",
                    id: target.entity_id,
                })
            }
            AppealTargetKind::Attendance => {
                for attempt in 0..2 {
                    let mut record =
                        self.store
                            .attendance(target.entity_id)?
                            .ok_or(EngineError::NotFound {
                                entity: "attendance",
                                id: target.entity_id,
                            })?;
                    let expected = record.server_version;
                    record.approval = AttendanceApproval::Approved;
                    record.needs_review = false;
                    record.record_mutation(self.clock.now());
                    match self.store.save_attendance(&record, expected) {
                        Ok(()) => return Ok(()),
                        Err(EngineError::CasConflict { .. }) if attempt == 0 => continue,
                        Err(e) => return Err(e),
                    }
                }
                Err(EngineError::CasConflict {
                    entity: "attendance",
                    id: target.entity_id,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::RecordingNotifier;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use fieldsync_model::TaskRecord;

    fn rejected_task() -> TaskRecord {
        TaskRecord {
            id: 0,
            worker_id: 7,
            zone_id: Some(1),
            title: "t".into(),
            status: TaskStatus::Rejected,
            completion_notes: None,
            photo_refs: Vec::new(),
            reported_location: None,
            completed_at: None,
            needs_review: false,
            auto_rejected: true,
            rejection_reason: Some("completed 620 m outside the authorized zone".into()),
            rejection_distance_meters: Some(620.0),
            client_id: None,
            client_version: 1,
            server_version: 2,
            updated_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    fn workflow() -> (AppealWorkflow<MemoryStore>, Arc<MemoryStore>, Arc<RecordingNotifier>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at(
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
        ));
        let notifier = Arc::new(RecordingNotifier::new());
        let workflow = AppealWorkflow::new(store.clone(), clock, notifier.clone());
        (workflow, store, notifier)
    }

    #[test]
    fn approved_appeal_reinstates_task() {
        let (workflow, store, notifier) = workflow();
        let task = store.insert_task(rejected_task()).unwrap();

        let target = AppealTarget {
            kind: AppealTargetKind::Task,
            entity_id: task.id,
        };
        let appeal = workflow
            .submit(target, 7, "GPS drifted indoors", None)
            .unwrap();
        assert_eq!(appeal.status, AppealStatus::Pending);
        assert_eq!(appeal.distance_meters, Some(620.0));

        let appeal = workflow
            .review(appeal.id, true, Some("evidence checks out".into()))
            .unwrap();
        assert_eq!(appeal.status, AppealStatus::Approved);

        let task = store.task(task.id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Approved);
        assert!(!task.auto_rejected);
        assert!(task.rejection_reason.is_none());
        assert_eq!(task.server_version, 3);

        let events = notifier.events();
        assert!(matches!(events[0], SyncEvent::AppealSubmitted { .. }));
        assert!(matches!(
            events[1],
            SyncEvent::AppealDecided { approved: true, .. }
        ));
    }

    #[test]
    fn rejected_appeal_leaves_entity_alone() {
        let (workflow, store, _) = workflow();
        let task = store.insert_task(rejected_task()).unwrap();

        let target = AppealTarget {
            kind: AppealTargetKind::Task,
            entity_id: task.id,
        };
        let appeal = workflow.submit(target, 7, "I was there", None).unwrap();
        workflow.review(appeal.id, false, None).unwrap();

        let task = store.task(task.id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Rejected);
        assert_eq!(task.server_version, 2);
    }

    #[test]
    fn second_appeal_for_same_entity_is_invalid() {
        let (workflow, store, _) = workflow();
        let task = store.insert_task(rejected_task()).unwrap();
        let target = AppealTarget {
            kind: AppealTargetKind::Task,
            entity_id: task.id,
        };

        let appeal = workflow.submit(target, 7, "first", None).unwrap();
        workflow.review(appeal.id, true, None).unwrap();

        let err = workflow.submit(target, 7, "second", None).unwrap_err();
        assert!(matches!(err, EngineError::Appeal(_)));
    }

    #[test]
    fn appeal_requires_auto_rejected_entity() {
        let (workflow, store, _) = workflow();
        let mut task = rejected_task();
        task.status = TaskStatus::Completed;
        task.auto_rejected = false;
        let task = store.insert_task(task).unwrap();

        let err = workflow
            .submit(
                AppealTarget {
                    kind: AppealTargetKind::Task,
                    entity_id: task.id,
                },
                7,
                "please",
                None,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Appeal(_)));
    }

    #[test]
    fn review_decides_only_once() {
        let (workflow, store, _) = workflow();
        let task = store.insert_task(rejected_task()).unwrap();
        let appeal = workflow
            .submit(
                AppealTarget {
                    kind: AppealTargetKind::Task,
                    entity_id: task.id,
                },
                7,
                "explain",
                None,
            )
            .unwrap();

        workflow.review(appeal.id, false, None).unwrap();
        let err = workflow.review(appeal.id, true, None).unwrap_err();
        assert!(matches!(err, EngineError::Appeal(_)));
    }
}
