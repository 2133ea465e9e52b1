//! Batch sync coordinator.
//!
//! Receives a device's batch of change records and reconciles each item
//! independently: identity resolution, version conflict resolution, the
//! entity state machine (with geofence validation when the payload
//! carries a location), and a per-item result. One item's failure never
//! aborts the batch, and already-committed items stay committed.

use crate::attendance::{self, CheckInEffect};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::issues;
use crate::notify::{Notifier, SyncEvent};
use crate::resolver::{Resolution, VersionConflictResolver};
use crate::store::EntityStore;
use crate::tasks::{self, TaskTransition};
use chrono::{DateTime, Utc};
use fieldsync_geo::{GeofenceEngine, ValidationOutcome, ZoneIndex};
use fieldsync_model::{
    project_attendance, project_issue, project_task, AttendanceChange, AttendanceRecord,
    BatchSyncResponse, ChangePayload, ChangeRecord, IssueChange, IssueRecord, IssueStatus,
    ModelError, ServerChanges, SyncBatch, SyncResult, TaskChange, TaskRecord, TaskStatus,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Orchestrates batch synchronization against the shared store.
///
/// Stateless per call: every `process_batch` invocation may run
/// concurrently with others. The backing store is the only shared
/// mutable resource, guarded by compare-and-set saves with a single
/// re-resolve on a lost race.
pub struct SyncCoordinator<S: EntityStore> {
    store: Arc<S>,
    zones: Arc<dyn ZoneIndex>,
    geofence: GeofenceEngine,
    resolver: VersionConflictResolver,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
}

impl<S: EntityStore> SyncCoordinator<S> {
    /// Wires the coordinator to its collaborators.
    pub fn new(
        store: Arc<S>,
        zones: Arc<dyn ZoneIndex>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            zones,
            geofence: GeofenceEngine::new(),
            resolver: VersionConflictResolver::new(),
            clock,
            notifier,
            config,
        }
    }

    /// The shared entity store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Processes one uploaded batch for the authenticated worker.
    ///
    /// Returns `Err` only when storage is unreachable; every per-item
    /// problem becomes a failed `SyncResult` and the batch continues.
    /// Replaying an already-applied `(client_id, client_version)` pair
    /// returns the previously-assigned identity with no new mutation.
    pub fn process_batch(
        &self,
        worker_id: u64,
        batch: &SyncBatch,
    ) -> EngineResult<BatchSyncResponse> {
        let now = self.clock.now();
        let skew_secs = now
            .signed_duration_since(batch.client_clock)
            .num_seconds()
            .unsigned_abs();
        if skew_secs > self.config.clock_skew_warn.as_secs() {
            warn!(
                device = %batch.device_id,
                skew_secs,
                "client clock skew beyond threshold; versions still decide ordering"
            );
        }

        info!(
            device = %batch.device_id,
            worker_id,
            items = batch.items.len(),
            "processing sync batch"
        );

        let mut results = Vec::with_capacity(batch.items.len());
        for item in &batch.items {
            let result = match self.process_item(worker_id, item) {
                Ok(result) => result,
                Err(e) if e.is_batch_fatal() => return Err(e),
                Err(e) => {
                    debug!(client_id = %item.client_id, error = %e, "item failed");
                    SyncResult::failed(&item.client_id, e.to_string())
                }
            };
            results.push(result);
        }

        let response = BatchSyncResponse::from_results(results);
        info!(
            success = response.success_count,
            failed = response.failure_count,
            "batch complete"
        );
        Ok(response)
    }

    /// Server-authoritative changes for a worker since an instant,
    /// projected through the explicit per-entity view functions.
    pub fn changes_since(
        &self,
        worker_id: u64,
        since: DateTime<Utc>,
    ) -> EngineResult<ServerChanges> {
        Ok(ServerChanges {
            server_time: self.clock.now(),
            tasks: self
                .store
                .tasks_modified_since(worker_id, since)?
                .iter()
                .map(project_task)
                .collect(),
            attendance: self
                .store
                .attendance_modified_since(worker_id, since)?
                .iter()
                .map(project_attendance)
                .collect(),
            issues: self
                .store
                .issues_modified_since(worker_id, since)?
                .iter()
                .map(project_issue)
                .collect(),
        })
    }

    /// Supervisor decision on a completed task.
    pub fn review_task(&self, task_id: u64, approved: bool) -> EngineResult<TaskRecord> {
        for attempt in 0..2 {
            let mut task = self.store.task(task_id)?.ok_or(EngineError::NotFound {
                entity: "task",
                id: task_id,
            })?;
            let expected = task.server_version;
            tasks::review(&mut task, approved)?;
            task.record_mutation(self.clock.now());
            match self.store.save_task(&task, expected) {
                Ok(()) => return Ok(task),
                Err(EngineError::CasConflict { .. }) if attempt == 0 => continue,
                Err(e) => return Err(e),
            }
        }
        Err(EngineError::CasConflict {
            entity: "task",
            id: task_id,
        })
    }

    /// Supervisor decision on a pending (manual or rejected) check-in.
    pub fn review_manual_attendance(
        &self,
        attendance_id: u64,
        approved: bool,
    ) -> EngineResult<AttendanceRecord> {
        for attempt in 0..2 {
            let mut record =
                self.store
                    .attendance(attendance_id)?
                    .ok_or(EngineError::NotFound {
                        entity: "attendance",
                        id: attendance_id,
                    })?;
            let expected = record.server_version;
            attendance::review(&mut record, approved)?;
            record.record_mutation(self.clock.now());
            match self.store.save_attendance(&record, expected) {
                Ok(()) => return Ok(record),
                Err(EngineError::CasConflict { .. }) if attempt == 0 => continue,
                Err(e) => return Err(e),
            }
        }
        Err(EngineError::CasConflict {
            entity: "attendance",
            id: attendance_id,
        })
    }

    /// Supervisor transition of an issue's lifecycle.
    pub fn review_issue(&self, issue_id: u64, new_status: IssueStatus) -> EngineResult<IssueRecord> {
        for attempt in 0..2 {
            let mut record = self.store.issue(issue_id)?.ok_or(EngineError::NotFound {
                entity: "issue",
                id: issue_id,
            })?;
            let expected = record.server_version;
            issues::review(&mut record, new_status)?;
            record.record_mutation(self.clock.now());
            match self.store.save_issue(&record, expected) {
                Ok(()) => return Ok(record),
                Err(EngineError::CasConflict { .. }) if attempt == 0 => continue,
                Err(e) => return Err(e),
            }
        }
        Err(EngineError::CasConflict {
            entity: "issue",
            id: issue_id,
        })
    }

    fn process_item(&self, worker_id: u64, item: &ChangeRecord) -> EngineResult<SyncResult> {
        item.validate()?;
        match &item.payload {
            ChangePayload::Task(change) => self.process_task_item(worker_id, item, change),
            ChangePayload::Attendance(change) => {
                self.process_attendance_item(worker_id, item, change)
            }
            ChangePayload::Issue(change) => self.process_issue_item(worker_id, item, change),
        }
    }

    fn process_task_item(
        &self,
        worker_id: u64,
        item: &ChangeRecord,
        change: &TaskChange,
    ) -> EngineResult<SyncResult> {
        let existing = match item.server_id {
            Some(id) => Some(self.store.task(id)?.ok_or(EngineError::NotFound {
                entity: "task",
                id,
            })?),
            None => self.store.task_by_client_id(&item.client_id)?,
        };

        let Some(mut stored) = existing else {
            return self.create_task(worker_id, item, change);
        };

        for attempt in 0..2 {
            match self
                .resolver
                .resolve_task(&stored, item.client_version, change)?
            {
                Resolution::Duplicate => {
                    debug!(client_id = %item.client_id, task_id = stored.id, "duplicate task replay");
                    return Ok(SyncResult::duplicate(
                        &item.client_id,
                        stored.id,
                        stored.server_version,
                    ));
                }
                Resolution::Apply => {
                    let mut record = stored.clone();
                    let expected = record.server_version;
                    let effect = self.apply_task_change(&mut record, change)?;
                    record.client_version = item.client_version;
                    if record.client_id.is_none() {
                        record.client_id = Some(item.client_id.clone());
                    }
                    record.record_mutation(self.clock.now());
                    match self.store.save_task(&record, expected) {
                        Ok(()) => {
                            let (message, event) = task_effect_parts(effect, record.id);
                            if let Some(event) = event {
                                self.notifier.notify(event);
                            }
                            let mut result = SyncResult::applied(
                                &item.client_id,
                                record.id,
                                record.server_version,
                            );
                            if let Some(message) = message {
                                result = result.with_message(message);
                            }
                            return Ok(result);
                        }
                        Err(EngineError::CasConflict { .. }) if attempt == 0 => {
                            stored = self.reload_task(record.id)?;
                            continue;
                        }
                        Err(e) => return Err(e),
                    }
                }
                Resolution::Override(descriptor) => {
                    let mut record = stored.clone();
                    let expected = record.server_version;
                    tasks::apply_client_fields(&mut record, change);
                    record.record_mutation(self.clock.now());
                    match self.store.save_task(&record, expected) {
                        Ok(()) => {
                            warn!(
                                client_id = %item.client_id,
                                task_id = record.id,
                                kept = ?descriptor.kept_fields,
                                applied = ?descriptor.applied_fields,
                                "equal-version conflict merged"
                            );
                            return Ok(SyncResult::overridden(
                                &item.client_id,
                                record.id,
                                record.server_version,
                                descriptor,
                            ));
                        }
                        Err(EngineError::CasConflict { .. }) if attempt == 0 => {
                            stored = self.reload_task(record.id)?;
                            continue;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
        Err(EngineError::CasConflict {
            entity: "task",
            id: stored.id,
        })
    }

    fn create_task(
        &self,
        worker_id: u64,
        item: &ChangeRecord,
        change: &TaskChange,
    ) -> EngineResult<SyncResult> {
        let title = change
            .title
            .clone()
            .ok_or(EngineError::Validation(ModelError::MissingField("title")))?;

        let mut record = TaskRecord {
            id: 0,
            worker_id,
            zone_id: None,
            title,
            status: TaskStatus::Pending,
            completion_notes: None,
            photo_refs: Vec::new(),
            reported_location: None,
            completed_at: None,
            needs_review: false,
            auto_rejected: false,
            rejection_reason: None,
            rejection_distance_meters: None,
            client_id: Some(item.client_id.clone()),
            client_version: item.client_version,
            server_version: 1,
            updated_at: self.clock.now(),
        };
        let effect = self.apply_task_change(&mut record, change)?;
        let record = self.store.insert_task(record)?;

        let (message, event) = task_effect_parts(effect, record.id);
        if let Some(event) = event {
            self.notifier.notify(event);
        }
        let mut result = SyncResult::applied(&item.client_id, record.id, record.server_version);
        if let Some(message) = message {
            result = result.with_message(message);
        }
        Ok(result)
    }

    /// Applies client-owned fields and any requested transition,
    /// validating the reported location when the transition needs it.
    fn apply_task_change(
        &self,
        record: &mut TaskRecord,
        change: &TaskChange,
    ) -> EngineResult<TaskTransition> {
        tasks::apply_client_fields(record, change);
        let Some(requested) = change.status else {
            return Ok(TaskTransition::NoChange);
        };

        let outcome = if requested == TaskStatus::Completed && record.status != TaskStatus::Completed
        {
            Some(self.validate_task_location(record, change)?)
        } else {
            None
        };
        tasks::transition(record, requested, outcome.as_ref())
    }

    fn validate_task_location(
        &self,
        record: &TaskRecord,
        change: &TaskChange,
    ) -> EngineResult<ValidationOutcome> {
        let location = change
            .location
            .as_ref()
            .ok_or(EngineError::Validation(ModelError::MissingField("location")))?;

        let candidates = match record.zone_id {
            Some(zone_id) => vec![self.zones.zone(zone_id).ok_or(EngineError::NotFound {
                entity: "zone",
                id: zone_id,
            })?],
            None => self.zones.active_zones(),
        };

        let outcome = self
            .geofence
            .validate(location, &candidates, &self.config.thresholds)?;
        if outcome.borderline {
            debug!(
                task_id = record.id,
                distance = outcome.distance_meters,
                "borderline completion accepted"
            );
        }
        Ok(outcome)
    }

    fn reload_task(&self, id: u64) -> EngineResult<TaskRecord> {
        self.store.task(id)?.ok_or(EngineError::NotFound {
            entity: "task",
            id,
        })
    }

    fn process_attendance_item(
        &self,
        worker_id: u64,
        item: &ChangeRecord,
        change: &AttendanceChange,
    ) -> EngineResult<SyncResult> {
        let existing = match item.server_id {
            Some(id) => Some(self.store.attendance(id)?.ok_or(EngineError::NotFound {
                entity: "attendance",
                id,
            })?),
            None => self.store.attendance_by_client_id(&item.client_id)?,
        };

        let Some(mut stored) = existing else {
            return self.create_attendance(worker_id, item, change);
        };

        for attempt in 0..2 {
            match self
                .resolver
                .resolve_attendance(&stored, item.client_version, change)?
            {
                Resolution::Duplicate => {
                    debug!(client_id = %item.client_id, attendance_id = stored.id, "duplicate attendance replay");
                    return Ok(SyncResult::duplicate(
                        &item.client_id,
                        stored.id,
                        stored.server_version,
                    ));
                }
                resolution @ (Resolution::Apply | Resolution::Override(_)) => {
                    let mut record = stored.clone();
                    let expected = record.server_version;
                    attendance::apply_client_fields(&mut record, change);
                    if matches!(&resolution, Resolution::Apply) {
                        record.client_version = item.client_version;
                    }
                    record.record_mutation(self.clock.now());
                    match self.store.save_attendance(&record, expected) {
                        Ok(()) => {
                            return Ok(match resolution {
                                Resolution::Override(descriptor) => SyncResult::overridden(
                                    &item.client_id,
                                    record.id,
                                    record.server_version,
                                    descriptor,
                                ),
                                _ => SyncResult::applied(
                                    &item.client_id,
                                    record.id,
                                    record.server_version,
                                ),
                            });
                        }
                        Err(EngineError::CasConflict { .. }) if attempt == 0 => {
                            stored = self.store.attendance(record.id)?.ok_or(
                                EngineError::NotFound {
                                    entity: "attendance",
                                    id: record.id,
                                },
                            )?;
                            continue;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
        Err(EngineError::CasConflict {
            entity: "attendance",
            id: stored.id,
        })
    }

    fn create_attendance(
        &self,
        worker_id: u64,
        item: &ChangeRecord,
        change: &AttendanceChange,
    ) -> EngineResult<SyncResult> {
        let outcome = match &change.check_in_location {
            Some(location) => Some(self.geofence.validate(
                location,
                &self.zones.active_zones(),
                &self.config.thresholds,
            )?),
            None => None,
        };

        let (record, effect) = attendance::build_check_in(
            worker_id,
            &item.client_id,
            item.client_version,
            change,
            outcome.as_ref(),
            self.clock.as_ref(),
        );
        let record = self.store.insert_attendance(record)?;

        let mut result = SyncResult::applied(&item.client_id, record.id, record.server_version);
        match effect {
            CheckInEffect::AutoApproved => {}
            CheckInEffect::AutoApprovedFlagged { distance_meters } => {
                result = result.with_message(format!(
                    "checked in {distance_meters:.0} m from the nearest authorized zone; flagged for review"
                ));
            }
            CheckInEffect::PendingReview { .. } => {
                if let Some(message) = &record.validation_message {
                    result = result.with_message(message.clone());
                }
                self.notifier.notify(SyncEvent::AttendancePendingReview {
                    attendance_id: record.id,
                });
            }
        }
        Ok(result)
    }

    fn process_issue_item(
        &self,
        worker_id: u64,
        item: &ChangeRecord,
        change: &IssueChange,
    ) -> EngineResult<SyncResult> {
        let existing = match item.server_id {
            Some(id) => Some(self.store.issue(id)?.ok_or(EngineError::NotFound {
                entity: "issue",
                id,
            })?),
            None => self.store.issue_by_client_id(&item.client_id)?,
        };

        let Some(mut stored) = existing else {
            let record = issues::build_issue(
                worker_id,
                &item.client_id,
                item.client_version,
                change,
                self.clock.as_ref(),
            );
            let record = self.store.insert_issue(record)?;
            return Ok(SyncResult::applied(
                &item.client_id,
                record.id,
                record.server_version,
            ));
        };

        for attempt in 0..2 {
            match self
                .resolver
                .resolve_issue(&stored, item.client_version, change)?
            {
                Resolution::Duplicate => {
                    debug!(client_id = %item.client_id, issue_id = stored.id, "duplicate issue replay");
                    return Ok(SyncResult::duplicate(
                        &item.client_id,
                        stored.id,
                        stored.server_version,
                    ));
                }
                resolution @ (Resolution::Apply | Resolution::Override(_)) => {
                    let mut record = stored.clone();
                    let expected = record.server_version;
                    issues::apply_client_fields(&mut record, change);
                    if matches!(&resolution, Resolution::Apply) {
                        record.client_version = item.client_version;
                    }
                    record.record_mutation(self.clock.now());
                    match self.store.save_issue(&record, expected) {
                        Ok(()) => {
                            return Ok(match resolution {
                                Resolution::Override(descriptor) => SyncResult::overridden(
                                    &item.client_id,
                                    record.id,
                                    record.server_version,
                                    descriptor,
                                ),
                                _ => SyncResult::applied(
                                    &item.client_id,
                                    record.id,
                                    record.server_version,
                                ),
                            });
                        }
                        Err(EngineError::CasConflict { .. }) if attempt == 0 => {
                            stored =
                                self.store
                                    .issue(record.id)?
                                    .ok_or(EngineError::NotFound {
                                        entity: "issue",
                                        id: record.id,
                                    })?;
                            continue;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
        Err(EngineError::CasConflict {
            entity: "issue",
            id: stored.id,
        })
    }
}

/// Message and notification for a completed task transition.
fn task_effect_parts(
    effect: TaskTransition,
    task_id: u64,
) -> (Option<String>, Option<SyncEvent>) {
    match effect {
        TaskTransition::NoChange | TaskTransition::Moved => (None, None),
        TaskTransition::Completed {
            flagged_distance: None,
        } => (None, None),
        TaskTransition::Completed {
            flagged_distance: Some(distance),
        } => (
            Some(format!(
                "completed {distance:.0} m from the task zone; flagged for review"
            )),
            Some(SyncEvent::TaskFlaggedForReview {
                task_id,
                distance_meters: distance,
            }),
        ),
        TaskTransition::AutoRejected { distance_meters } => (
            Some(format!(
                "completion rejected: {distance_meters:.0} m outside the authorized zone; an appeal may be submitted"
            )),
            Some(SyncEvent::TaskAutoRejected {
                task_id,
                distance_meters,
            }),
        ),
    }
}
