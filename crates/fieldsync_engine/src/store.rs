//! Persistence collaborator.
//!
//! The engine reads and writes entities only through `EntityStore`.
//! Writes are compare-and-set on the entity's `server_version`: a save
//! whose expectation no longer matches fails with `CasConflict` and the
//! coordinator re-resolves once. Entities live in arenas keyed by
//! integer id with explicit foreign-key fields; client correlation keys
//! are indexed per entity type so lost-response re-uploads find their
//! records.

use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use fieldsync_model::{Appeal, AppealTarget, AttendanceRecord, IssueRecord, TaskRecord};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Load/save seam over the backing store of versioned entities.
///
/// Implementations report connectivity problems as
/// `EngineError::StorageUnavailable`, which aborts the whole batch.
pub trait EntityStore: Send + Sync {
    /// Loads a task by id.
    fn task(&self, id: u64) -> EngineResult<Option<TaskRecord>>;
    /// Loads a task by originating client correlation key.
    fn task_by_client_id(&self, client_id: &str) -> EngineResult<Option<TaskRecord>>;
    /// Inserts a new task, assigning its server id.
    fn insert_task(&self, record: TaskRecord) -> EngineResult<TaskRecord>;
    /// Saves a task if its stored `server_version` still equals
    /// `expected_version`.
    fn save_task(&self, record: &TaskRecord, expected_version: u32) -> EngineResult<()>;
    /// Tasks of one worker modified after `since`.
    fn tasks_modified_since(
        &self,
        worker_id: u64,
        since: DateTime<Utc>,
    ) -> EngineResult<Vec<TaskRecord>>;

    /// Loads an attendance record by id.
    fn attendance(&self, id: u64) -> EngineResult<Option<AttendanceRecord>>;
    /// Loads an attendance record by client correlation key.
    fn attendance_by_client_id(&self, client_id: &str) -> EngineResult<Option<AttendanceRecord>>;
    /// Inserts a new attendance record, assigning its server id.
    fn insert_attendance(&self, record: AttendanceRecord) -> EngineResult<AttendanceRecord>;
    /// Compare-and-set save of an attendance record.
    fn save_attendance(
        &self,
        record: &AttendanceRecord,
        expected_version: u32,
    ) -> EngineResult<()>;
    /// Attendance records of one worker modified after `since`.
    fn attendance_modified_since(
        &self,
        worker_id: u64,
        since: DateTime<Utc>,
    ) -> EngineResult<Vec<AttendanceRecord>>;

    /// Loads an issue by id.
    fn issue(&self, id: u64) -> EngineResult<Option<IssueRecord>>;
    /// Loads an issue by client correlation key.
    fn issue_by_client_id(&self, client_id: &str) -> EngineResult<Option<IssueRecord>>;
    /// Inserts a new issue, assigning its server id.
    fn insert_issue(&self, record: IssueRecord) -> EngineResult<IssueRecord>;
    /// Compare-and-set save of an issue.
    fn save_issue(&self, record: &IssueRecord, expected_version: u32) -> EngineResult<()>;
    /// Issues of one worker modified after `since`.
    fn issues_modified_since(
        &self,
        worker_id: u64,
        since: DateTime<Utc>,
    ) -> EngineResult<Vec<IssueRecord>>;

    /// Loads an appeal by id.
    fn appeal(&self, id: u64) -> EngineResult<Option<Appeal>>;
    /// Finds the appeal for an entity, if one was ever submitted.
    fn appeal_for_target(&self, target: AppealTarget) -> EngineResult<Option<Appeal>>;
    /// Inserts a new appeal, assigning its id.
    fn insert_appeal(&self, appeal: Appeal) -> EngineResult<Appeal>;
    /// Saves an appeal. Appeals are mutated only by the single review
    /// decision, so no compare-and-set is needed.
    fn save_appeal(&self, appeal: &Appeal) -> EngineResult<()>;
}

#[derive(Debug, Default)]
struct StoreInner {
    tasks: BTreeMap<u64, TaskRecord>,
    task_client_ids: HashMap<String, u64>,
    next_task_id: u64,

    attendance: BTreeMap<u64, AttendanceRecord>,
    attendance_client_ids: HashMap<String, u64>,
    next_attendance_id: u64,

    issues: BTreeMap<u64, IssueRecord>,
    issue_client_ids: HashMap<String, u64>,
    next_issue_id: u64,

    appeals: BTreeMap<u64, Appeal>,
    appeal_targets: HashMap<AppealTarget, u64>,
    next_appeal_id: u64,
}

/// In-memory entity store.
///
/// Backs the reference server and tests; a production deployment
/// implements `EntityStore` over its database instead.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks in the store.
    pub fn task_count(&self) -> usize {
        self.inner.read().tasks.len()
    }

    /// Number of attendance records in the store.
    pub fn attendance_count(&self) -> usize {
        self.inner.read().attendance.len()
    }

    /// Number of issues in the store.
    pub fn issue_count(&self) -> usize {
        self.inner.read().issues.len()
    }
}

impl EntityStore for MemoryStore {
    fn task(&self, id: u64) -> EngineResult<Option<TaskRecord>> {
        Ok(self.inner.read().tasks.get(&id).cloned())
    }

    fn task_by_client_id(&self, client_id: &str) -> EngineResult<Option<TaskRecord>> {
        let inner = self.inner.read();
        Ok(inner
            .task_client_ids
            .get(client_id)
            .and_then(|id| inner.tasks.get(id))
            .cloned())
    }

    fn insert_task(&self, mut record: TaskRecord) -> EngineResult<TaskRecord> {
        let mut inner = self.inner.write();
        inner.next_task_id += 1;
        record.id = inner.next_task_id;
        if let Some(client_id) = &record.client_id {
            inner.task_client_ids.insert(client_id.clone(), record.id);
        }
        inner.tasks.insert(record.id, record.clone());
        Ok(record)
    }

    fn save_task(&self, record: &TaskRecord, expected_version: u32) -> EngineResult<()> {
        let mut inner = self.inner.write();
        let current = inner.tasks.get(&record.id).ok_or(EngineError::NotFound {
            entity: "task",
            id: record.id,
        })?;
        if current.server_version != expected_version {
            return Err(EngineError::CasConflict {
                entity: "task",
                id: record.id,
            });
        }
        if let Some(client_id) = &record.client_id {
            inner.task_client_ids.insert(client_id.clone(), record.id);
        }
        inner.tasks.insert(record.id, record.clone());
        Ok(())
    }

    fn tasks_modified_since(
        &self,
        worker_id: u64,
        since: DateTime<Utc>,
    ) -> EngineResult<Vec<TaskRecord>> {
        Ok(self
            .inner
            .read()
            .tasks
            .values()
            .filter(|t| t.worker_id == worker_id && t.updated_at > since)
            .cloned()
            .collect())
    }

    fn attendance(&self, id: u64) -> EngineResult<Option<AttendanceRecord>> {
        Ok(self.inner.read().attendance.get(&id).cloned())
    }

    fn attendance_by_client_id(&self, client_id: &str) -> EngineResult<Option<AttendanceRecord>> {
        let inner = self.inner.read();
        Ok(inner
            .attendance_client_ids
            .get(client_id)
            .and_then(|id| inner.attendance.get(id))
            .cloned())
    }

    fn insert_attendance(&self, mut record: AttendanceRecord) -> EngineResult<AttendanceRecord> {
        let mut inner = self.inner.write();
        inner.next_attendance_id += 1;
        record.id = inner.next_attendance_id;
        if let Some(client_id) = &record.client_id {
            inner
                .attendance_client_ids
                .insert(client_id.clone(), record.id);
        }
        inner.attendance.insert(record.id, record.clone());
        Ok(record)
    }

    fn save_attendance(
        &self,
        record: &AttendanceRecord,
        expected_version: u32,
    ) -> EngineResult<()> {
        let mut inner = self.inner.write();
        let current = inner
            .attendance
            .get(&record.id)
            .ok_or(EngineError::NotFound {
                entity: "attendance",
                id: record.id,
            })?;
        if current.server_version != expected_version {
            return Err(EngineError::CasConflict {
                entity: "attendance",
                id: record.id,
            });
        }
        if let Some(client_id) = &record.client_id {
            inner
                .attendance_client_ids
                .insert(client_id.clone(), record.id);
        }
        inner.attendance.insert(record.id, record.clone());
        Ok(())
    }

    fn attendance_modified_since(
        &self,
        worker_id: u64,
        since: DateTime<Utc>,
    ) -> EngineResult<Vec<AttendanceRecord>> {
        Ok(self
            .inner
            .read()
            .attendance
            .values()
            .filter(|a| a.worker_id == worker_id && a.updated_at > since)
            .cloned()
            .collect())
    }

    fn issue(&self, id: u64) -> EngineResult<Option<IssueRecord>> {
        Ok(self.inner.read().issues.get(&id).cloned())
    }

    fn issue_by_client_id(&self, client_id: &str) -> EngineResult<Option<IssueRecord>> {
        let inner = self.inner.read();
        Ok(inner
            .issue_client_ids
            .get(client_id)
            .and_then(|id| inner.issues.get(id))
            .cloned())
    }

    fn insert_issue(&self, mut record: IssueRecord) -> EngineResult<IssueRecord> {
        let mut inner = self.inner.write();
        inner.next_issue_id += 1;
        record.id = inner.next_issue_id;
        if let Some(client_id) = &record.client_id {
            inner.issue_client_ids.insert(client_id.clone(), record.id);
        }
        inner.issues.insert(record.id, record.clone());
        Ok(record)
    }

    fn save_issue(&self, record: &IssueRecord, expected_version: u32) -> EngineResult<()> {
        let mut inner = self.inner.write();
        let current = inner.issues.get(&record.id).ok_or(EngineError::NotFound {
            entity: "issue",
            id: record.id,
        })?;
        if current.server_version != expected_version {
            return Err(EngineError::CasConflict {
                entity: "issue",
                id: record.id,
            });
        }
        if let Some(client_id) = &record.client_id {
            inner.issue_client_ids.insert(client_id.clone(), record.id);
        }
        inner.issues.insert(record.id, record.clone());
        Ok(())
    }

    fn issues_modified_since(
        &self,
        worker_id: u64,
        since: DateTime<Utc>,
    ) -> EngineResult<Vec<IssueRecord>> {
        Ok(self
            .inner
            .read()
            .issues
            .values()
            .filter(|i| i.worker_id == worker_id && i.updated_at > since)
            .cloned()
            .collect())
    }

    fn appeal(&self, id: u64) -> EngineResult<Option<Appeal>> {
        Ok(self.inner.read().appeals.get(&id).cloned())
    }

    fn appeal_for_target(&self, target: AppealTarget) -> EngineResult<Option<Appeal>> {
        let inner = self.inner.read();
        Ok(inner
            .appeal_targets
            .get(&target)
            .and_then(|id| inner.appeals.get(id))
            .cloned())
    }

    fn insert_appeal(&self, mut appeal: Appeal) -> EngineResult<Appeal> {
        let mut inner = self.inner.write();
        inner.next_appeal_id += 1;
        appeal.id = inner.next_appeal_id;
        inner.appeal_targets.insert(appeal.target, appeal.id);
        inner.appeals.insert(appeal.id, appeal.clone());
        Ok(appeal)
    }

    fn save_appeal(&self, appeal: &Appeal) -> EngineResult<()> {
        let mut inner = self.inner.write();
        if !inner.appeals.contains_key(&appeal.id) {
            return Err(EngineError::NotFound {
                entity: "appeal",
                id: appeal.id,
            });
        }
        inner.appeals.insert(appeal.id, appeal.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fieldsync_model::TaskStatus;

    fn make_task(client_id: Option<&str>) -> TaskRecord {
        TaskRecord {
            id: 0,
            worker_id: 1,
            zone_id: None,
            title: "t".into(),
            status: TaskStatus::Pending,
            completion_notes: None,
            photo_refs: Vec::new(),
            reported_location: None,
            completed_at: None,
            needs_review: false,
            auto_rejected: false,
            rejection_reason: None,
            rejection_distance_meters: None,
            client_id: client_id.map(String::from),
            client_version: 0,
            server_version: 1,
            updated_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.insert_task(make_task(None)).unwrap();
        let b = store.insert_task(make_task(None)).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[test]
    fn client_id_lookup() {
        let store = MemoryStore::new();
        let task = store.insert_task(make_task(Some("dev1-task-1"))).unwrap();
        let found = store.task_by_client_id("dev1-task-1").unwrap().unwrap();
        assert_eq!(found.id, task.id);
        assert!(store.task_by_client_id("unknown").unwrap().is_none());
    }

    #[test]
    fn cas_save_rejects_stale_expectation() {
        let store = MemoryStore::new();
        let mut task = store.insert_task(make_task(None)).unwrap();

        task.status = TaskStatus::InProgress;
        task.server_version = 2;
        store.save_task(&task, 1).unwrap();

        // A writer that read version 1 loses the race.
        let mut stale = task.clone();
        stale.server_version = 2;
        let err = store.save_task(&stale, 1).unwrap_err();
        assert!(matches!(err, EngineError::CasConflict { .. }));
    }

    #[test]
    fn modified_since_filters_by_worker_and_time() {
        let store = MemoryStore::new();
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();

        let mut early = make_task(None);
        early.updated_at = t0;
        store.insert_task(early).unwrap();

        let mut late = make_task(None);
        late.updated_at = t0 + chrono::Duration::hours(2);
        store.insert_task(late).unwrap();

        let mut other_worker = make_task(None);
        other_worker.worker_id = 99;
        other_worker.updated_at = t0 + chrono::Duration::hours(2);
        store.insert_task(other_worker).unwrap();

        let modified = store
            .tasks_modified_since(1, t0 + chrono::Duration::hours(1))
            .unwrap();
        assert_eq!(modified.len(), 1);
    }
}
