//! # Fieldsync Model
//!
//! Shared data model for Fieldsync.
//!
//! This crate provides:
//! - Versioned entity records (`TaskRecord`, `AttendanceRecord`,
//!   `IssueRecord`) and `Appeal`
//! - Lifecycle enums and their terminal-state predicates
//! - Client change records (`ChangeRecord`, typed per-entity payloads)
//! - Batch sync DTOs (`SyncBatch`, `SyncResult`, `BatchSyncResponse`)
//! - Projection functions from stored records to response views
//!
//! This is a pure types crate with no I/O; every type serializes with
//! serde so callers can pick their own wire format.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod appeal;
mod batch;
mod change;
mod entity;
mod error;
mod status;
mod views;

pub use appeal::{Appeal, AppealTarget, AppealTargetKind};
pub use batch::{BatchSyncResponse, ConflictDescriptor, SyncBatch, SyncResult};
pub use change::{AttendanceChange, ChangePayload, ChangeRecord, IssueChange, TaskChange};
pub use entity::{AttendanceRecord, IssueRecord, TaskRecord};
pub use error::{ModelError, ModelResult};
pub use status::{
    AppealStatus, AttendanceApproval, EntityKind, IssueSeverity, IssueStatus, TaskStatus,
};
pub use views::{
    project_appeal, project_attendance, project_issue, project_task, AppealView, AttendanceView,
    IssueView, ServerChanges, TaskView,
};
