//! Typed request handlers.
//!
//! Each handler validates server-level limits, delegates to the engine,
//! and shapes the result for the wire. The HTTP layer stays dumb: it
//! parses framing and routes here.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use chrono::{DateTime, Utc};
use fieldsync_engine::{AppealWorkflow, EntityStore, SyncCoordinator};
use fieldsync_model::{
    project_appeal, project_attendance, project_issue, project_task, AppealTarget,
    AppealTargetKind, AppealView, AttendanceView, BatchSyncResponse, IssueStatus, IssueView,
    ServerChanges, SyncBatch, TaskView,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Uniform response envelope, mirroring what the mobile clients expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the request was handled.
    pub success: bool,
    /// Payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed envelope.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Appeal submission body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAppealRequest {
    /// Kind of rejected entity.
    pub kind: AppealTargetKind,
    /// Rejected entity id.
    pub entity_id: u64,
    /// Worker's explanation.
    pub explanation: String,
    /// Optional evidence photo reference.
    pub evidence_ref: Option<String>,
}

/// Appeal review body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewAppealRequest {
    /// Supervisor decision.
    pub approved: bool,
    /// Supervisor notes.
    pub notes: Option<String>,
}

/// Generic supervisor review body for tasks and attendance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Supervisor decision.
    pub approved: bool,
}

/// Issue review body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewIssueRequest {
    /// Target lifecycle state.
    pub status: IssueStatus,
}

/// Dispatches validated requests into the engine.
pub struct RequestHandler<S: EntityStore> {
    config: ServerConfig,
    coordinator: SyncCoordinator<S>,
    appeals: AppealWorkflow<S>,
}

impl<S: EntityStore> RequestHandler<S> {
    /// Creates a handler over a wired coordinator and appeal workflow.
    pub fn new(
        config: ServerConfig,
        coordinator: SyncCoordinator<S>,
        appeals: AppealWorkflow<S>,
    ) -> Self {
        Self {
            config,
            coordinator,
            appeals,
        }
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Handles a batch upload for the authenticated worker.
    pub fn handle_batch(
        &self,
        worker_id: u64,
        batch: &SyncBatch,
    ) -> ServerResult<BatchSyncResponse> {
        if batch.items.is_empty() {
            return Err(ServerError::InvalidRequest("batch has no items".into()));
        }
        if batch.items.len() > self.config.max_batch_items {
            return Err(ServerError::InvalidRequest(format!(
                "batch has {} items, limit is {}",
                batch.items.len(),
                self.config.max_batch_items
            )));
        }
        Ok(self.coordinator.process_batch(worker_id, batch)?)
    }

    /// Handles a changes-since download.
    pub fn handle_changes(
        &self,
        worker_id: u64,
        since: DateTime<Utc>,
    ) -> ServerResult<ServerChanges> {
        Ok(self.coordinator.changes_since(worker_id, since)?)
    }

    /// Handles an appeal submission.
    pub fn handle_appeal_submit(
        &self,
        worker_id: u64,
        request: SubmitAppealRequest,
    ) -> ServerResult<AppealView> {
        let appeal = self.appeals.submit(
            AppealTarget {
                kind: request.kind,
                entity_id: request.entity_id,
            },
            worker_id,
            request.explanation,
            request.evidence_ref,
        )?;
        Ok(project_appeal(&appeal))
    }

    /// Handles an appeal review decision.
    pub fn handle_appeal_review(
        &self,
        appeal_id: u64,
        request: ReviewAppealRequest,
    ) -> ServerResult<AppealView> {
        let appeal = self
            .appeals
            .review(appeal_id, request.approved, request.notes)?;
        info!(appeal_id, approved = request.approved, "appeal decided");
        Ok(project_appeal(&appeal))
    }

    /// Handles a supervisor decision on a completed task.
    pub fn handle_task_review(&self, task_id: u64, request: ReviewRequest) -> ServerResult<TaskView> {
        let task = self.coordinator.review_task(task_id, request.approved)?;
        Ok(project_task(&task))
    }

    /// Handles a supervisor decision on a pending attendance record.
    pub fn handle_attendance_review(
        &self,
        attendance_id: u64,
        request: ReviewRequest,
    ) -> ServerResult<AttendanceView> {
        let record = self
            .coordinator
            .review_manual_attendance(attendance_id, request.approved)?;
        Ok(project_attendance(&record))
    }

    /// Handles a supervisor transition of an issue.
    pub fn handle_issue_review(
        &self,
        issue_id: u64,
        request: ReviewIssueRequest,
    ) -> ServerResult<IssueView> {
        let record = self.coordinator.review_issue(issue_id, request.status)?;
        Ok(project_issue(&record))
    }
}
