//! Batch sync request and per-item result types.

use crate::change::ChangeRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A batch of locally-recorded changes uploaded by one device.
///
/// Item order defines processing order within the batch but carries no
/// authority; `client_clock` is used only for skew diagnostics, never
/// for ordering decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncBatch {
    /// Uploading device.
    pub device_id: Uuid,
    /// Device wall-clock time at upload.
    pub client_clock: DateTime<Utc>,
    /// Ordered change records.
    pub items: Vec<ChangeRecord>,
}

/// Which fields each side kept when an equal-version conflict was merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictDescriptor {
    /// Server-authoritative fields whose stored values were kept.
    pub kept_fields: Vec<String>,
    /// Client-owned fields whose incoming values were applied.
    pub applied_fields: Vec<String>,
    /// Human-readable summary of the merge.
    pub reason: String,
}

/// Per-item outcome of a batch sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Echo of the client correlation key.
    pub client_id: String,
    /// Assigned or resolved server identity.
    pub server_id: Option<u64>,
    /// Whether the item was accepted (duplicates and merges count as
    /// success).
    pub success: bool,
    /// Failure or informational message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Present when an equal-version conflict was merged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ConflictDescriptor>,
    /// Entity server version after resolution.
    pub server_version: Option<u32>,
}

impl SyncResult {
    /// Successful application of a forward edit.
    pub fn applied(client_id: impl Into<String>, server_id: u64, server_version: u32) -> Self {
        Self {
            client_id: client_id.into(),
            server_id: Some(server_id),
            success: true,
            message: None,
            conflict: None,
            server_version: Some(server_version),
        }
    }

    /// Silent recovery of a stale or duplicate replay.
    pub fn duplicate(client_id: impl Into<String>, server_id: u64, server_version: u32) -> Self {
        Self {
            client_id: client_id.into(),
            server_id: Some(server_id),
            success: true,
            message: None,
            conflict: None,
            server_version: Some(server_version),
        }
    }

    /// Successful merge of an equal-version conflict.
    pub fn overridden(
        client_id: impl Into<String>,
        server_id: u64,
        server_version: u32,
        conflict: ConflictDescriptor,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            server_id: Some(server_id),
            success: true,
            message: None,
            conflict: Some(conflict),
            server_version: Some(server_version),
        }
    }

    /// Per-item failure; the batch continues.
    pub fn failed(client_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            server_id: None,
            success: false,
            message: Some(message.into()),
            conflict: None,
            server_version: None,
        }
    }

    /// Attaches a message to a successful result.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Response to a batch sync call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSyncResponse {
    /// Number of items in the request.
    pub total_items: usize,
    /// Items that succeeded (including duplicates and merges).
    pub success_count: usize,
    /// Items that failed.
    pub failure_count: usize,
    /// Per-item results, in request order.
    pub results: Vec<SyncResult>,
}

impl BatchSyncResponse {
    /// Assembles the response from per-item results.
    pub fn from_results(results: Vec<SyncResult>) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        Self {
            total_items: results.len(),
            success_count,
            failure_count: results.len() - success_count,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_counts_add_up() {
        let response = BatchSyncResponse::from_results(vec![
            SyncResult::applied("a", 1, 2),
            SyncResult::failed("b", "no such task"),
            SyncResult::duplicate("c", 3, 5),
        ]);
        assert_eq!(response.total_items, 3);
        assert_eq!(response.success_count, 2);
        assert_eq!(response.failure_count, 1);
    }

    #[test]
    fn failed_result_has_no_version() {
        let result = SyncResult::failed("x", "malformed payload");
        assert!(!result.success);
        assert_eq!(result.server_version, None);
        assert_eq!(result.message.as_deref(), Some("malformed payload"));
    }

    #[test]
    fn overridden_result_carries_descriptor() {
        let result = SyncResult::overridden(
            "y",
            7,
            4,
            ConflictDescriptor {
                kept_fields: vec!["status".into()],
                applied_fields: vec!["completion_notes".into()],
                reason: "server kept workflow state".into(),
            },
        );
        assert!(result.success);
        let conflict = result.conflict.unwrap();
        assert_eq!(conflict.kept_fields, vec!["status"]);
        assert_eq!(conflict.applied_fields, vec!["completion_notes"]);
    }
}
