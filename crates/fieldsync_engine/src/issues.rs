//! Issue report handling.
//!
//! Issues have no geofence gate: they are created on first sync and
//! accept client-owned field updates afterwards. The lifecycle
//! (`Reported → UnderReview → Resolved | Dismissed`) moves only through
//! supervisor review, outside the batch path.

use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};
use fieldsync_model::{IssueChange, IssueRecord, IssueStatus};

/// Builds a new issue record from its first sync.
pub(crate) fn build_issue(
    worker_id: u64,
    client_id: &str,
    client_version: u32,
    change: &IssueChange,
    clock: &dyn Clock,
) -> IssueRecord {
    IssueRecord {
        id: 0,
        worker_id,
        title: change.title.clone(),
        description: change.description.clone(),
        category: change.category.clone(),
        severity: change.severity,
        status: IssueStatus::Reported,
        location: change.location,
        photo_refs: change.photo_refs.clone(),
        client_id: Some(client_id.to_string()),
        client_version,
        server_version: 1,
        updated_at: clock.now(),
    }
}

/// Supervisor transition of an issue's lifecycle.
pub(crate) fn review(record: &mut IssueRecord, new_status: IssueStatus) -> EngineResult<()> {
    use IssueStatus::*;
    let allowed = matches!(
        (record.status, new_status),
        (Reported, UnderReview)
            | (Reported, Resolved)
            | (Reported, Dismissed)
            | (UnderReview, Resolved)
            | (UnderReview, Dismissed)
    );
    if !allowed {
        return Err(EngineError::InvalidTransition {
            entity: "issue",
            detail: format!("{:?} -> {new_status:?}", record.status),
        });
    }
    record.status = new_status;
    Ok(())
}

/// Client-owned fields in `change` whose values differ from `stored`.
/// Every issue field except `status` is client-owned.
pub(crate) fn diverging_client_fields(stored: &IssueRecord, change: &IssueChange) -> Vec<String> {
    let mut fields = Vec::new();
    if stored.title != change.title {
        fields.push("title".to_string());
    }
    if stored.description != change.description {
        fields.push("description".to_string());
    }
    if stored.category != change.category {
        fields.push("category".to_string());
    }
    if stored.severity != change.severity {
        fields.push("severity".to_string());
    }
    if let Some(location) = &change.location {
        if stored.location.as_ref() != Some(location) {
            fields.push("location".to_string());
        }
    }
    if !change
        .photo_refs
        .iter()
        .all(|r| stored.photo_refs.contains(r))
    {
        fields.push("photo_refs".to_string());
    }
    fields
}

/// Applies client-owned fields from `change`. Photo references append.
pub(crate) fn apply_client_fields(record: &mut IssueRecord, change: &IssueChange) {
    record.title = change.title.clone();
    record.description = change.description.clone();
    record.category = change.category.clone();
    record.severity = change.severity;
    if let Some(location) = change.location {
        record.location = Some(location);
    }
    for photo in &change.photo_refs {
        if !record.photo_refs.contains(photo) {
            record.photo_refs.push(photo.clone());
        }
    }
}
