//! Client-authored change records.
//!
//! One `ChangeRecord` is one locally-recorded mutation. The payload is a
//! typed per-entity enum; projection to and from entity records is done
//! by explicit functions in the engine, not by reflection-style mapping.

use crate::error::{ModelError, ModelResult};
use crate::status::{EntityKind, IssueSeverity, TaskStatus};
use chrono::{DateTime, Utc};
use fieldsync_geo::GeoPoint;
use serde::{Deserialize, Serialize};

/// Maximum length of a title field.
pub(crate) const MAX_TITLE_LEN: usize = 200;
/// Maximum length of notes, reasons, and explanations.
pub(crate) const MAX_NOTES_LEN: usize = 1_000;
/// Maximum length of an issue description.
pub(crate) const MAX_DESCRIPTION_LEN: usize = 2_000;

/// One client-authored mutation inside a sync batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Client-generated correlation key, unique per device, entity type
    /// and logical record.
    pub client_id: String,
    /// Server identity, when the client already knows it.
    pub server_id: Option<u64>,
    /// Client version counter, starting at 0 and incremented on each
    /// local edit.
    pub client_version: u32,
    /// When the client recorded the edit (device clock).
    pub client_timestamp: DateTime<Utc>,
    /// Entity-specific fields.
    pub payload: ChangePayload,
}

impl ChangeRecord {
    /// Entity kind targeted by this record.
    pub fn entity_kind(&self) -> EntityKind {
        self.payload.entity_kind()
    }

    /// Validates the record shape before any reconciliation.
    pub fn validate(&self) -> ModelResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(ModelError::MissingField("client_id"));
        }
        self.payload.validate()
    }
}

/// Entity-specific change payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity_type", rename_all = "snake_case")]
pub enum ChangePayload {
    /// Task progress or completion.
    Task(TaskChange),
    /// Attendance check-in or check-out.
    Attendance(AttendanceChange),
    /// Issue report.
    Issue(IssueChange),
}

impl ChangePayload {
    /// Entity kind of this payload.
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            ChangePayload::Task(_) => EntityKind::Task,
            ChangePayload::Attendance(_) => EntityKind::Attendance,
            ChangePayload::Issue(_) => EntityKind::Issue,
        }
    }

    fn validate(&self) -> ModelResult<()> {
        match self {
            ChangePayload::Task(change) => change.validate(),
            ChangePayload::Attendance(change) => change.validate(),
            ChangePayload::Issue(change) => change.validate(),
        }
    }
}

/// Client-side task mutation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskChange {
    /// Title for an ad-hoc task created offline; ignored on updates.
    pub title: Option<String>,
    /// Requested lifecycle transition, if any.
    pub status: Option<TaskStatus>,
    /// Completion notes (client-owned, append-style).
    pub completion_notes: Option<String>,
    /// Photo references added by the client (client-owned).
    #[serde(default)]
    pub photo_refs: Vec<String>,
    /// When the worker marked the task complete (device clock).
    pub completed_at: Option<DateTime<Utc>>,
    /// Location reported with the mutation (client-owned).
    pub location: Option<GeoPoint>,
}

impl TaskChange {
    fn validate(&self) -> ModelResult<()> {
        if let Some(title) = &self.title {
            if title.len() > MAX_TITLE_LEN {
                return Err(ModelError::FieldTooLong {
                    field: "title",
                    max: MAX_TITLE_LEN,
                });
            }
        }
        if let Some(notes) = &self.completion_notes {
            if notes.len() > MAX_NOTES_LEN {
                return Err(ModelError::FieldTooLong {
                    field: "completion_notes",
                    max: MAX_NOTES_LEN,
                });
            }
        }
        if let Some(location) = &self.location {
            location.validate()?;
        }
        Ok(())
    }
}

/// Client-side attendance mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceChange {
    /// When the worker checked in (device clock).
    pub check_in_at: DateTime<Utc>,
    /// When the worker checked out, if already known.
    pub check_out_at: Option<DateTime<Utc>>,
    /// Reported check-in location; absent when GPS was unavailable.
    pub check_in_location: Option<GeoPoint>,
    /// Reported check-out location.
    pub check_out_location: Option<GeoPoint>,
    /// Reason for a manual (GPS-less) check-in.
    pub manual_reason: Option<String>,
}

impl AttendanceChange {
    fn validate(&self) -> ModelResult<()> {
        if let Some(out) = self.check_out_at {
            if out < self.check_in_at {
                return Err(ModelError::InvalidField {
                    field: "check_out_at",
                    reason: "earlier than check_in_at",
                });
            }
        }
        if let Some(location) = &self.check_in_location {
            location.validate()?;
        }
        if let Some(location) = &self.check_out_location {
            location.validate()?;
        }
        if let Some(reason) = &self.manual_reason {
            if reason.len() > MAX_NOTES_LEN {
                return Err(ModelError::FieldTooLong {
                    field: "manual_reason",
                    max: MAX_NOTES_LEN,
                });
            }
        }
        Ok(())
    }
}

/// Client-side issue report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueChange {
    /// Short summary.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Free-form category.
    pub category: String,
    /// Reported severity.
    pub severity: IssueSeverity,
    /// Where the issue was observed.
    pub location: Option<GeoPoint>,
    /// Photo references (client-owned).
    #[serde(default)]
    pub photo_refs: Vec<String>,
}

impl IssueChange {
    fn validate(&self) -> ModelResult<()> {
        if self.title.trim().is_empty() {
            return Err(ModelError::MissingField("title"));
        }
        if self.title.len() > MAX_TITLE_LEN {
            return Err(ModelError::FieldTooLong {
                field: "title",
                max: MAX_TITLE_LEN,
            });
        }
        if self.description.len() > MAX_DESCRIPTION_LEN {
            return Err(ModelError::FieldTooLong {
                field: "description",
                max: MAX_DESCRIPTION_LEN,
            });
        }
        if let Some(location) = &self.location {
            location.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(payload: ChangePayload) -> ChangeRecord {
        ChangeRecord {
            client_id: "dev1-task-42".into(),
            server_id: None,
            client_version: 0,
            client_timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
            payload,
        }
    }

    #[test]
    fn blank_client_id_rejected() {
        let mut rec = record(ChangePayload::Task(TaskChange::default()));
        rec.client_id = "  ".into();
        assert_eq!(
            rec.validate().unwrap_err(),
            ModelError::MissingField("client_id")
        );
    }

    #[test]
    fn issue_requires_title() {
        let rec = record(ChangePayload::Issue(IssueChange {
            title: "".into(),
            description: "overflowing bin".into(),
            category: "sanitation".into(),
            severity: IssueSeverity::Medium,
            location: None,
            photo_refs: Vec::new(),
        }));
        assert_eq!(
            rec.validate().unwrap_err(),
            ModelError::MissingField("title")
        );
    }

    #[test]
    fn bad_coordinates_rejected() {
        let rec = record(ChangePayload::Task(TaskChange {
            location: Some(GeoPoint::new(123.0, 35.2)),
            ..TaskChange::default()
        }));
        assert!(matches!(
            rec.validate(),
            Err(ModelError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn payload_tag_drives_entity_kind() {
        let rec = record(ChangePayload::Task(TaskChange::default()));
        assert_eq!(rec.entity_kind(), EntityKind::Task);

        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"entity_type\":\"task\""));
        let back: ChangeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, back);
    }
}
