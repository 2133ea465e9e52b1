//! Error taxonomy for the reconciliation engine.
//!
//! Only `StorageUnavailable` is fatal for a whole batch; every other
//! variant is converted into a failed per-item `SyncResult` and the
//! batch continues.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised during reconciliation.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed payload: missing field, out-of-range coordinate.
    #[error("validation failed: {0}")]
    Validation(#[from] fieldsync_model::ModelError),

    /// The client jumped more than one version ahead; it must resync
    /// full state before submitting further edits.
    #[error("version gap: stored {stored}, incoming {incoming}; full resync required")]
    VersionGap {
        /// Last client version applied on the server.
        stored: u32,
        /// Version the client submitted.
        incoming: u32,
    },

    /// A lifecycle transition the state machine does not allow.
    #[error("invalid {entity} transition: {detail}")]
    InvalidTransition {
        /// Entity kind name.
        entity: &'static str,
        /// What was attempted.
        detail: String,
    },

    /// Referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind name.
        entity: &'static str,
        /// Requested id.
        id: u64,
    },

    /// Geometry failure while validating a location.
    #[error("geofence validation failed: {0}")]
    Geo(#[from] fieldsync_geo::GeoError),

    /// Appeal submission or review violated the appeal rules.
    #[error("invalid appeal: {0}")]
    Appeal(String),

    /// A compare-and-set save lost the race twice.
    #[error("concurrent update on {entity} {id}, retry the item")]
    CasConflict {
        /// Entity kind name.
        entity: &'static str,
        /// Contended id.
        id: u64,
    },

    /// The persistence collaborator cannot be reached. Fatal for the
    /// whole batch; the caller retries the entire batch later.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl EngineError {
    /// Returns true if the error must abort the whole batch instead of
    /// failing a single item.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, EngineError::StorageUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_errors_are_batch_fatal() {
        assert!(EngineError::StorageUnavailable("down".into()).is_batch_fatal());
        assert!(!EngineError::VersionGap {
            stored: 2,
            incoming: 5
        }
        .is_batch_fatal());
        assert!(!EngineError::NotFound {
            entity: "task",
            id: 9
        }
        .is_batch_fatal());
    }

    #[test]
    fn gap_message_requests_resync() {
        let err = EngineError::VersionGap {
            stored: 2,
            incoming: 5,
        };
        assert!(err.to_string().contains("full resync required"));
    }
}
