//! # Fieldsync Engine
//!
//! Offline batch reconciliation for field-worker applications.
//!
//! This crate provides:
//! - `SyncCoordinator` processing change batches with per-item isolation
//! - `VersionConflictResolver` (duplicate / override / apply / gap)
//! - Geofence-gated task and attendance state machines
//! - `AppealWorkflow` for human override of automatic rejections
//! - Collaborator traits: `EntityStore`, `Clock`, `Notifier`
//!
//! ## Key invariants
//!
//! - Replaying a `(client_id, client_version)` pair is idempotent: it
//!   returns the previously-assigned identity and version with no new
//!   mutation.
//! - `server_version` never decreases; each accepted mutation increments
//!   it exactly once.
//! - One item's failure never aborts the rest of its batch, and already
//!   committed items stay committed (at-least-once with idempotent
//!   retry, not an all-or-nothing transaction).
//! - Writes go through compare-and-set; a lost race is re-resolved once
//!   before surfacing a conflict result.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod appeal;
mod attendance;
mod clock;
mod config;
mod coordinator;
mod error;
mod issues;
mod notify;
mod resolver;
mod store;
mod tasks;

pub use appeal::AppealWorkflow;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use coordinator::SyncCoordinator;
pub use error::{EngineError, EngineResult};
pub use notify::{NoopNotifier, Notifier, RecordingNotifier, SyncEvent};
pub use resolver::{Resolution, VersionConflictResolver};
pub use store::{EntityStore, MemoryStore};
