//! # Fieldsync Sync Server
//!
//! Reference HTTP sync server for Fieldsync.
//!
//! This crate provides:
//! - `RequestHandler` dispatching typed requests into the engine
//! - JSON endpoints for batch sync, changes-since, appeals, and reviews
//! - A minimal HTTP/1.1 listener on tokio (no web framework)
//!
//! # Protocol
//!
//! - `POST /sync/batch` — upload a `SyncBatch`, receive a
//!   `BatchSyncResponse`
//! - `GET /sync/changes?since=<rfc3339>` — server-authoritative changes
//! - `POST /appeals` — submit an appeal against an auto-rejection
//! - `POST /appeals/{id}/review` — supervisor decision on an appeal
//! - `POST /tasks/{id}/review`, `POST /attendance/{id}/review`,
//!   `POST /issues/{id}/review` — supervisor lifecycle decisions
//!
//! Every response is an `ApiEnvelope` JSON object. Worker identity comes
//! from the `x-worker-id` header; issuing and verifying credentials is
//! the fronting auth layer's job, not this server's.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod http;
mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{
    ApiEnvelope, RequestHandler, ReviewAppealRequest, ReviewIssueRequest, ReviewRequest,
    SubmitAppealRequest,
};
pub use server::SyncServer;
