//! Error types for the reference server.

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while serving sync requests.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The request was malformed or violated a server limit.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The engine rejected the operation.
    #[error(transparent)]
    Engine(#[from] fieldsync_engine::EngineError),

    /// Body encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Socket-level failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// HTTP status code this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) | ServerError::Json(_) => 400,
            ServerError::Engine(e) if e.is_batch_fatal() => 503,
            ServerError::Engine(fieldsync_engine::EngineError::NotFound { .. }) => 404,
            ServerError::Engine(_) => 422,
            ServerError::Io(_) => 500,
        }
    }
}
