//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the reference sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Maximum items accepted in one sync batch.
    pub max_batch_items: usize,
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
    /// Per-connection read timeout.
    pub request_timeout: Duration,
}

impl ServerConfig {
    /// Creates a configuration bound to the given address.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            max_batch_items: 100,
            max_body_bytes: 1 << 20,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the maximum batch size.
    pub fn with_max_batch_items(mut self, max: usize) -> Self {
        self.max_batch_items = max;
        self
    }

    /// Sets the maximum request body size.
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Sets the per-connection read timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 8700)))
    }
}
