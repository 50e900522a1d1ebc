//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Port the server listens on when nothing else is configured.
pub const DEFAULT_PORT: u16 = 3000;

/// How long an accepted peer gets to finish the WebSocket upgrade.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for a [`JukeboxServer`](crate::JukeboxServer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// `host:port` to listen on. Port 0 picks a free port.
    pub bind_addr: String,
    /// Peers that have not upgraded after this long are dropped.
    pub handshake_timeout: Duration,
}

impl ServerConfig {
    /// Listens on all interfaces at `port`.
    pub fn with_port(port: u16) -> Self {
        Self::with_bind_addr(format!("0.0.0.0:{port}"))
    }

    /// Listens on `bind_addr` with default timeouts.
    pub fn with_bind_addr(bind_addr: impl Into<String>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::with_port(DEFAULT_PORT)
    }
}
