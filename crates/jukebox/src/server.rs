//! `JukeboxServer` builder and accept loop.
//!
//! This ties the layers together: transport → protocol → room hub.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jukebox_protocol::{Codec, JsonCodec};
use jukebox_room::RoomHub;
use jukebox_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::JukeboxError;
use crate::config::ServerConfig;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// The hub sits behind one mutex for all rooms, so commands are applied
/// one at a time in arrival order.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) hub: Mutex<RoomHub>,
    pub(crate) codec: C,
    pub(crate) started: Instant,
    pub(crate) handshake_timeout: Duration,
}

impl<C: Codec> ServerState<C> {
    /// Milliseconds since the server was built, for envelope timestamps.
    pub(crate) fn uptime_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Builder for configuring and starting a Jukebox server.
///
/// # Example
///
/// ```rust,no_run
/// use jukebox::prelude::*;
///
/// # async fn start() -> Result<(), JukeboxError> {
/// let server = JukeboxServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct JukeboxServerBuilder {
    config: ServerConfig,
}

impl JukeboxServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets how long a peer may take to finish the WebSocket upgrade.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener and builds the server with an empty room hub.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<JukeboxServer<JsonCodec>, JukeboxError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            hub: Mutex::new(RoomHub::new()),
            codec: JsonCodec,
            started: Instant::now(),
            handshake_timeout: self.config.handshake_timeout,
        });

        Ok(JukeboxServer { transport, state })
    }
}

impl Default for JukeboxServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Jukebox server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct JukeboxServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl JukeboxServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> JukeboxServerBuilder {
        JukeboxServerBuilder::new()
    }
}

impl<C: Codec> JukeboxServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), JukeboxError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// Connections already accepted keep running on their own tasks.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), JukeboxError> {
        tracing::info!("Jukebox server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    let rooms = self.state.hub.lock().await.room_count();
                    tracing::info!(rooms, "Jukebox server stopping");
                    return Ok(());
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(pending) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            let result =
                                handle_connection(pending, state).await;
                            if let Err(e) = result {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }
    }
}
