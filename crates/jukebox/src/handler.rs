//! Per-connection handler: registration, command routing and delivery.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Finish the WebSocket upgrade within the handshake timeout
//!   2. Register an outbound channel with the room hub
//!   3. Spawn a writer that drains the channel into the socket
//!   4. Loop: receive envelopes → hand the command to the hub
//!
//! Nothing is ever sent back for a bad frame or a rejected command; the
//! reason is logged and the loop moves on.

use std::sync::Arc;

use jukebox_protocol::{
    ClientId, ClientMessage, Codec, Envelope, ServerMessage,
};
use jukebox_transport::{
    Connection, PendingWebSocket, TransportError, Upgrade, WebSocketConnection,
};
use tokio::sync::mpsc;

use crate::JukeboxError;
use crate::server::ServerState;

/// Drop guard that removes the client from the hub when the handler exits.
///
/// Runs on panic too. `Drop` is synchronous, so the async lock is taken
/// on a fire-and-forget task.
struct ClientGuard<C: Codec> {
    client_id: ClientId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for ClientGuard<C> {
    fn drop(&mut self) {
        let client_id = self.client_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let _ = state.hub.lock().await.disconnect(client_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    pending: PendingWebSocket,
    state: Arc<ServerState<C>>,
) -> Result<(), JukeboxError> {
    let client_id = ClientId(pending.id().into_inner());
    let peer = pending.peer_addr();
    let timeout = state.handshake_timeout;

    let conn = match tokio::time::timeout(timeout, pending.upgrade()).await {
        Ok(upgraded) => Arc::new(upgraded?),
        Err(_) => {
            tracing::debug!(%client_id, %peer, "handshake timed out");
            return Err(TransportError::HandshakeTimeout(timeout).into());
        }
    };
    tracing::debug!(%client_id, %peer, "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    state.hub.lock().await.connect(client_id, tx)?;
    let _guard = ClientGuard {
        client_id,
        state: Arc::clone(&state),
    };

    let writer = tokio::spawn(write_loop(
        Arc::clone(&conn),
        Arc::clone(&state),
        client_id,
        rx,
    ));

    read_loop(&conn, &state, client_id).await;

    writer.abort();
    let _ = conn.close().await;
    tracing::info!(%client_id, "connection closed");
    Ok(())
}

/// Decodes inbound frames and applies them until the peer goes away.
async fn read_loop<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    client_id: ClientId,
) {
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%client_id, "peer closed the connection");
                return;
            }
            Err(e) => {
                tracing::debug!(%client_id, error = %e, "recv error");
                return;
            }
        };

        let decoded: Result<Envelope<ClientMessage>, _> =
            state.codec.decode(&data);
        let envelope = match decoded {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(
                    %client_id,
                    error = %e,
                    "dropping undecodable frame"
                );
                continue;
            }
        };

        let event = envelope.payload.event_name();
        let result =
            state.hub.lock().await.handle(client_id, envelope.payload);
        if let Err(e) = result {
            tracing::debug!(%client_id, event, error = %e, "command dropped");
        }
    }
}

/// Stamps and writes every event the hub queues for this client.
///
/// Ends when the hub drops the sender (client disconnected) or the socket
/// stops accepting writes.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    client_id: ClientId,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
) {
    let mut seq: u64 = 1;

    while let Some(payload) = rx.recv().await {
        let envelope = Envelope {
            seq: next_seq(&mut seq),
            timestamp: state.uptime_ms(),
            payload,
        };
        let text = match state.codec.encode(&envelope) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(
                    %client_id,
                    error = %e,
                    "failed to encode event"
                );
                continue;
            }
        };
        if let Err(e) = conn.send(&text).await {
            tracing::debug!(
                %client_id,
                error = %e,
                "send failed, stopping writer"
            );
            return;
        }
    }
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
