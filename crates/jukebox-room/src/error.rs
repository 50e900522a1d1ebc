//! Error types for the room layer.
//!
//! None of these reach a client. The connection handler logs them and
//! carries on, which is how an invalid command ends up as a silent no-op.

use jukebox_protocol::{ClientId, RoomKey};

/// Errors that can occur while routing a command to a room.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The client sent a room command before joining any room.
    #[error("client {0} has not joined a room")]
    NotJoined(ClientId),

    /// The hub has no outbound channel for this client.
    #[error("client {0} is not connected")]
    UnknownClient(ClientId),

    /// The client is already registered with the hub.
    #[error("client {0} is already connected")]
    AlreadyConnected(ClientId),

    /// `join_room` carried an empty key.
    #[error("room key must not be empty")]
    EmptyKey,

    /// A client is associated with a room the registry does not know.
    #[error("room {0} not found")]
    NotFound(RoomKey),
}
