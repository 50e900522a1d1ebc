//! Unified error type for the Jukebox server.

use jukebox_protocol::ProtocolError;
use jukebox_room::RoomError;
use jukebox_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` conversions let `?` lift sub-crate errors in the server
/// and handler code.
#[derive(Debug, thiserror::Error)]
pub enum JukeboxError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not joined, unknown client).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use jukebox_protocol::{ClientId, ClientMessage, Codec, JsonCodec};

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let jukebox_err: JukeboxError = err.into();
        assert!(matches!(jukebox_err, JukeboxError::Transport(_)));
        assert!(jukebox_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_decode_failure() {
        let err = JsonCodec
            .decode::<ClientMessage>(b"not json")
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));

        let jukebox_err: JukeboxError = err.into();
        assert!(matches!(jukebox_err, JukeboxError::Protocol(_)));
        assert!(jukebox_err.to_string().starts_with("decode failed"));
    }

    #[test]
    fn test_from_room_error_keeps_message() {
        let err = RoomError::NotJoined(ClientId(3));
        let jukebox_err: JukeboxError = err.into();
        assert!(matches!(jukebox_err, JukeboxError::Room(_)));
        assert_eq!(jukebox_err.to_string(), "client C-3 has not joined a room");
    }
}
