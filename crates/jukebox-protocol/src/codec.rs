//! Codec trait and implementations for serializing/deserializing envelopes.
//!
//! The handler never calls `serde_json` directly; it goes through a
//! [`Codec`], so the wire format can change without touching connection
//! or room code. Frames are text on the way out because browser clients
//! read them with `JSON.parse` on a text WebSocket message.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts values to outbound text frames and inbound frames to values.
///
/// `Send + Sync + 'static` because a single codec instance is shared by
/// every connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into the text of one frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes the payload of one inbound frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] for malformed input or an unknown
    /// event name.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use jukebox_protocol::{ClientMessage, Codec, Envelope, JsonCodec, RoomKey};
///
/// let codec = JsonCodec;
/// let frame = br#"{"payload":{"event":"join_room","data":"drive"}}"#;
///
/// let envelope: Envelope<ClientMessage> = codec.decode(frame).unwrap();
/// assert_eq!(
///     envelope.payload,
///     ClientMessage::JoinRoom(RoomKey::from("drive"))
/// );
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
