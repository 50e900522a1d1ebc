//! Wire protocol for Jukebox.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Data model** ([`Track`], [`RoomState`], [`RoomKey`]): the state a
//!   room shares with every viewer.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`], [`Envelope`]):
//!   the named events that travel over a connection.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about connections or room membership.
//!
//! ```text
//! Transport (frames) → Protocol (Envelope) → Room (state machine)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientId, ClientMessage, ControlAction, EditAction, EditList, Envelope,
    Mode, Recipient, RoomKey, RoomState, ServerMessage, SyncAction, Track,
};
