//! # Jukebox
//!
//! Shared listening rooms over WebSocket.
//!
//! Every room holds one playlist and one playback cursor. Any viewer can
//! add, remove or reorder tracks, skip, seek or toggle loop and shuffle;
//! the server applies the command to the room's single authoritative
//! state and pushes the result to every viewer in that room.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jukebox::prelude::*;
//!
//! # async fn start() -> Result<(), JukeboxError> {
//! let server = JukeboxServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_PORT, ServerConfig};
pub use error::JukeboxError;
pub use server::{JukeboxServer, JukeboxServerBuilder};

/// Re-exports of the types most servers and clients need.
pub mod prelude {
    pub use crate::{
        DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_PORT, JukeboxError, JukeboxServer,
        JukeboxServerBuilder, ServerConfig,
    };
    pub use jukebox_protocol::{
        ClientId, ClientMessage, Codec, ControlAction, EditAction, EditList,
        Envelope, JsonCodec, Mode, ProtocolError, Recipient, RoomKey,
        RoomState, ServerMessage, SyncAction, Track,
    };
    pub use jukebox_room::{RoomError, RoomHub, RoomRegistry, RoomStateMachine};
    pub use jukebox_transport::TransportError;
}
