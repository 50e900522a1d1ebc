//! Room state management for Jukebox.
//!
//! Every room is one shared playlist with one playback cursor. Clients
//! send commands, the room's state changes, and every client in the room
//! is told what changed.
//!
//! # Key types
//!
//! - [`RoomStateMachine`]: the transition rules (add, delete, reorder,
//!   seek, mode toggles, track advance)
//! - [`RoomRegistry`]: owns every room's
//!   [`RoomState`](jukebox_protocol::RoomState)
//! - [`RoomHub`]: client membership and event fan-out

mod error;
mod hub;
mod machine;
mod registry;

pub use error::RoomError;
pub use hub::{ClientSender, RoomHub};
pub use machine::{Outbound, RoomStateMachine};
pub use registry::RoomRegistry;
