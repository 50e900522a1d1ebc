//! Room registry: the one owner of every room's state.

use std::collections::HashMap;

use jukebox_protocol::{RoomKey, RoomState};

/// Maps room keys to their playback state.
///
/// Rooms are created on first use and then live for the rest of the
/// process. There is no eviction: an abandoned room costs one playlist's
/// worth of memory.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomKey, RoomState>,
}

impl RoomRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the room for `key`, creating an empty one if needed.
    pub fn get_or_create(&mut self, key: &RoomKey) -> &mut RoomState {
        self.rooms.entry(key.clone()).or_insert_with(|| {
            tracing::info!(room = %key, "room created");
            RoomState::default()
        })
    }

    /// Looks up a room without creating it.
    pub fn get(&self, key: &RoomKey) -> Option<&RoomState> {
        self.rooms.get(key)
    }

    /// Mutable lookup without creating.
    pub fn get_mut(&mut self, key: &RoomKey) -> Option<&mut RoomState> {
        self.rooms.get_mut(key)
    }

    /// Number of rooms ever created.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// `true` until the first room is created.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Keys of all rooms, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &RoomKey> {
        self.rooms.keys()
    }
}
