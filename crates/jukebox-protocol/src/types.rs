//! Core protocol types: the room data model and the named events.
//!
//! Every type here travels on the wire. Field and event names follow the
//! browser client's conventions (`camelCase` fields, `snake_case` event
//! names), so the serde attributes matter as much as the Rust shapes.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one connected client.
///
/// The server derives it from the transport's connection id, so it is
/// unique for the lifetime of the process. Serialized as a plain number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// Opaque name of a room, e.g. the path segment a client was opened with.
///
/// Two clients share a playlist exactly when their keys are equal.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomKey(String);

impl RoomKey {
    /// Wraps a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrows the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty key, which never names a room.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for RoomKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for RoomKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Data model
// ---------------------------------------------------------------------------

/// One playable item in a room's playlist.
///
/// `id` is an opaque media reference (a video id, a URL, ...). Tracks are
/// identified by their position, so duplicate ids are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Opaque media reference handed to the client's player.
    pub id: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Who put the track on the playlist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by: Option<String>,
}

impl Track {
    /// A track with only a media id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            added_by: None,
        }
    }
}

/// The authoritative playback state of one room.
///
/// Invariant: `current_index < playlist.len()` whenever the playlist is
/// non-empty, and `current_index == 0` when it is empty.
///
/// Sent whole as the `init_state` snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    /// Tracks in playback order.
    pub playlist: Vec<Track>,
    /// Position of the current track.
    pub current_index: usize,
    /// Whether playback is logically running.
    pub is_playing: bool,
    /// Wrap to the first track after the last one.
    pub is_loop: bool,
    /// Pick the next track at random.
    pub is_shuffle: bool,
}

impl RoomState {
    /// The track `current_index` points at, if the playlist is non-empty.
    pub fn current_track(&self) -> Option<&Track> {
        self.playlist.get(self.current_index)
    }

    /// Checks the index invariant.
    pub fn index_in_bounds(&self) -> bool {
        if self.playlist.is_empty() {
            self.current_index == 0
        } else {
            self.current_index < self.playlist.len()
        }
    }
}

// ---------------------------------------------------------------------------
// Command payloads
// ---------------------------------------------------------------------------

/// The flag a `toggle_mode` flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// `is_loop`
    Loop,
    /// `is_shuffle`
    Shuffle,
}

/// Transport controls a client can press: `{"type": "next"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlAction {
    /// Resume playback.
    Play,
    /// Pause playback.
    Pause,
    /// Skip forward (same selection rules as a track ending).
    Next,
    /// Step back one track.
    Prev,
}

/// A structural playlist edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditAction {
    /// Remove the track.
    Delete,
    /// Swap with the previous track.
    Up,
    /// Swap with the next track.
    Down,
}

/// Payload of `edit_list`.
///
/// `index` is signed so that a negative index from a client decodes and is
/// then ignored like any other out-of-range index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditList {
    /// What to do.
    pub action: EditAction,
    /// Which playlist position to do it to.
    pub index: i64,
}

/// Playback changes pushed to every viewer: `{"type": "stop"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SyncAction {
    /// Start or resume the current track.
    Play,
    /// Pause the current track.
    Pause,
    /// Playback ended or the current track was removed.
    Stop,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Events a client sends.
///
/// Adjacently tagged, so `ClientMessage::Seek(12.5)` is
/// `{"event": "seek", "data": 12.5}` and `SongEnded` is
/// `{"event": "song_ended"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Associate this connection with a room, creating it if needed.
    JoinRoom(RoomKey),
    /// Append a track.
    AddSong(Track),
    /// Flip loop or shuffle.
    ToggleMode(Mode),
    /// Play, pause, next or previous.
    Control(ControlAction),
    /// Jump to a position (seconds) in the current track.
    Seek(f64),
    /// Jump to a playlist position.
    PlaySpecific(i64),
    /// Delete or move a track.
    EditList(EditList),
    /// The client's player reached the end of the current track.
    SongEnded,
}

impl ClientMessage {
    /// The wire name of this event, for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::JoinRoom(_) => "join_room",
            Self::AddSong(_) => "add_song",
            Self::ToggleMode(_) => "toggle_mode",
            Self::Control(_) => "control",
            Self::Seek(_) => "seek",
            Self::PlaySpecific(_) => "play_specific",
            Self::EditList(_) => "edit_list",
            Self::SongEnded => "song_ended",
        }
    }
}

/// Events the server sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full room snapshot, sent only to a client that just joined.
    InitState(RoomState),
    /// The whole playlist after a change.
    UpdatePlaylist(Vec<Track>),
    /// Current loop and shuffle flags.
    #[serde(rename_all = "camelCase")]
    ModeUpdate {
        /// Loop flag.
        is_loop: bool,
        /// Shuffle flag.
        is_shuffle: bool,
    },
    /// Play, pause or stop the current track.
    SyncAction(SyncAction),
    /// Switch to the track at `index` and start it.
    #[serde(rename_all = "camelCase")]
    ChangeSong {
        /// New current position.
        index: usize,
        /// Media id of the track at that position.
        track_id: String,
    },
    /// Seek every player to this position.
    SyncSeek(f64),
    /// The current position after a structural edit.
    UpdateIndex(usize),
}

/// Who a [`ServerMessage`] produced by the room logic is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Only the connection whose command produced the message.
    Sender,
    /// Every connection currently in the room, the sender included.
    Room,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The top-level frame. Every frame on the wire is one envelope.
///
/// `seq` and `timestamp` are stamped by the server on outbound frames
/// (per-connection counter, milliseconds since start). Clients may omit
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Per-connection sequence number.
    #[serde(default)]
    pub seq: u64,

    /// Milliseconds since the sender started.
    #[serde(default)]
    pub timestamp: u64,

    /// The event.
    pub payload: T,
}

// =========================================================================
// Tests
// =========================================================================
