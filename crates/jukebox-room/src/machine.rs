//! The room playback state machine.
//!
//! [`RoomStateMachine::apply`] takes one [`RoomState`] and one client
//! command, mutates the state in place and returns the events to publish,
//! in order, each tagged with its [`Recipient`]. It never touches
//! connections, so every rule here can be tested against a hand-built
//! state.
//!
//! Commands that make no sense for the current state (an index past the
//! end, `prev` on the first track, `up` on the first row) change nothing
//! and return no events. Clients have no handler for errors, so there is
//! nothing to report back.

use jukebox_protocol::{
    ClientMessage, ControlAction, EditAction, EditList, Mode, Recipient,
    RoomState, ServerMessage, SyncAction, Track,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One event produced by a transition.
pub type Outbound = (Recipient, ServerMessage);

/// Applies client commands to room state.
///
/// The only state the machine keeps is its random source, used by shuffle.
/// Rooms are passed in per call and never retained.
#[derive(Debug)]
pub struct RoomStateMachine<R = StdRng> {
    rng: R,
}

impl RoomStateMachine<StdRng> {
    /// A machine seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Default for RoomStateMachine<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RoomStateMachine<R> {
    /// A machine drawing shuffle picks from `rng`.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Applies one command and returns the events it produced.
    pub fn apply(
        &mut self,
        state: &mut RoomState,
        msg: ClientMessage,
    ) -> Vec<Outbound> {
        match msg {
            ClientMessage::JoinRoom(_) => {
                let snapshot = ServerMessage::InitState(state.clone());
                vec![(Recipient::Sender, snapshot)]
            }
            ClientMessage::AddSong(track) => add_song(state, track),
            ClientMessage::ToggleMode(mode) => toggle_mode(state, mode),
            ClientMessage::Control(action) => self.control(state, action),
            ClientMessage::Seek(time) => {
                vec![(Recipient::Room, ServerMessage::SyncSeek(time))]
            }
            ClientMessage::PlaySpecific(index) => play_specific(state, index),
            ClientMessage::EditList(edit) => edit_list(state, edit),
            ClientMessage::SongEnded => self.advance(state),
        }
    }

    fn control(
        &mut self,
        state: &mut RoomState,
        action: ControlAction,
    ) -> Vec<Outbound> {
        match action {
            ControlAction::Play => {
                state.is_playing = true;
                vec![sync(SyncAction::Play)]
            }
            ControlAction::Pause => {
                state.is_playing = false;
                vec![sync(SyncAction::Pause)]
            }
            ControlAction::Next => self.advance(state),
            ControlAction::Prev => {
                if state.current_index == 0 || state.playlist.is_empty() {
                    return Vec::new();
                }
                state.current_index -= 1;
                start_current(state)
            }
        }
    }

    /// Picks the track after the current one, shared by `next` and
    /// `song_ended`.
    fn advance(&mut self, state: &mut RoomState) -> Vec<Outbound> {
        let len = state.playlist.len();
        if len == 0 {
            return Vec::new();
        }

        if state.is_shuffle {
            state.current_index = if len > 1 {
                // Uniform over every position except the current one.
                let offset = self.rng.random_range(0..len - 1);
                (state.current_index + 1 + offset) % len
            } else {
                0
            };
            start_current(state)
        } else if state.current_index + 1 < len {
            state.current_index += 1;
            start_current(state)
        } else if state.is_loop {
            state.current_index = 0;
            start_current(state)
        } else {
            state.is_playing = false;
            vec![sync(SyncAction::Stop)]
        }
    }
}

fn add_song(state: &mut RoomState, track: Track) -> Vec<Outbound> {
    state.playlist.push(track);
    let mut out = vec![playlist_update(state)];

    if state.playlist.len() == 1 {
        state.current_index = 0;
        out.extend(change_song(state));
    }
    out
}

fn toggle_mode(state: &mut RoomState, mode: Mode) -> Vec<Outbound> {
    match mode {
        Mode::Loop => state.is_loop = !state.is_loop,
        Mode::Shuffle => state.is_shuffle = !state.is_shuffle,
    }
    vec![(
        Recipient::Room,
        ServerMessage::ModeUpdate {
            is_loop: state.is_loop,
            is_shuffle: state.is_shuffle,
        },
    )]
}

fn play_specific(state: &mut RoomState, index: i64) -> Vec<Outbound> {
    let Some(index) = position(index, state.playlist.len()) else {
        return Vec::new();
    };
    state.current_index = index;
    start_current(state)
}

fn edit_list(state: &mut RoomState, edit: EditList) -> Vec<Outbound> {
    let len = state.playlist.len();
    let Some(index) = position(edit.index, len) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(3);
    match edit.action {
        EditAction::Delete => {
            state.playlist.remove(index);
            if index < state.current_index {
                state.current_index -= 1;
            } else if index == state.current_index {
                // The slot now holds the following track; it does not
                // start on its own.
                state.is_playing = false;
                out.push(sync(SyncAction::Stop));
            }
            state.current_index = match state.playlist.len() {
                0 => 0,
                n => state.current_index.min(n - 1),
            };
        }
        EditAction::Up => {
            if index == 0 {
                return Vec::new();
            }
            swap(state, index - 1, index);
        }
        EditAction::Down => {
            if index + 1 >= len {
                return Vec::new();
            }
            swap(state, index, index + 1);
        }
    }

    out.push(playlist_update(state));
    out.push((
        Recipient::Room,
        ServerMessage::UpdateIndex(state.current_index),
    ));
    out
}

/// Swaps two adjacent rows, keeping `current_index` on the same track.
fn swap(state: &mut RoomState, upper: usize, lower: usize) {
    state.playlist.swap(upper, lower);
    if state.current_index == upper {
        state.current_index = lower;
    } else if state.current_index == lower {
        state.current_index = upper;
    }
}

/// Converts a client-supplied index into a playlist position.
fn position(index: i64, len: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|i| *i < len)
}

/// Marks the current track as playing and announces it.
fn start_current(state: &mut RoomState) -> Vec<Outbound> {
    state.is_playing = true;
    change_song(state).into_iter().collect()
}

fn change_song(state: &RoomState) -> Option<Outbound> {
    state.current_track().map(|track| {
        (
            Recipient::Room,
            ServerMessage::ChangeSong {
                index: state.current_index,
                track_id: track.id.clone(),
            },
        )
    })
}

fn playlist_update(state: &RoomState) -> Outbound {
    (
        Recipient::Room,
        ServerMessage::UpdatePlaylist(state.playlist.clone()),
    )
}

fn sync(action: SyncAction) -> Outbound {
    (Recipient::Room, ServerMessage::SyncAction(action))
}
