//! Integration tests for the room system: hub membership, routing and
//! fan-out, driven the way the connection handler drives it.

use jukebox_protocol::{
    ClientId, ClientMessage, ControlAction, EditAction, EditList, Mode,
    RoomKey, RoomState, ServerMessage, SyncAction, Track,
};
use jukebox_room::{RoomError, RoomHub, RoomRegistry, RoomStateMachine};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;

type Inbox = mpsc::UnboundedReceiver<ServerMessage>;

// =========================================================================
// Helpers
// =========================================================================

fn cid(id: u64) -> ClientId {
    ClientId(id)
}

fn key(name: &str) -> RoomKey {
    RoomKey::from(name)
}

fn hub() -> RoomHub<StdRng> {
    RoomHub::with_machine(
        RoomRegistry::new(),
        RoomStateMachine::with_rng(StdRng::seed_from_u64(1)),
    )
}

/// Registers a client and returns its inbox.
fn connect(hub: &mut RoomHub<StdRng>, id: u64) -> Inbox {
    let (tx, rx) = mpsc::unbounded_channel();
    hub.connect(cid(id), tx).unwrap();
    rx
}

/// Registers a client, joins it to `room` and drains the snapshot.
fn member(hub: &mut RoomHub<StdRng>, id: u64, room: &str) -> Inbox {
    let mut rx = connect(hub, id);
    hub.join(cid(id), key(room)).unwrap();
    assert!(matches!(rx.try_recv(), Ok(ServerMessage::InitState(_))));
    rx
}

fn drain(rx: &mut Inbox) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

fn add(hub: &mut RoomHub<StdRng>, client: u64, id: &str) {
    hub.handle(cid(client), ClientMessage::AddSong(Track::new(id)))
        .unwrap();
}

// =========================================================================
// Membership
// =========================================================================

#[test]
fn test_join_creates_room_and_sends_empty_snapshot() {
    let mut hub = hub();
    let mut rx = connect(&mut hub, 1);

    hub.join(cid(1), key("drive")).unwrap();

    assert_eq!(hub.room_count(), 1);
    assert_eq!(hub.room_of(cid(1)), Some(&key("drive")));
    assert_eq!(
        drain(&mut rx),
        vec![ServerMessage::InitState(RoomState::default())]
    );
}

#[test]
fn test_snapshot_goes_to_joiner_only() {
    let mut hub = hub();
    let mut first = member(&mut hub, 1, "drive");
    add(&mut hub, 1, "a");
    drain(&mut first);

    let mut second = connect(&mut hub, 2);
    hub.join(cid(2), key("drive")).unwrap();

    assert!(drain(&mut first).is_empty());
    match drain(&mut second).as_slice() {
        [ServerMessage::InitState(state)] => {
            assert_eq!(state.playlist, vec![Track::new("a")]);
        }
        other => panic!("expected one InitState, got {other:?}"),
    }
    assert_eq!(hub.member_count(&key("drive")), 2);
}

#[test]
fn test_join_with_empty_key_is_rejected() {
    let mut hub = hub();
    let mut rx = connect(&mut hub, 1);

    let result = hub.handle(cid(1), ClientMessage::JoinRoom(key("")));

    assert!(matches!(result, Err(RoomError::EmptyKey)));
    assert!(drain(&mut rx).is_empty());
    assert_eq!(hub.room_count(), 0);
    assert_eq!(hub.room_of(cid(1)), None);
}

#[test]
fn test_connect_twice_is_rejected() {
    let mut hub = hub();
    let _rx = connect(&mut hub, 1);
    let (tx, _rx2) = mpsc::unbounded_channel();
    assert!(matches!(
        hub.connect(cid(1), tx),
        Err(RoomError::AlreadyConnected(_))
    ));
}

#[test]
fn test_unknown_client_is_rejected() {
    let mut hub = hub();
    assert!(matches!(
        hub.join(cid(9), key("drive")),
        Err(RoomError::UnknownClient(_))
    ));
    assert!(matches!(
        hub.handle(cid(9), ClientMessage::SongEnded),
        Err(RoomError::UnknownClient(_))
    ));
    assert!(matches!(
        hub.disconnect(cid(9)),
        Err(RoomError::UnknownClient(_))
    ));
}

#[test]
fn test_rejoin_moves_client_between_rooms() {
    let mut hub = hub();
    let mut mover = member(&mut hub, 1, "a");
    let mut stayer = member(&mut hub, 2, "a");

    hub.join(cid(1), key("b")).unwrap();
    drain(&mut mover);
    assert_eq!(hub.member_count(&key("a")), 1);
    assert_eq!(hub.member_count(&key("b")), 1);

    add(&mut hub, 2, "only-in-a");
    assert!(drain(&mut mover).is_empty());
    assert_eq!(drain(&mut stayer).len(), 2);
}

#[test]
fn test_rejoin_same_room_resends_snapshot_once() {
    let mut hub = hub();
    let mut rx = member(&mut hub, 1, "a");

    hub.join(cid(1), key("a")).unwrap();

    assert_eq!(hub.member_count(&key("a")), 1);
    assert!(matches!(
        drain(&mut rx).as_slice(),
        [ServerMessage::InitState(_)]
    ));
}

#[test]
fn test_disconnect_keeps_room_state() {
    let mut hub = hub();
    let _rx = member(&mut hub, 1, "drive");
    add(&mut hub, 1, "a");

    hub.disconnect(cid(1)).unwrap();

    assert_eq!(hub.member_count(&key("drive")), 0);
    assert_eq!(hub.room_count(), 1);
    let state = hub.snapshot(&key("drive")).unwrap();
    assert_eq!(state.playlist, vec![Track::new("a")]);
}

#[test]
fn test_registry_lists_every_joined_room() {
    let mut hub = hub();
    let _a = member(&mut hub, 1, "a");
    let _b = member(&mut hub, 2, "b");
    let _c = connect(&mut hub, 3);
    let _ = hub.join(cid(3), key(""));
    hub.disconnect(cid(1)).unwrap();

    let mut rooms: Vec<RoomKey> = hub.registry().keys().cloned().collect();
    rooms.sort();
    assert_eq!(rooms, vec![key("a"), key("b")]);
    assert!(hub.registry().get(&key("a")).is_some());
}

// =========================================================================
// Routing
// =========================================================================

#[test]
fn test_command_before_join_is_dropped() {
    let mut hub = hub();
    let mut rx = connect(&mut hub, 1);

    let result = hub.handle(cid(1), ClientMessage::AddSong(Track::new("a")));

    assert!(matches!(result, Err(RoomError::NotJoined(_))));
    assert!(drain(&mut rx).is_empty());
    assert_eq!(hub.room_count(), 0);
}

#[test]
fn test_room_events_reach_every_member_and_no_one_else() {
    let mut hub = hub();
    let mut a1 = member(&mut hub, 1, "a");
    let mut a2 = member(&mut hub, 2, "a");
    let mut b1 = member(&mut hub, 3, "b");

    hub.handle(cid(2), ClientMessage::ToggleMode(Mode::Loop))
        .unwrap();

    let expected = vec![ServerMessage::ModeUpdate {
        is_loop: true,
        is_shuffle: false,
    }];
    assert_eq!(drain(&mut a1), expected);
    assert_eq!(drain(&mut a2), expected);
    assert!(drain(&mut b1).is_empty());
    assert!(hub.snapshot(&key("b")).is_some_and(|s| !s.is_loop));
}

#[test]
fn test_first_song_broadcasts_playlist_then_change_song() {
    let mut hub = hub();
    let mut rx = member(&mut hub, 1, "drive");

    add(&mut hub, 1, "x");

    assert_eq!(
        drain(&mut rx),
        vec![
            ServerMessage::UpdatePlaylist(vec![Track::new("x")]),
            ServerMessage::ChangeSong {
                index: 0,
                track_id: "x".into()
            },
        ]
    );
}

#[test]
fn test_no_op_commands_emit_nothing() {
    let mut hub = hub();
    let mut rx = member(&mut hub, 1, "drive");
    add(&mut hub, 1, "a");
    drain(&mut rx);

    for msg in [
        ClientMessage::PlaySpecific(5),
        ClientMessage::Control(ControlAction::Prev),
        ClientMessage::EditList(EditList {
            action: EditAction::Up,
            index: 0,
        }),
        ClientMessage::EditList(EditList {
            action: EditAction::Delete,
            index: 3,
        }),
    ] {
        hub.handle(cid(1), msg).unwrap();
    }

    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_delete_before_current_scenario() {
    let mut hub = hub();
    let mut rx = member(&mut hub, 1, "drive");
    for id in ["a", "b", "c"] {
        add(&mut hub, 1, id);
    }
    hub.handle(cid(1), ClientMessage::PlaySpecific(1)).unwrap();
    drain(&mut rx);

    hub.handle(
        cid(1),
        ClientMessage::EditList(EditList {
            action: EditAction::Delete,
            index: 0,
        }),
    )
    .unwrap();

    assert_eq!(
        drain(&mut rx),
        vec![
            ServerMessage::UpdatePlaylist(vec![
                Track::new("b"),
                Track::new("c")
            ]),
            ServerMessage::UpdateIndex(0),
        ]
    );
    let state = hub.snapshot(&key("drive")).unwrap();
    assert_eq!(state.current_index, 0);
    assert!(state.is_playing);
}

#[test]
fn test_end_of_playlist_stops_every_member() {
    let mut hub = hub();
    let mut a1 = member(&mut hub, 1, "drive");
    let mut a2 = member(&mut hub, 2, "drive");
    add(&mut hub, 1, "only");
    drain(&mut a1);
    drain(&mut a2);

    hub.handle(cid(2), ClientMessage::SongEnded).unwrap();

    let stop = vec![ServerMessage::SyncAction(SyncAction::Stop)];
    assert_eq!(drain(&mut a1), stop);
    assert_eq!(drain(&mut a2), stop);
}

#[test]
fn test_seek_is_broadcast_to_sender_too() {
    let mut hub = hub();
    let mut a1 = member(&mut hub, 1, "drive");
    let mut a2 = member(&mut hub, 2, "drive");

    hub.handle(cid(1), ClientMessage::Seek(90.0)).unwrap();

    assert_eq!(drain(&mut a1), vec![ServerMessage::SyncSeek(90.0)]);
    assert_eq!(drain(&mut a2), vec![ServerMessage::SyncSeek(90.0)]);
}

#[test]
fn test_closed_inbox_does_not_block_others() {
    let mut hub = hub();
    let gone = member(&mut hub, 1, "drive");
    let mut alive = member(&mut hub, 2, "drive");
    drop(gone);

    add(&mut hub, 2, "a");

    assert_eq!(drain(&mut alive).len(), 2);
}
