//! Room hub: membership, routing and fan-out.
//!
//! The hub is the single place where connections meet rooms. It remembers
//! which room each client joined, runs that room's state through the
//! [`RoomStateMachine`], and pushes the resulting events into the
//! per-client outbound channels.
//!
//! The hub is not thread-safe by itself. The server keeps exactly one
//! behind a mutex and holds the lock for the whole of
//! [`handle`](RoomHub::handle), so every command finishes (state change
//! plus fan-out) before the next one starts, for any room.

use std::collections::{HashMap, HashSet};

use jukebox_protocol::{
    ClientId, ClientMessage, Recipient, RoomKey, RoomState, ServerMessage,
};
use rand::Rng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;

use crate::machine::Outbound;
use crate::{RoomError, RoomRegistry, RoomStateMachine};

/// Channel sender for delivering outbound events to one client.
pub type ClientSender = mpsc::UnboundedSender<ServerMessage>;

/// A registered client.
#[derive(Debug)]
struct Client {
    sender: ClientSender,
    room: Option<RoomKey>,
}

/// Routes client commands to rooms and room events to clients.
#[derive(Debug)]
pub struct RoomHub<R = StdRng> {
    registry: RoomRegistry,
    machine: RoomStateMachine<R>,
    clients: HashMap<ClientId, Client>,
    /// Subscribers of each room. A client is in at most one set.
    members: HashMap<RoomKey, HashSet<ClientId>>,
}

impl RoomHub<StdRng> {
    /// A hub with an empty registry and an OS-seeded shuffle source.
    pub fn new() -> Self {
        Self::with_machine(RoomRegistry::new(), RoomStateMachine::new())
    }
}

impl Default for RoomHub<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RoomHub<R> {
    /// A hub over an existing registry and machine.
    pub fn with_machine(
        registry: RoomRegistry,
        machine: RoomStateMachine<R>,
    ) -> Self {
        Self {
            registry,
            machine,
            clients: HashMap::new(),
            members: HashMap::new(),
        }
    }

    /// Registers a client's outbound channel.
    pub fn connect(
        &mut self,
        client_id: ClientId,
        sender: ClientSender,
    ) -> Result<(), RoomError> {
        if self.clients.contains_key(&client_id) {
            return Err(RoomError::AlreadyConnected(client_id));
        }
        self.clients.insert(client_id, Client { sender, room: None });
        tracing::debug!(%client_id, "client registered");
        Ok(())
    }

    /// Forgets a client. Its room, and the room's state, stay.
    pub fn disconnect(&mut self, client_id: ClientId) -> Result<(), RoomError> {
        let client = self
            .clients
            .remove(&client_id)
            .ok_or(RoomError::UnknownClient(client_id))?;

        if let Some(room) = client.room {
            self.remove_member(&room, client_id);
            tracing::info!(%client_id, %room, "client left room");
        }
        Ok(())
    }

    /// Puts a client in `room`, creating the room on first use, and sends
    /// it the room's snapshot.
    ///
    /// Joining a second room moves the client: it stops receiving the
    /// first room's events.
    pub fn join(
        &mut self,
        client_id: ClientId,
        room: RoomKey,
    ) -> Result<(), RoomError> {
        if room.is_empty() {
            return Err(RoomError::EmptyKey);
        }
        let client = self
            .clients
            .get_mut(&client_id)
            .ok_or(RoomError::UnknownClient(client_id))?;

        let previous = client.room.replace(room.clone());
        if let Some(previous) = previous.filter(|p| *p != room) {
            self.remove_member(&previous, client_id);
            tracing::info!(%client_id, room = %previous, "client left room");
        }
        self.members.entry(room.clone()).or_default().insert(client_id);

        let state = self.registry.get_or_create(&room);
        let out = self
            .machine
            .apply(state, ClientMessage::JoinRoom(room.clone()));

        tracing::info!(
            %client_id,
            %room,
            members = self.member_count(&room),
            "client joined room"
        );
        self.dispatch(client_id, &room, out);
        Ok(())
    }

    /// Applies one command from a client to the room it joined.
    ///
    /// `join_room` is routed to [`join`](Self::join). Everything else
    /// needs a prior join and fails with [`RoomError::NotJoined`]
    /// otherwise, without emitting anything.
    pub fn handle(
        &mut self,
        client_id: ClientId,
        msg: ClientMessage,
    ) -> Result<(), RoomError> {
        if let ClientMessage::JoinRoom(room) = msg {
            return self.join(client_id, room);
        }

        let room = self
            .clients
            .get(&client_id)
            .ok_or(RoomError::UnknownClient(client_id))?
            .room
            .clone()
            .ok_or(RoomError::NotJoined(client_id))?;

        let state = self
            .registry
            .get_mut(&room)
            .ok_or_else(|| RoomError::NotFound(room.clone()))?;

        let event = msg.event_name();
        let out = self.machine.apply(state, msg);
        tracing::debug!(
            %client_id,
            %room,
            event,
            emitted = out.len(),
            "command applied"
        );

        self.dispatch(client_id, &room, out);
        Ok(())
    }

    /// The room a client is currently in.
    pub fn room_of(&self, client_id: ClientId) -> Option<&RoomKey> {
        self.clients.get(&client_id)?.room.as_ref()
    }

    /// Number of clients currently in `room`.
    pub fn member_count(&self, room: &RoomKey) -> usize {
        self.members.get(room).map_or(0, HashSet::len)
    }

    /// Number of rooms ever created.
    pub fn room_count(&self) -> usize {
        self.registry.len()
    }

    /// A copy of a room's current state.
    pub fn snapshot(&self, room: &RoomKey) -> Option<RoomState> {
        self.registry.get(room).cloned()
    }

    /// Read access to the registry.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    fn remove_member(&mut self, room: &RoomKey, client_id: ClientId) {
        if let Some(set) = self.members.get_mut(room) {
            set.remove(&client_id);
            if set.is_empty() {
                self.members.remove(room);
            }
        }
    }

    /// Delivers events in order. Sends to clients whose receiver is gone
    /// are dropped; their handler is already on its way out.
    fn dispatch(&self, sender: ClientId, room: &RoomKey, out: Vec<Outbound>) {
        for (recipient, msg) in out {
            match recipient {
                Recipient::Sender => self.send_to(sender, msg),
                Recipient::Room => {
                    if let Some(members) = self.members.get(room) {
                        for client_id in members {
                            self.send_to(*client_id, msg.clone());
                        }
                    }
                }
            }
        }
    }

    fn send_to(&self, client_id: ClientId, msg: ServerMessage) {
        if let Some(client) = self.clients.get(&client_id) {
            let _ = client.sender.send(msg);
        }
    }
}
