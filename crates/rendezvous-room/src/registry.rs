//! The room registry: every live room plus the session table, and the
//! transitions that move them.
//!
//! # Concurrency note
//!
//! `RoomRegistry` is NOT thread-safe by itself. The server keeps exactly
//! one behind a single async mutex and every transition (message,
//! disconnect, liveness eviction) runs to completion under that lock.
//! Transitions never await: notifications are pushed into per-connection
//! queues, which never blocks.
//!
//! ## Room lifecycle
//!
//! ```text
//!              host hello                joiner hello
//!   (absent) ─────────────→ HOSTED ─────────────────→ HOSTED+JOINERS
//!      ↑                      │  ↑                        │
//!      │   host leaves,       │  └── last joiner leaves ──┘
//!      └── no joiners ────────┘                           │ host leaves
//!                                                         ▼
//!                                   HEADLESS+JOINERS ──failover──→ HOSTED(+JOINERS)
//! ```

use std::collections::HashMap;

use rendezvous_protocol::{Hello, PeerId, Role, RoomCode, RoomSummary, ServerMessage};
use rendezvous_session::{ConnectionHandle, Session};
use rendezvous_transport::ConnectionId;

use crate::failover::fail_over;
use crate::room::{HostInfo, HostSlot, JoinerEntry, Room};
use crate::RoomError;

/// Process-wide room state, owned explicitly by whoever serves clients.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Live rooms. A room is in here iff it has a host or a joiner.
    rooms: HashMap<RoomCode, Room>,

    /// Session attachment of every identified connection.
    sessions: HashMap<ConnectionId, Session>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // =====================================================================
    // Join
    // =====================================================================

    /// Processes a `hello`.
    ///
    /// An identified connection that says `hello` again releases its old
    /// session first, unless it is the room's host re-announcing itself,
    /// which only refreshes identity and metadata.
    ///
    /// # Errors
    /// - [`RoomError::HostAlreadyConnected`]: another connection is host
    /// - [`RoomError::NoHost`]: a joiner addressed a hostless room
    pub fn hello(
        &mut self,
        conn: &ConnectionHandle,
        hello: &Hello,
    ) -> Result<(), RoomError> {
        let code = hello.room_code();

        // Rejections are decided before the old session is released, so a
        // refused hello leaves the sender where it was.
        match hello.role {
            Role::Host => {
                if let Some(room) = self.rooms.get(&code) {
                    if room.host().is_some() && !room.is_host(conn) {
                        return Err(RoomError::HostAlreadyConnected(code));
                    }
                }
            }
            Role::Joiner => {
                if !self.has_host_after_release(conn, &code) {
                    return Err(RoomError::NoHost(code));
                }
            }
        }

        let refresh = self.sessions.get(&conn.id()).is_some_and(|s| {
            s.is_host() && s.room == code && hello.role == Role::Host
        });
        if !refresh {
            self.release(conn.id());
        }

        match hello.role {
            Role::Host => {
                self.join_as_host(conn, code, hello);
                Ok(())
            }
            Role::Joiner => self.join_as_joiner(conn, code, hello),
        }
    }

    /// Whether `code` will still have a host once `conn` lets go of its
    /// current session. A host stepping down to join its own room only
    /// leaves a host behind if failover has a joiner to promote.
    fn has_host_after_release(&self, conn: &ConnectionHandle, code: &RoomCode) -> bool {
        let Some(room) = self.rooms.get(code) else {
            return false;
        };
        match room.host() {
            None => false,
            Some(_) if room.is_host(conn) => room.joiner_count() > 0,
            Some(_) => true,
        }
    }

    fn join_as_host(
        &mut self,
        conn: &ConnectionHandle,
        code: RoomCode,
        hello: &Hello,
    ) {
        let room = self.rooms.entry(code.clone()).or_insert_with(|| {
            tracing::info!(room = %code, "room created");
            Room::new(code.clone())
        });

        let info = HostInfo {
            name: hello
                .display_name()
                .unwrap_or(HostInfo::DEFAULT_NAME)
                .to_owned(),
            player_id: hello
                .external_player_id()
                .unwrap_or(HostInfo::DEFAULT_PLAYER_ID)
                .to_owned(),
        };

        if let Some(name) = hello.normalized_lobby_name() {
            room.meta.name = name;
        }
        if let Some(capacity) = hello.normalized_capacity() {
            room.meta.capacity = capacity;
        }
        if let Some(options) = &hello.options {
            room.meta.options = Some(options.clone());
        }

        self.sessions.insert(
            conn.id(),
            Session::host(code.clone(), info.name.clone(), info.player_id.clone()),
        );
        room.host = Some(HostSlot {
            handle: conn.clone(),
            info,
        });

        tracing::info!(room = %code, conn_id = %conn.id(), "host joined");
        deliver(
            conn,
            ServerMessage::Welcome {
                id: PeerId::host(),
                meta: room.meta.clone(),
            },
        );
    }

    fn join_as_joiner(
        &mut self,
        conn: &ConnectionHandle,
        code: RoomCode,
        hello: &Hello,
    ) -> Result<(), RoomError> {
        let Some(room) = self.rooms.get_mut(&code) else {
            return Err(RoomError::NoHost(code));
        };
        let Some(host) = room.host().cloned() else {
            return Err(RoomError::NoHost(code));
        };

        let join_seq = room.next_join_seq();
        let peer_id = PeerId::for_join_seq(join_seq);
        let name = hello.display_name().unwrap_or(peer_id.as_str()).to_owned();
        let player_id = hello
            .external_player_id()
            .unwrap_or(peer_id.as_str())
            .to_owned();

        room.joiners.insert(
            join_seq,
            JoinerEntry {
                peer_id: peer_id.clone(),
                handle: conn.clone(),
                name: name.clone(),
                player_id: player_id.clone(),
                join_seq,
            },
        );
        self.sessions.insert(
            conn.id(),
            Session::joiner(code.clone(), join_seq, name.clone(), player_id.clone()),
        );

        tracing::info!(
            room = %code,
            conn_id = %conn.id(),
            %peer_id,
            joiners = room.joiner_count(),
            "joiner joined"
        );

        deliver(
            conn,
            ServerMessage::Welcome {
                id: peer_id.clone(),
                meta: room.meta.clone(),
            },
        );
        deliver(
            &host,
            ServerMessage::JoinRequest {
                peer_id,
                name,
                player_id,
            },
        );
        Ok(())
    }

    // =====================================================================
    // Leave
    // =====================================================================

    /// Connection closed or errored: run the leave or departure transition
    /// for whatever session it had. Unidentified connections are a no-op.
    pub fn disconnect(&mut self, conn_id: ConnectionId) {
        self.release(conn_id);
    }

    /// Clears a connection's session and applies the matching transition:
    ///
    /// - joiner → entry removed, host told `peer-left`
    /// - host → slot cleared, then failover if joiners remain
    ///
    /// Afterwards an empty room is deleted.
    pub(crate) fn release(&mut self, conn_id: ConnectionId) {
        let Some(session) = self.sessions.remove(&conn_id) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&session.room) else {
            return;
        };

        match session.role {
            Role::Joiner => {
                if room.remove_joiner(&session.peer_id).is_some() {
                    tracing::info!(
                        room = %session.room,
                        %conn_id,
                        peer_id = %session.peer_id,
                        "joiner left"
                    );
                    if let Some(host) = room.host() {
                        deliver(
                            host,
                            ServerMessage::PeerLeft {
                                peer_id: session.peer_id.clone(),
                            },
                        );
                    }
                }
            }
            Role::Host => {
                if room.host().is_some_and(|h| h.id() == conn_id) {
                    room.host = None;
                    tracing::info!(room = %session.room, %conn_id, "host left");
                    fail_over(room, &mut self.sessions);
                }
            }
        }

        if room.is_empty() {
            self.rooms.remove(&session.room);
            tracing::info!(room = %session.room, "room deleted");
        }
    }

    // =====================================================================
    // Queries
    // =====================================================================

    /// Looks up a live room.
    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    /// The session attached to a connection, if it has identified.
    pub fn session(&self, conn_id: ConnectionId) -> Option<&Session> {
        self.sessions.get(&conn_id)
    }

    /// Every identified connection and its session.
    pub fn sessions(&self) -> impl Iterator<Item = (ConnectionId, &Session)> {
        self.sessions.iter().map(|(id, s)| (*id, s))
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lobby listing of every live room, ordered by room code.
    pub fn list_rooms(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<&Room> = self.rooms.values().collect();
        rooms.sort_by(|a, b| a.code().cmp(b.code()));
        rooms.into_iter().map(Room::summary).collect()
    }

    /// Lobby view of a single room.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if no such room is live.
    pub fn room_summary(
        &self,
        code: &RoomCode,
    ) -> Result<RoomSummary, RoomError> {
        self.rooms
            .get(code)
            .map(Room::summary)
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }
}

/// Queues a message for a connection. Delivery is best-effort: a
/// connection whose task already exited is logged and skipped.
pub(crate) fn deliver(to: &ConnectionHandle, msg: ServerMessage) {
    if let Err(e) = to.send(msg) {
        tracing::debug!(error = %e, "dropping undeliverable message");
    }
}
