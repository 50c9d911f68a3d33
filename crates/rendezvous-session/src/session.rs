//! The session record: what an identified connection is in its room.

use rendezvous_protocol::{PeerId, Role, RoomCode};

/// Per-connection session attachment.
///
/// Set by a successful `hello`, cleared when the connection leaves its
/// room. A joiner's session is rewritten in place if it gets promoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The room this connection belongs to.
    pub room: RoomCode,
    /// Host or joiner.
    pub role: Role,
    /// `"host"` for the host, `"peer-<n>"` for joiners.
    pub peer_id: PeerId,
    /// Display name.
    pub name: String,
    /// External player id.
    pub player_id: String,
    /// Join sequence number. Kept after promotion, but only joiners'
    /// values mean anything.
    pub join_seq: Option<u64>,
}

impl Session {
    /// Session for a connection holding the host slot.
    pub fn host(room: RoomCode, name: String, player_id: String) -> Self {
        Self {
            room,
            role: Role::Host,
            peer_id: PeerId::host(),
            name,
            player_id,
            join_seq: None,
        }
    }

    /// Session for a joiner admitted with sequence number `join_seq`.
    pub fn joiner(
        room: RoomCode,
        join_seq: u64,
        name: String,
        player_id: String,
    ) -> Self {
        Self {
            room,
            role: Role::Joiner,
            peer_id: PeerId::for_join_seq(join_seq),
            name,
            player_id,
            join_seq: Some(join_seq),
        }
    }

    /// Returns `true` if this connection holds its room's host slot.
    pub fn is_host(&self) -> bool {
        self.role == Role::Host
    }

    /// Rewrites a joiner session as the room's host.
    pub fn promote(&mut self) {
        self.role = Role::Host;
        self.peer_id = PeerId::host();
    }
}
