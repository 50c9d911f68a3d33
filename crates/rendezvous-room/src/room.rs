//! A single room: its host slot, its joiners, and its metadata.
//!
//! `Room` is plain data plus bookkeeping. It never talks to the network
//! and never touches session records; the transitions that do both live
//! in [`RoomRegistry`](crate::RoomRegistry).

use std::collections::BTreeMap;

use rendezvous_protocol::{PeerId, PlayerSummary, RoomCode, RoomMeta, RoomSummary};
use rendezvous_session::ConnectionHandle;

/// Who the current host says they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    /// Display name.
    pub name: String,
    /// External player id.
    pub player_id: String,
}

impl HostInfo {
    /// Name used when a host doesn't give one.
    pub const DEFAULT_NAME: &'static str = "Host";
    /// Player id used when a host doesn't give one.
    pub const DEFAULT_PLAYER_ID: &'static str = "host";
}

/// The occupied host slot.
#[derive(Debug, Clone)]
pub(crate) struct HostSlot {
    pub(crate) handle: ConnectionHandle,
    pub(crate) info: HostInfo,
}

/// A joined peer.
#[derive(Debug, Clone)]
pub struct JoinerEntry {
    /// Relay-assigned id, `peer-<join_seq>`.
    pub peer_id: PeerId,
    /// Where to relay messages for this peer.
    pub handle: ConnectionHandle,
    /// Display name.
    pub name: String,
    /// External player id.
    pub player_id: String,
    /// Position in the room's join order. Breaks failover ties.
    pub join_seq: u64,
}

/// One room's state.
///
/// Invariants, upheld by the registry:
/// - at most one host (the slot is an `Option`);
/// - joiner peer ids are unique and never reused, because `next_seq`
///   only moves forward for the lifetime of the room.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    pub(crate) host: Option<HostSlot>,
    /// Joiners keyed by join sequence number, so iteration is join order.
    pub(crate) joiners: BTreeMap<u64, JoinerEntry>,
    next_seq: u64,
    pub(crate) meta: RoomMeta,
}

impl Room {
    pub(crate) fn new(code: RoomCode) -> Self {
        let meta = RoomMeta::for_code(&code);
        Self {
            code,
            host: None,
            joiners: BTreeMap::new(),
            next_seq: 1,
            meta,
        }
    }

    /// The room's code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// The host's connection, if the slot is occupied.
    pub fn host(&self) -> Option<&ConnectionHandle> {
        self.host.as_ref().map(|slot| &slot.handle)
    }

    /// The host's identity, if the slot is occupied.
    pub fn host_info(&self) -> Option<&HostInfo> {
        self.host.as_ref().map(|slot| &slot.info)
    }

    /// Current room metadata.
    pub fn meta(&self) -> &RoomMeta {
        &self.meta
    }

    /// Joiners in join order.
    pub fn joiners(&self) -> impl Iterator<Item = &JoinerEntry> {
        self.joiners.values()
    }

    /// Number of joiners.
    pub fn joiner_count(&self) -> usize {
        self.joiners.len()
    }

    /// Looks up a joiner by peer id.
    pub fn joiner(&self, peer_id: &PeerId) -> Option<&JoinerEntry> {
        self.joiners.values().find(|j| &j.peer_id == peer_id)
    }

    /// Returns `true` if the host slot is held by `handle`.
    pub fn is_host(&self, handle: &ConnectionHandle) -> bool {
        self.host() == Some(handle)
    }

    /// No host and no joiners: the room should not exist anymore.
    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.joiners.is_empty()
    }

    /// Hands out the next join sequence number.
    pub(crate) fn next_join_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Removes a joiner by peer id, returning its entry.
    pub(crate) fn remove_joiner(
        &mut self,
        peer_id: &PeerId,
    ) -> Option<JoinerEntry> {
        let seq = self
            .joiners
            .values()
            .find(|j| &j.peer_id == peer_id)
            .map(|j| j.join_seq)?;
        self.joiners.remove(&seq)
    }

    /// Builds the lobby view of this room.
    pub fn summary(&self) -> RoomSummary {
        let host = self.host_info().map(|info| PlayerSummary {
            id: info.player_id.clone(),
            name: info.name.clone(),
        });
        let joiners = self.joiners().map(|j| PlayerSummary {
            id: j.player_id.clone(),
            name: j.name.clone(),
        });

        RoomSummary {
            code: self.code.clone(),
            name: self.meta.name.clone(),
            capacity: self.meta.capacity,
            players: host.into_iter().chain(joiners).collect(),
        }
    }
}
