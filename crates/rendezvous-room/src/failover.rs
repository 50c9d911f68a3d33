//! Host failover: hand a headless room to its longest-waiting joiner.

use std::collections::HashMap;

use rendezvous_protocol::ServerMessage;
use rendezvous_session::Session;
use rendezvous_transport::ConnectionId;

use crate::registry::deliver;
use crate::room::{HostInfo, HostSlot, Room};

/// Promotes the earliest joiner of a room whose host slot was just cleared.
///
/// The candidate is the joiner with the smallest join sequence number,
/// ties broken by peer id. Its joiner entry is deleted and its session
/// rewritten as host. Notifications, in order:
///
/// 1. promoted peer: `host-transfer` with `becomeHost` and the room meta;
/// 2. for every remaining joiner, in join order: `host-transfer` to that
///    joiner, then a synthetic `join-request` for it to the new host.
///
/// Does nothing if the room has no joiners or still has a host.
pub(crate) fn fail_over(
    room: &mut Room,
    sessions: &mut HashMap<ConnectionId, Session>,
) {
    if room.host.is_some() {
        return;
    }

    let Some(seq) = room
        .joiners
        .values()
        .min_by(|a, b| {
            a.join_seq
                .cmp(&b.join_seq)
                .then_with(|| a.peer_id.cmp(&b.peer_id))
        })
        .map(|j| j.join_seq)
    else {
        return;
    };
    let Some(promoted) = room.joiners.remove(&seq) else {
        return;
    };

    if let Some(session) = sessions.get_mut(&promoted.handle.id()) {
        session.promote();
    }

    let info = HostInfo {
        name: promoted.name.clone(),
        player_id: promoted.player_id.clone(),
    };
    room.host = Some(HostSlot {
        handle: promoted.handle.clone(),
        info: info.clone(),
    });

    tracing::info!(
        room = %room.code(),
        conn_id = %promoted.handle.id(),
        former_peer_id = %promoted.peer_id,
        remaining = room.joiner_count(),
        "joiner promoted to host"
    );

    let meta = room.meta.clone();
    deliver(
        &promoted.handle,
        ServerMessage::HostTransfer {
            become_host: true,
            player_id: info.player_id.clone(),
            name: info.name.clone(),
            lobby_name: meta.name.clone(),
            options: meta.options.clone(),
            meta: Some(meta.clone()),
        },
    );

    for joiner in room.joiners.values() {
        deliver(
            &joiner.handle,
            ServerMessage::HostTransfer {
                become_host: false,
                player_id: info.player_id.clone(),
                name: info.name.clone(),
                lobby_name: meta.name.clone(),
                options: meta.options.clone(),
                meta: None,
            },
        );
        deliver(
            &promoted.handle,
            ServerMessage::JoinRequest {
                peer_id: joiner.peer_id.clone(),
                name: joiner.name.clone(),
                player_id: joiner.player_id.clone(),
            },
        );
    }
}
