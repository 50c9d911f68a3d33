//! Integration tests for the room registry and the signaling relay.
//!
//! Every test drives the registry the way the server does: JSON bytes go
//! through `decode_inbound` into `RoomRegistry::handle`, and whatever the
//! registry queued for each connection is drained afterwards.

use rendezvous_protocol::{
    JsonCodec, PeerId, RoomCode, RoomMeta, ServerMessage, decode_inbound,
};
use rendezvous_room::{RoomError, RoomRegistry};
use rendezvous_session::{ConnectionHandle, Outbound, OutboundReceiver};
use rendezvous_transport::ConnectionId;
use serde_json::{Value, json};

// =========================================================================
// Helpers
// =========================================================================

struct Client {
    handle: ConnectionHandle,
    rx: OutboundReceiver,
}

impl Client {
    fn new(id: u64) -> Self {
        let (handle, rx) = ConnectionHandle::new(ConnectionId::new(id));
        Self { handle, rx }
    }

    fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    fn send(&self, registry: &mut RoomRegistry, msg: Value) {
        let bytes = serde_json::to_vec(&msg).unwrap();
        self.send_raw(registry, &bytes);
    }

    fn send_raw(&self, registry: &mut RoomRegistry, bytes: &[u8]) {
        registry.handle(&self.handle, decode_inbound(&JsonCodec, bytes));
    }

    /// Everything queued for this client since the last drain.
    fn drain(&mut self) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(item) = self.rx.try_recv() {
            match item {
                Outbound::Message(msg) => out.push(msg),
                other => panic!("unexpected outbound item: {other:?}"),
            }
        }
        out
    }

    fn only(&mut self) -> ServerMessage {
        let mut msgs = self.drain();
        assert_eq!(msgs.len(), 1, "expected exactly one message: {msgs:?}");
        msgs.remove(0)
    }
}

fn host_hello(room: &str) -> Value {
    json!({ "type": "hello", "room": room, "role": "host" })
}

fn join_hello(room: &str) -> Value {
    json!({ "type": "hello", "room": room, "role": "join" })
}

fn error(text: &str) -> ServerMessage {
    ServerMessage::error(text)
}

fn code(code: &str) -> RoomCode {
    RoomCode::new(code)
}

/// A room `R1` with a host and `joiners` joiners, all mailboxes drained.
fn hosted_room(
    registry: &mut RoomRegistry,
    joiners: u64,
) -> (Client, Vec<Client>) {
    let mut host = Client::new(100);
    host.send(registry, host_hello("R1"));
    let mut js = Vec::new();
    for i in 1..=joiners {
        let mut j = Client::new(i);
        j.send(
            registry,
            json!({
                "type": "hello", "room": "R1", "role": "join",
                "name": format!("J{i}"), "playerId": format!("p{i}")
            }),
        );
        j.drain();
        js.push(j);
    }
    host.drain();
    (host, js)
}

fn host_count(registry: &RoomRegistry, room: &RoomCode) -> usize {
    registry
        .sessions()
        .filter(|(_, s)| &s.room == room && s.is_host())
        .count()
}

// =========================================================================
// Join transitions
// =========================================================================

#[test]
fn test_host_and_joiner_hello_welcome_and_join_request() {
    let mut registry = RoomRegistry::new();
    let mut host = Client::new(1);
    let mut joiner = Client::new(2);

    host.send(&mut registry, host_hello("R1"));
    assert_eq!(
        host.only(),
        ServerMessage::Welcome {
            id: PeerId::host(),
            meta: RoomMeta::for_code(&code("R1")),
        }
    );

    joiner.send(&mut registry, join_hello("R1"));
    assert_eq!(
        joiner.only(),
        ServerMessage::Welcome {
            id: PeerId::for_join_seq(1),
            meta: RoomMeta::for_code(&code("R1")),
        }
    );
    assert_eq!(
        host.only(),
        ServerMessage::JoinRequest {
            peer_id: PeerId::for_join_seq(1),
            name: "peer-1".into(),
            player_id: "peer-1".into(),
        }
    );
}

#[test]
fn test_hello_without_room_uses_default_room() {
    let mut registry = RoomRegistry::new();
    let host = Client::new(1);

    host.send(&mut registry, json!({ "type": "hello", "role": "host" }));

    assert!(registry.room(&code("default")).is_some());
}

#[test]
fn test_loosely_typed_hello_joins_instead_of_invalid() {
    let mut registry = RoomRegistry::new();
    let mut host = Client::new(1);
    let mut joiner = Client::new(2);

    host.send(
        &mut registry,
        json!({ "type": "hello", "room": 5, "role": "host", "capacity": true }),
    );
    assert_eq!(
        host.only(),
        ServerMessage::Welcome {
            id: PeerId::host(),
            meta: RoomMeta::for_code(&code("5")),
        }
    );

    joiner.send(&mut registry, json!({ "type": "hello", "room": "5", "role": null }));
    assert!(matches!(
        joiner.only(),
        ServerMessage::Welcome { ref id, .. } if id == &PeerId::for_join_seq(1)
    ));
}

#[test]
fn test_host_hello_applies_defaults_and_normalized_meta() {
    let mut registry = RoomRegistry::new();
    let mut host = Client::new(1);

    host.send(
        &mut registry,
        json!({
            "type": "hello", "room": "R1", "role": "host",
            "lobbyName": "  Friday night  ", "capacity": "40 players"
        }),
    );

    let room = registry.room(&code("R1")).unwrap();
    assert_eq!(room.host_info().unwrap().name, "Host");
    assert_eq!(room.host_info().unwrap().player_id, "host");
    assert_eq!(room.meta().name, "Friday night");
    assert_eq!(room.meta().capacity, 16);
    assert!(matches!(host.only(), ServerMessage::Welcome { .. }));
}

#[test]
fn test_joiner_hello_without_host_is_rejected_and_creates_nothing() {
    let mut registry = RoomRegistry::new();
    let mut joiner = Client::new(1);

    joiner.send(&mut registry, join_hello("R9"));

    assert_eq!(joiner.only(), error("No host present in this room."));
    assert_eq!(registry.room_count(), 0);
    assert!(registry.session(joiner.id()).is_none());
}

#[test]
fn test_second_host_claim_is_rejected_first_host_kept() {
    let mut registry = RoomRegistry::new();
    let mut first = Client::new(1);
    let mut second = Client::new(2);

    first.send(&mut registry, host_hello("R1"));
    first.drain();
    second.send(&mut registry, host_hello("R1"));

    assert_eq!(second.only(), error("Host already connected for this room."));
    let room = registry.room(&code("R1")).unwrap();
    assert_eq!(room.host().map(ConnectionHandle::id), Some(first.id()));
    assert!(registry.session(second.id()).is_none());
    assert!(first.drain().is_empty());
}

#[test]
fn test_host_rehello_same_connection_updates_meta_without_duplicate() {
    let mut registry = RoomRegistry::new();
    let (mut host, mut joiners) = hosted_room(&mut registry, 1);

    host.send(
        &mut registry,
        json!({
            "type": "hello", "room": "R1", "role": "host",
            "name": "Ana", "lobbyName": "Renamed", "capacity": 4
        }),
    );

    let ServerMessage::Welcome { id, meta } = host.only() else {
        panic!("expected welcome");
    };
    assert!(id.is_host());
    assert_eq!(meta.name, "Renamed");
    assert_eq!(meta.capacity, 4);

    let room = registry.room(&code("R1")).unwrap();
    assert_eq!(room.host_info().unwrap().name, "Ana");
    assert_eq!(room.joiner_count(), 1);
    assert_eq!(host_count(&registry, &code("R1")), 1);
    assert!(joiners[0].drain().is_empty());
}

#[test]
fn test_host_rehello_keeps_meta_when_fields_absent() {
    let mut registry = RoomRegistry::new();
    let host = Client::new(1);
    host.send(
        &mut registry,
        json!({
            "type": "hello", "room": "R1", "role": "host",
            "lobbyName": "Friday", "capacity": 6
        }),
    );
    host.send(
        &mut registry,
        json!({ "type": "hello", "room": "R1", "role": "host", "lobbyName": "   " }),
    );

    let meta = registry.room(&code("R1")).unwrap().meta().clone();
    assert_eq!(meta.name, "Friday");
    assert_eq!(meta.capacity, 6);
}

#[test]
fn test_joiner_claiming_occupied_host_slot_keeps_its_session() {
    let mut registry = RoomRegistry::new();
    let (mut host, mut joiners) = hosted_room(&mut registry, 1);

    joiners[0].send(&mut registry, host_hello("R1"));

    assert_eq!(
        joiners[0].only(),
        error("Host already connected for this room.")
    );
    let session = registry.session(joiners[0].id()).unwrap();
    assert_eq!(session.peer_id, PeerId::for_join_seq(1));
    assert!(host.drain().is_empty());
}

#[test]
fn test_host_join_hello_to_hostless_room_keeps_hosted_room() {
    let mut registry = RoomRegistry::new();
    let (mut host, mut joiners) = hosted_room(&mut registry, 1);

    host.send(&mut registry, join_hello("R2"));

    assert_eq!(host.only(), error("No host present in this room."));
    let room = registry.room(&code("R1")).unwrap();
    assert_eq!(room.host().map(ConnectionHandle::id), Some(host.id()));
    assert_eq!(room.joiner_count(), 1);
    assert!(registry.session(host.id()).unwrap().is_host());
    assert!(registry.room(&code("R2")).is_none());
    assert!(joiners[0].drain().is_empty());
}

#[test]
fn test_joiner_hello_to_hostless_room_keeps_joiner_session() {
    let mut registry = RoomRegistry::new();
    let (mut host, mut joiners) = hosted_room(&mut registry, 1);

    joiners[0].send(&mut registry, join_hello("R2"));

    assert_eq!(joiners[0].only(), error("No host present in this room."));
    let session = registry.session(joiners[0].id()).unwrap();
    assert_eq!(session.room, code("R1"));
    assert_eq!(session.peer_id, PeerId::for_join_seq(1));
    assert!(host.drain().is_empty());
}

#[test]
fn test_lone_host_joining_own_room_is_rejected_and_room_kept() {
    let mut registry = RoomRegistry::new();
    let (mut host, _) = hosted_room(&mut registry, 0);

    host.send(&mut registry, join_hello("R1"));

    assert_eq!(host.only(), error("No host present in this room."));
    assert!(registry.session(host.id()).unwrap().is_host());
    assert_eq!(registry.room_count(), 1);
}

#[test]
fn test_host_joining_own_room_with_joiners_hands_over_then_joins() {
    let mut registry = RoomRegistry::new();
    let (mut host, mut joiners) = hosted_room(&mut registry, 1);

    host.send(&mut registry, join_hello("R1"));

    assert!(matches!(
        host.only(),
        ServerMessage::Welcome { ref id, .. } if id == &PeerId::for_join_seq(2)
    ));
    let room = registry.room(&code("R1")).unwrap();
    assert_eq!(room.host().map(ConnectionHandle::id), Some(joiners[0].id()));
    assert_eq!(room.joiner_count(), 1);
    assert_eq!(host_count(&registry, &code("R1")), 1);
    let promoted = joiners[0].drain();
    assert!(promoted.iter().any(|m| matches!(
        m,
        ServerMessage::HostTransfer { become_host: true, .. }
    )));
}

#[test]
fn test_rehello_into_other_room_leaves_previous_room() {
    let mut registry = RoomRegistry::new();
    let (mut host, mut joiners) = hosted_room(&mut registry, 1);
    let mut other_host = Client::new(200);
    other_host.send(&mut registry, host_hello("R2"));
    other_host.drain();

    joiners[0].send(&mut registry, join_hello("R2"));

    assert_eq!(
        host.only(),
        ServerMessage::PeerLeft {
            peer_id: PeerId::for_join_seq(1)
        }
    );
    assert!(matches!(
        joiners[0].only(),
        ServerMessage::Welcome { ref id, .. } if id == &PeerId::for_join_seq(1)
    ));
    assert_eq!(registry.session(joiners[0].id()).unwrap().room, code("R2"));
    assert_eq!(registry.room(&code("R1")).unwrap().joiner_count(), 0);
}

// =========================================================================
// Leave, departure, failover
// =========================================================================

#[test]
fn test_host_disconnect_promotes_joiner_and_keeps_room() {
    let mut registry = RoomRegistry::new();
    let (host, mut joiners) = hosted_room(&mut registry, 1);

    registry.disconnect(host.id());

    let ServerMessage::HostTransfer {
        become_host,
        player_id,
        meta,
        ..
    } = joiners[0].only()
    else {
        panic!("expected host-transfer");
    };
    assert!(become_host);
    assert_eq!(player_id, "p1");
    assert!(meta.is_some());

    let room = registry.room(&code("R1")).unwrap();
    assert_eq!(room.host().map(ConnectionHandle::id), Some(joiners[0].id()));
    assert_eq!(room.joiner_count(), 0);
    assert!(registry.session(joiners[0].id()).unwrap().is_host());
}

#[test]
fn test_host_disconnect_without_joiners_deletes_room() {
    let mut registry = RoomRegistry::new();
    let mut host = Client::new(1);
    host.send(&mut registry, host_hello("R2"));

    registry.disconnect(host.id());

    assert!(registry.room(&code("R2")).is_none());
    assert!(registry.list_rooms().is_empty());
    assert_eq!(registry.room_count(), 0);
}

#[test]
fn test_failover_notifies_remaining_joiners_in_join_order() {
    let mut registry = RoomRegistry::new();
    let (host, mut joiners) = hosted_room(&mut registry, 3);

    registry.disconnect(host.id());

    let promoted = joiners[0].drain();
    assert_eq!(promoted.len(), 3);
    assert!(matches!(
        promoted[0],
        ServerMessage::HostTransfer { become_host: true, .. }
    ));
    let replayed: Vec<_> = promoted[1..]
        .iter()
        .map(|m| match m {
            ServerMessage::JoinRequest { peer_id, .. } => peer_id.clone(),
            other => panic!("expected join-request, got {other:?}"),
        })
        .collect();
    assert_eq!(
        replayed,
        [PeerId::for_join_seq(2), PeerId::for_join_seq(3)]
    );

    for j in &mut joiners[1..] {
        assert_eq!(
            j.only(),
            ServerMessage::HostTransfer {
                become_host: false,
                player_id: "p1".into(),
                name: "J1".into(),
                lobby_name: "R1".into(),
                options: None,
                meta: None,
            }
        );
    }
    assert_eq!(host_count(&registry, &code("R1")), 1);
}

#[test]
fn test_host_transfer_echoes_room_options() {
    let mut registry = RoomRegistry::new();
    let mut host = Client::new(100);
    host.send(
        &mut registry,
        json!({
            "type": "hello", "room": "R1", "role": "host",
            "options": { "mode": "coop" }
        }),
    );
    let mut joiner = Client::new(1);
    joiner.send(&mut registry, join_hello("R1"));
    joiner.drain();

    registry.disconnect(host.id());

    let ServerMessage::HostTransfer { options, .. } = joiner.only() else {
        panic!("expected host-transfer");
    };
    assert_eq!(options, Some(json!({ "mode": "coop" })));
}

#[test]
fn test_promoted_host_receives_answers_from_remaining_joiner() {
    let mut registry = RoomRegistry::new();
    let (host, mut joiners) = hosted_room(&mut registry, 2);
    registry.disconnect(host.id());
    joiners[0].drain();
    joiners[1].drain();

    joiners[1].send(&mut registry, json!({ "type": "answer", "sdp": "a" }));

    assert_eq!(
        joiners[0].only(),
        ServerMessage::Answer {
            peer_id: PeerId::for_join_seq(2),
            sdp: json!("a"),
        }
    );
}

#[test]
fn test_joiner_disconnect_notifies_host() {
    let mut registry = RoomRegistry::new();
    let (mut host, joiners) = hosted_room(&mut registry, 2);

    registry.disconnect(joiners[1].id());

    assert_eq!(
        host.only(),
        ServerMessage::PeerLeft {
            peer_id: PeerId::for_join_seq(2)
        }
    );
    assert_eq!(registry.room(&code("R1")).unwrap().joiner_count(), 1);
}

#[test]
fn test_peer_left_clears_session_and_notifies_host() {
    let mut registry = RoomRegistry::new();
    let (mut host, mut joiners) = hosted_room(&mut registry, 1);

    joiners[0].send(&mut registry, json!({ "type": "peer-left" }));

    assert_eq!(
        host.only(),
        ServerMessage::PeerLeft {
            peer_id: PeerId::for_join_seq(1)
        }
    );
    assert!(registry.session(joiners[0].id()).is_none());

    joiners[0].send(&mut registry, json!({ "type": "answer", "sdp": "x" }));
    assert_eq!(
        joiners[0].only(),
        error("Identify with a hello message first.")
    );
}

#[test]
fn test_disconnect_unidentified_connection_is_noop() {
    let mut registry = RoomRegistry::new();
    let (mut host, _joiners) = hosted_room(&mut registry, 1);

    registry.disconnect(ConnectionId::new(999));

    assert!(host.drain().is_empty());
    assert_eq!(registry.room_count(), 1);
}

#[test]
fn test_peer_ids_never_reused_after_leave() {
    let mut registry = RoomRegistry::new();
    let (_host, joiners) = hosted_room(&mut registry, 2);
    registry.disconnect(joiners[1].id());

    let mut late = Client::new(50);
    late.send(&mut registry, join_hello("R1"));

    assert!(matches!(
        late.only(),
        ServerMessage::Welcome { ref id, .. } if id == &PeerId::for_join_seq(3)
    ));
}

#[test]
fn test_last_member_leaving_after_failover_deletes_room() {
    let mut registry = RoomRegistry::new();
    let (host, joiners) = hosted_room(&mut registry, 1);

    registry.disconnect(host.id());
    assert_eq!(registry.room_count(), 1);
    registry.disconnect(joiners[0].id());

    assert_eq!(registry.room_count(), 0);
}

// =========================================================================
// Relay
// =========================================================================

#[test]
fn test_offer_routes_to_target_joiner_with_host_identity() {
    let mut registry = RoomRegistry::new();
    let mut host = Client::new(100);
    host.send(
        &mut registry,
        json!({
            "type": "hello", "room": "R1", "role": "host",
            "name": "Ana", "playerId": "p-ana"
        }),
    );
    let mut joiner = Client::new(1);
    joiner.send(&mut registry, join_hello("R1"));
    joiner.drain();

    host.send(
        &mut registry,
        json!({ "type": "offer", "target": "peer-1", "sdp": { "v": 0 } }),
    );

    assert_eq!(
        joiner.only(),
        ServerMessage::Offer {
            peer_id: PeerId::host(),
            name: "Ana".into(),
            player_id: "p-ana".into(),
            sdp: json!({ "v": 0 }),
        }
    );
}

#[test]
fn test_offer_to_unknown_peer_errors_to_host() {
    let mut registry = RoomRegistry::new();
    let (mut host, _joiners) = hosted_room(&mut registry, 1);

    host.send(
        &mut registry,
        json!({ "type": "offer", "target": "peer-7", "sdp": "x" }),
    );

    assert_eq!(host.only(), error("Peer peer-7 not found."));
}

#[test]
fn test_ice_routes_both_directions() {
    let mut registry = RoomRegistry::new();
    let (mut host, mut joiners) = hosted_room(&mut registry, 1);

    host.send(
        &mut registry,
        json!({ "type": "ice", "target": "peer-1", "candidate": "c1" }),
    );
    joiners[0].send(&mut registry, json!({ "type": "ice", "candidate": "c2" }));

    assert_eq!(
        joiners[0].only(),
        ServerMessage::Ice {
            peer_id: PeerId::host(),
            candidate: json!("c1"),
        }
    );
    assert_eq!(
        host.only(),
        ServerMessage::Ice {
            peer_id: PeerId::for_join_seq(1),
            candidate: json!("c2"),
        }
    );
}

#[test]
fn test_host_ice_to_unknown_or_missing_target_is_dropped() {
    let mut registry = RoomRegistry::new();
    let (mut host, mut joiners) = hosted_room(&mut registry, 1);

    host.send(
        &mut registry,
        json!({ "type": "ice", "target": "peer-9", "candidate": "c" }),
    );
    host.send(&mut registry, json!({ "type": "ice", "candidate": "c" }));

    assert!(host.drain().is_empty());
    assert!(joiners[0].drain().is_empty());
}

#[test]
fn test_answer_from_host_is_unhandled() {
    let mut registry = RoomRegistry::new();
    let (mut host, _joiners) = hosted_room(&mut registry, 1);

    host.send(&mut registry, json!({ "type": "answer", "sdp": "x" }));

    assert_eq!(host.only(), error("Unhandled message type: answer"));
}

#[test]
fn test_offer_from_joiner_is_unhandled() {
    let mut registry = RoomRegistry::new();
    let (mut host, mut joiners) = hosted_room(&mut registry, 1);

    joiners[0].send(
        &mut registry,
        json!({ "type": "offer", "target": "host", "sdp": "x" }),
    );

    assert_eq!(joiners[0].only(), error("Unhandled message type: offer"));
    assert!(host.drain().is_empty());
}

#[test]
fn test_unknown_type_from_identified_connection_is_unhandled() {
    let mut registry = RoomRegistry::new();
    let (mut host, _joiners) = hosted_room(&mut registry, 0);

    host.send(&mut registry, json!({ "type": "chat", "text": "hi" }));

    assert_eq!(host.only(), error("Unhandled message type: chat"));
}

#[test]
fn test_messages_before_hello_require_identification() {
    let mut registry = RoomRegistry::new();
    let mut client = Client::new(1);

    client.send(&mut registry, json!({ "type": "answer", "sdp": "x" }));
    client.send(&mut registry, json!({ "type": "chat" }));

    assert_eq!(
        client.drain(),
        [
            error("Identify with a hello message first."),
            error("Identify with a hello message first."),
        ]
    );
}

#[test]
fn test_ping_before_hello_is_answered_with_pong() {
    let mut registry = RoomRegistry::new();
    let mut client = Client::new(1);

    client.send(&mut registry, json!({ "type": "ping" }));

    let ServerMessage::Pong { now } = client.only() else {
        panic!("expected pong");
    };
    assert!(now > 0);
}

#[test]
fn test_malformed_payload_is_invalid_and_changes_nothing() {
    let mut registry = RoomRegistry::new();
    let (mut host, _joiners) = hosted_room(&mut registry, 1);

    host.send_raw(&mut registry, b"{not json");
    host.send(&mut registry, json!({ "type": "offer", "sdp": "no target" }));

    assert_eq!(
        host.drain(),
        [error("Invalid message."), error("Invalid message.")]
    );
    assert_eq!(registry.room(&code("R1")).unwrap().joiner_count(), 1);
}

// =========================================================================
// Lobby queries
// =========================================================================

#[test]
fn test_list_rooms_sorted_with_host_first() {
    let mut registry = RoomRegistry::new();
    let b = Client::new(10);
    b.send(&mut registry, host_hello("B"));
    let a = Client::new(11);
    a.send(
        &mut registry,
        json!({ "type": "hello", "room": "A", "role": "host", "name": "Ana" }),
    );
    let j = Client::new(12);
    j.send(
        &mut registry,
        json!({ "type": "hello", "room": "A", "name": "Bo", "playerId": "p-bo" }),
    );

    let rooms = registry.list_rooms();

    let codes: Vec<_> = rooms.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, ["A", "B"]);
    let players: Vec<_> = rooms[0]
        .players
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str()))
        .collect();
    assert_eq!(players, [("host", "Ana"), ("p-bo", "Bo")]);
}

#[test]
fn test_room_summary_missing_room_is_not_found() {
    let registry = RoomRegistry::new();

    let result = registry.room_summary(&code("nope"));

    assert!(matches!(result, Err(RoomError::NotFound(c)) if c == code("nope")));
}
