//! The signaling relay: the entry point for every inbound payload.
//!
//! `ping` is answered for anyone, `hello` runs the join transitions, and
//! everything else needs an identified sender. Routing is gated by role:
//!
//! | inbound      | sender | goes to                   |
//! |--------------|--------|---------------------------|
//! | `offer`      | host   | joiner `target`           |
//! | `answer`     | joiner | host                      |
//! | `ice`        | host   | joiner `target`           |
//! | `ice`        | joiner | host                      |
//! | `peer-left`  | joiner | (leave transition)        |
//!
//! A host offer to an unknown peer is an error for the sender. A joiner
//! whose room is momentarily headless is silently dropped instead; the
//! joiner will hear about the new host through `host-transfer`.

use std::time::{SystemTime, UNIX_EPOCH};

use rendezvous_protocol::{
    ClientMessage, Inbound, PeerId, ProtocolError, Role, ServerMessage,
};
use rendezvous_session::ConnectionHandle;

use crate::registry::deliver;
use crate::{RoomError, RoomRegistry};

impl RoomRegistry {
    /// Handles one decoded inbound payload from `conn`.
    ///
    /// Failures are reported to the sender as `error{message}`; the
    /// connection stays open and no state changes.
    pub fn handle(
        &mut self,
        conn: &ConnectionHandle,
        inbound: Result<Inbound, ProtocolError>,
    ) {
        if let Err(e) = self.dispatch(conn, inbound) {
            tracing::debug!(conn_id = %conn.id(), error = %e, "rejected message");
            deliver(conn, ServerMessage::error(e.to_string()));
        }
    }

    fn dispatch(
        &mut self,
        conn: &ConnectionHandle,
        inbound: Result<Inbound, ProtocolError>,
    ) -> Result<(), RoomError> {
        let msg = match inbound.map_err(RoomError::Malformed)? {
            Inbound::Message(msg) => msg,
            Inbound::Unrecognized(kind) => {
                return if self.session(conn.id()).is_some() {
                    Err(RoomError::Unhandled(kind))
                } else {
                    Err(RoomError::NotIdentified)
                };
            }
        };

        match msg {
            ClientMessage::Ping => {
                deliver(conn, ServerMessage::Pong { now: unix_millis() });
                Ok(())
            }
            ClientMessage::Hello(hello) => self.hello(conn, &hello),
            other => self.route(conn, other),
        }
    }

    fn route(
        &mut self,
        conn: &ConnectionHandle,
        msg: ClientMessage,
    ) -> Result<(), RoomError> {
        let session = self
            .session(conn.id())
            .cloned()
            .ok_or(RoomError::NotIdentified)?;

        if matches!(msg, ClientMessage::PeerLeft) && session.role == Role::Joiner
        {
            self.release(conn.id());
            return Ok(());
        }

        let room = self
            .room(&session.room)
            .ok_or_else(|| RoomError::RoomGone(session.room.clone()))?;

        match (session.role, msg) {
            (Role::Host, ClientMessage::Offer { target, sdp }) => {
                let joiner = room
                    .joiner(&target)
                    .ok_or(RoomError::UnknownPeer(target))?;
                let (name, player_id) = match room.host_info() {
                    Some(info) => (info.name.clone(), info.player_id.clone()),
                    None => (session.name, session.player_id),
                };
                deliver(
                    &joiner.handle,
                    ServerMessage::Offer {
                        peer_id: PeerId::host(),
                        name,
                        player_id,
                        sdp,
                    },
                );
            }
            (Role::Joiner, ClientMessage::Answer { sdp }) => {
                if let Some(host) = room.host() {
                    deliver(
                        host,
                        ServerMessage::Answer {
                            peer_id: session.peer_id,
                            sdp,
                        },
                    );
                }
            }
            (Role::Host, ClientMessage::Ice { target, candidate }) => {
                if let Some(joiner) = target.as_ref().and_then(|t| room.joiner(t))
                {
                    deliver(
                        &joiner.handle,
                        ServerMessage::Ice {
                            peer_id: PeerId::host(),
                            candidate,
                        },
                    );
                }
            }
            (Role::Joiner, ClientMessage::Ice { candidate, .. }) => {
                if let Some(host) = room.host() {
                    deliver(
                        host,
                        ServerMessage::Ice {
                            peer_id: session.peer_id,
                            candidate,
                        },
                    );
                }
            }
            (_, other) => {
                return Err(RoomError::Unhandled(other.kind().to_owned()));
            }
        }
        Ok(())
    }
}

/// Milliseconds since the Unix epoch, as sent in `pong`.
fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
