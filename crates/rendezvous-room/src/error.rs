//! Error types for the room layer.
//!
//! The `Display` text of every variant is exactly what the offending
//! client receives in its `error{message}` reply.

use rendezvous_protocol::{PeerId, ProtocolError, RoomCode};

/// Errors that can occur while handling a client message.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The payload could not be decoded into a message.
    #[error("Invalid message.")]
    Malformed(#[source] ProtocolError),

    /// Anything but `hello`/`ping` from a connection that never said
    /// `hello`.
    #[error("Identify with a hello message first.")]
    NotIdentified,

    /// A second connection tried to claim an occupied host slot.
    #[error("Host already connected for this room.")]
    HostAlreadyConnected(RoomCode),

    /// A joiner addressed a room without a host.
    #[error("No host present in this room.")]
    NoHost(RoomCode),

    /// The sender's room has disappeared underneath its session.
    #[error("Room no longer exists.")]
    RoomGone(RoomCode),

    /// A host-issued offer named a peer that isn't in the room.
    #[error("Peer {0} not found.")]
    UnknownPeer(PeerId),

    /// An unknown message type, or a known one from the wrong role.
    #[error("Unhandled message type: {0}")]
    Unhandled(String),

    /// A lobby lookup for a room that doesn't exist.
    #[error("Room not found")]
    NotFound(RoomCode),
}
