//! Unified error type for the Rendezvous relay.

use rendezvous_protocol::ProtocolError;
use rendezvous_room::RoomError;
use rendezvous_session::SessionError;
use rendezvous_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum RendezvousError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A connection's outbound queue is gone.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level rejection or lobby lookup failure.
    #[error(transparent)]
    Room(#[from] RoomError),
}
