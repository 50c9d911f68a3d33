//! The connection handle: how the rest of the relay reaches a connection.
//!
//! Each connection task owns the receiving end of an unbounded channel and
//! is the only thing that touches the socket. Everybody else holds a
//! [`ConnectionHandle`] and pushes [`Outbound`] items into the channel.
//! Pushing never blocks, so room transitions can notify any number of
//! peers while holding the registry lock.

use std::fmt;

use rendezvous_protocol::ServerMessage;
use rendezvous_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::SessionError;

/// Work queued for a connection task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Encode and send a message.
    Message(ServerMessage),
    /// Send a transport-level liveness probe.
    Probe,
    /// Close the connection. The task runs the normal disconnect path.
    Close,
}

/// Receiving end of a connection's outbound queue.
pub type OutboundReceiver = mpsc::UnboundedReceiver<Outbound>;

/// Cloneable reference to a live connection.
///
/// Two handles are equal when they point at the same connection.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<Outbound>,
}

impl ConnectionHandle {
    /// Creates a handle and the queue its connection task drains.
    pub fn new(id: ConnectionId) -> (Self, OutboundReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { id, sender }, receiver)
    }

    /// The connection this handle points at.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues a message for delivery.
    ///
    /// # Errors
    /// [`SessionError::ConnectionGone`] if the connection task has exited.
    pub fn send(&self, msg: ServerMessage) -> Result<(), SessionError> {
        self.push(Outbound::Message(msg))
    }

    /// Queues a liveness probe.
    pub fn probe(&self) -> Result<(), SessionError> {
        self.push(Outbound::Probe)
    }

    /// Asks the connection task to close the connection.
    pub fn close(&self) -> Result<(), SessionError> {
        self.push(Outbound::Close)
    }

    fn push(&self, item: Outbound) -> Result<(), SessionError> {
        self.sender
            .send(item)
            .map_err(|_| SessionError::ConnectionGone(self.id))
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionHandle").field(&self.id).finish()
    }
}
