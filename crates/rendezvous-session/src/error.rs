//! Error types for the session layer.

use rendezvous_transport::ConnectionId;

/// Errors that can occur when talking to a connection through its handle.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection's task has finished; nothing reads its outbound
    /// queue anymore.
    #[error("connection {0} is gone")]
    ConnectionGone(ConnectionId),
}
