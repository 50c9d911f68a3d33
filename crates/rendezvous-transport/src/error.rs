//! Errors raised while accepting, upgrading, or talking to a connection.

use std::time::Duration;

/// Transport failure. None of these are shown to clients; they end the
/// connection they happened on and get logged.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not be bound.
    #[error("bind to {addr} failed: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Taking the next TCP connection off the listener failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// The client did not finish the upgrade handshake in time.
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// A write did not complete in time. The peer stopped reading.
    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// The WebSocket layer failed (handshake, framing, or socket I/O).
    #[error("websocket: {0}")]
    WebSocket(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "websocket")]
impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(e))
    }
}
