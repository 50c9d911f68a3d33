//! Transport abstraction layer for Rendezvous.
//!
//! Provides the [`Transport`] and [`Connection`] traits the relay is written
//! against. The relay only needs three things from a connection: exchange
//! text frames, send a liveness probe, and be forcibly closable.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{
    DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_WRITE_TIMEOUT, PendingWebSocket,
    WebSocketConnection, WebSocketTransport,
};

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A single inbound frame, as seen by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// An application payload (text or binary frame).
    Data(Vec<u8>),
    /// The peer answered a liveness probe.
    Pong,
}

/// Accepts new incoming connections.
///
/// `accept` only takes a connection off the listener. The protocol
/// handshake happens in [`Handshake::complete`], which callers run off
/// the accept path so a slow client cannot hold up the next one.
pub trait Transport: Send + Sync + 'static {
    /// An accepted connection that has not finished its handshake.
    type Pending: Handshake<Connection = Self::Connection, Error = Self::Error>;
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Pending, Self::Error>;
}

/// The second half of accepting a connection.
pub trait Handshake: Send + 'static {
    /// The connection produced once the handshake succeeds.
    type Connection: Connection;
    /// The error type for a failed handshake.
    type Error: std::error::Error + Send + Sync;

    /// The id the finished connection will carry.
    fn id(&self) -> ConnectionId;

    /// Runs the handshake, bounded by the transport's handshake timeout.
    async fn complete(self) -> Result<Self::Connection, Self::Error>;
}

/// A single bidirectional message channel.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends a UTF-8 text frame to the remote peer.
    async fn send(&self, text: &str) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Frame>, Self::Error>;

    /// Sends a liveness probe. The answer surfaces as [`Frame::Pong`].
    async fn ping(&self) -> Result<(), Self::Error>;

    /// Closes the connection. Like every write, gives up once the
    /// transport's write timeout passes.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
