//! Error types for the protocol layer.
//!
//! Each crate in Rendezvous defines its own error enum. A `ProtocolError`
//! always means the bytes on the wire were the problem, never the room
//! state behind them.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: the payload is not well-formed JSON, or
    /// not a JSON object at all.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload parsed as JSON and names a known message type, but
    /// its fields do not fit that type (e.g. an `offer` without a
    /// `target`).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
