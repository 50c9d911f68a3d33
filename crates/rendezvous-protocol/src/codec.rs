//! Codec trait and the JSON implementation.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The relay only talks to a [`Codec`]; [`JsonCodec`] is the one the
//! browser clients speak.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{ClientMessage, ProtocolError};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Serializes a value for a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode_text<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use rendezvous_protocol::{ClientMessage, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let msg: ClientMessage = codec.decode(br#"{"type":"ping"}"#).unwrap();
/// assert_eq!(msg, ClientMessage::Ping);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn encode_text<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// Inbound classification
// ---------------------------------------------------------------------------

/// An inbound payload that was at least well-formed.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A message the relay understands.
    Message(ClientMessage),
    /// A well-formed object whose `type` the relay doesn't know.
    Unrecognized(String),
}

#[derive(Deserialize)]
struct TypeTag {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Decodes a client payload, telling unknown message types apart from
/// garbage.
///
/// # Errors
/// - [`ProtocolError::Decode`] when the bytes are not a JSON object
/// - [`ProtocolError::InvalidMessage`] when a known `type` has fields
///   that don't fit it, or `type` is missing
pub fn decode_inbound<C: Codec>(
    codec: &C,
    data: &[u8],
) -> Result<Inbound, ProtocolError> {
    let err = match codec.decode::<ClientMessage>(data) {
        Ok(msg) => return Ok(Inbound::Message(msg)),
        Err(err) => err,
    };

    match codec.decode::<TypeTag>(data)? {
        TypeTag { kind: Some(kind) }
            if !ClientMessage::TYPES.contains(&kind.as_str()) =>
        {
            Ok(Inbound::Unrecognized(kind))
        }
        _ => Err(ProtocolError::InvalidMessage(err.to_string())),
    }
}
