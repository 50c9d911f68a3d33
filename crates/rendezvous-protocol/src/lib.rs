//! Signaling wire protocol for Rendezvous.
//!
//! This crate defines the language clients and the relay speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`RoomMeta`], etc.):
//!   the tagged unions that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`], [`decode_inbound`]): how
//!   those messages are converted to/from bytes, and how unknown message
//!   types are told apart from garbage.
//! - **Normalization** ([`normalize`]): clean-up of the free-text fields
//!   a host sends in its `hello`.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (frames) → Protocol (ClientMessage) → Room (state machine, relay)
//! ```

mod codec;
mod error;
pub mod normalize;
mod types;

pub use codec::{Codec, Inbound, JsonCodec, decode_inbound};
pub use error::ProtocolError;
pub use types::{
    CapacityValue, ClientMessage, DEFAULT_ROOM, Hello, PeerId, PlayerSummary,
    Role, RoomCode, RoomMeta, RoomSummary, ServerMessage,
};
