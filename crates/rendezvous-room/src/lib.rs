//! Rooms for Rendezvous: the registry, the session state machine, host
//! failover, and the signaling relay.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: owns every live room and every session; all
//!   transitions and the relay entry point ([`RoomRegistry::handle`])
//! - [`Room`]: one room's host slot, joiners, and metadata
//! - [`RoomError`]: rejections, whose text goes back to the client
//!
//! A room exists only while it has a host or a joiner. When the host
//! leaves, the joiner that has waited longest takes over.

mod error;
mod failover;
mod registry;
mod relay;
mod room;

pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{HostInfo, JoinerEntry, Room};
