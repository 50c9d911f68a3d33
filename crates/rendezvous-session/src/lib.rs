//! Connection handles and session records for Rendezvous.
//!
//! Two small pieces every other layer shares:
//!
//! 1. **[`ConnectionHandle`]**: an opaque, cloneable reference to one
//!    live connection. Rooms hold these as relay targets; the liveness
//!    supervisor holds them to probe and evict.
//! 2. **[`Session`]**: what a connection declared about itself in its
//!    `hello`: room, role, peer id, names. The room registry keeps one per
//!    identified connection.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← stores handles and sessions, runs transitions
//!     ↕
//! Session Layer (this crate)  ← who a connection is, how to reach it
//!     ↕
//! Transport / Protocol (below)  ← ConnectionId, ServerMessage
//! ```

mod error;
mod handle;
mod session;

pub use error::SessionError;
pub use handle::{ConnectionHandle, Outbound, OutboundReceiver};
pub use session::Session;
