//! # Rendezvous
//!
//! A signaling relay for peer-to-peer connection setup.
//!
//! One *host* per room exchanges negotiation messages (offers, answers,
//! candidate hints) with any number of *joiners* through the relay. When
//! the host drops, the longest-waiting joiner is promoted and everyone
//! is told who the new host is.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rendezvous::prelude::*;
//!
//! # async fn run() -> Result<(), RendezvousError> {
//! let server = RendezvousServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! let lobby = server.lobby();
//! tokio::spawn(server.run());
//! println!("{} rooms", lobby.room_count().await);
//! # Ok(())
//! # }
//! ```

mod error;
mod handler;
mod lobby;
mod server;

pub use error::RendezvousError;
pub use lobby::Lobby;
pub use server::{RendezvousServer, RendezvousServerBuilder};

/// Everything needed to run a server and read its lobby.
pub mod prelude {
    pub use crate::{Lobby, RendezvousError, RendezvousServer, RendezvousServerBuilder};
    pub use rendezvous_liveness::LivenessConfig;
    pub use rendezvous_protocol::{
        ClientMessage, PeerId, PlayerSummary, Role, RoomCode, RoomMeta,
        RoomSummary, ServerMessage,
    };
    pub use rendezvous_room::RoomError;
}
