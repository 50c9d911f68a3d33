//! Read-only lobby queries over a running server's rooms.

use std::sync::Arc;

use rendezvous_protocol::{RoomCode, RoomSummary};
use rendezvous_room::{RoomError, RoomRegistry};
use tokio::sync::Mutex;

/// Cloneable handle for listing rooms while the server runs.
///
/// Every call takes the registry lock briefly, so a listing is always a
/// consistent snapshot.
#[derive(Clone)]
pub struct Lobby {
    registry: Arc<Mutex<RoomRegistry>>,
}

impl Lobby {
    pub(crate) fn new(registry: Arc<Mutex<RoomRegistry>>) -> Self {
        Self { registry }
    }

    /// Every live room, ordered by code.
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        self.registry.lock().await.list_rooms()
    }

    /// One room's summary.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if the room doesn't exist.
    pub async fn room(&self, code: &RoomCode) -> Result<RoomSummary, RoomError> {
        self.registry.lock().await.room_summary(code)
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.registry.lock().await.room_count()
    }
}

impl std::fmt::Debug for Lobby {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lobby").finish_non_exhaustive()
    }
}
