//! `RendezvousServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room registry, with
//! the liveness supervisor running alongside.

use std::sync::Arc;
use std::time::Duration;

use rendezvous_liveness::{LivenessConfig, LivenessSupervisor, LivenessTracker};
use rendezvous_protocol::{Codec, JsonCodec};
use rendezvous_room::RoomRegistry;
use rendezvous_transport::{
    DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_WRITE_TIMEOUT, Handshake, Transport,
    WebSocketTransport,
};
use tokio::sync::Mutex;

use crate::RendezvousError;
use crate::handler::handle_connection;
use crate::lobby::Lobby;

/// Shared server state passed to each connection task.
///
/// The registry mutex is the single serialization point for every room
/// transition in the process.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: Arc<Mutex<RoomRegistry>>,
    pub(crate) liveness: Arc<Mutex<LivenessTracker>>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Rendezvous server.
///
/// # Example
///
/// ```rust,no_run
/// use rendezvous::prelude::*;
///
/// # async fn run() -> Result<(), RendezvousError> {
/// let server = RendezvousServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RendezvousServerBuilder {
    bind_addr: String,
    liveness: LivenessConfig,
    handshake_timeout: Duration,
    write_timeout: Duration,
}

impl RendezvousServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            liveness: LivenessConfig::default(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the liveness sweep configuration.
    pub fn liveness(mut self, config: LivenessConfig) -> Self {
        self.liveness = config;
        self
    }

    /// Sets how long a new client has to complete the WebSocket upgrade.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Sets how long a single write may block before the connection is
    /// dropped as unresponsive.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Binds the listener.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<RendezvousServer, RendezvousError> {
        let transport = WebSocketTransport::bind(&self.bind_addr)
            .await?
            .with_handshake_timeout(self.handshake_timeout)
            .with_write_timeout(self.write_timeout);

        let state = Arc::new(ServerState {
            registry: Arc::new(Mutex::new(RoomRegistry::new())),
            liveness: Arc::new(Mutex::new(LivenessTracker::new())),
            codec: JsonCodec,
        });

        Ok(RendezvousServer {
            transport,
            state,
            liveness: self.liveness.validated(),
        })
    }
}

impl Default for RendezvousServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Rendezvous server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RendezvousServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
    liveness: LivenessConfig,
}

impl RendezvousServer {
    /// Creates a new builder.
    pub fn builder() -> RendezvousServerBuilder {
        RendezvousServerBuilder::new()
    }
}

impl<C: Codec> RendezvousServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Read-only view of the rooms, usable while the server runs.
    pub fn lobby(&self) -> Lobby {
        Lobby::new(Arc::clone(&self.state.registry))
    }

    /// Runs the server accept loop.
    ///
    /// Starts the liveness supervisor, then spawns a task per accepted
    /// connection that completes the upgrade and runs the handler. Runs
    /// until the process is terminated.
    pub async fn run(mut self) -> Result<(), RendezvousError> {
        let _supervisor = LivenessSupervisor::spawn(
            Arc::clone(&self.state.liveness),
            self.liveness,
        );

        match self.transport.local_addr() {
            Ok(addr) => tracing::info!(%addr, "rendezvous server listening"),
            Err(_) => tracing::info!("rendezvous server listening"),
        }

        loop {
            match self.transport.accept().await {
                Ok(pending) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        let conn_id = pending.id();
                        let conn = match pending.complete().await {
                            Ok(conn) => conn,
                            Err(e) => {
                                tracing::debug!(
                                    %conn_id,
                                    error = %e,
                                    "handshake failed"
                                );
                                return;
                            }
                        };
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
