//! Per-connection handler: the only code that touches a socket.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The task waits on two things at once:
//!   - inbound frames → liveness mark, decode, `RoomRegistry::handle`
//!   - its outbound queue → encode and send, probe, or close
//!
//! Every write is bounded by the transport's write timeout. A peer that
//! stops reading makes a write fail, which ends the task the same way a
//! disconnect does, even if its close request is still queued.
//!
//! Room transitions only ever push into outbound queues, so no socket
//! write happens while the registry lock is held.

use std::sync::Arc;

use rendezvous_protocol::{Codec, decode_inbound};
use rendezvous_session::{ConnectionHandle, Outbound};
use rendezvous_transport::{Connection, ConnectionId, Frame, WebSocketConnection};

use crate::RendezvousError;
use crate::server::ServerState;

/// Drop guard that runs the disconnect transition when the handler exits.
///
/// Covers every exit path, panics included. `Drop` is synchronous, so
/// the async locking happens in a fire-and-forget task.
struct ConnectionGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.liveness.lock().await.unregister(conn_id);
            state.registry.lock().await.disconnect(conn_id);
            tracing::debug!(%conn_id, "connection cleaned up");
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), RendezvousError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (handle, mut outbound) = ConnectionHandle::new(conn_id);
    state.liveness.lock().await.register(handle.clone());
    let _guard = ConnectionGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    loop {
        tokio::select! {
            frame = conn.recv() => {
                let frame = match frame {
                    Ok(Some(frame)) => frame,
                    Ok(None) => {
                        tracing::debug!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                };

                state.liveness.lock().await.mark_alive(conn_id);

                if let Frame::Data(data) = frame {
                    let inbound = decode_inbound(&state.codec, &data);
                    if let Err(e) = &inbound {
                        tracing::debug!(%conn_id, error = %e, "undecodable payload");
                    }
                    state.registry.lock().await.handle(&handle, inbound);
                }
            }

            Some(item) = outbound.recv() => match item {
                Outbound::Message(msg) => {
                    let text = state.codec.encode_text(&msg)?;
                    conn.send(&text).await?;
                }
                Outbound::Probe => conn.ping().await?,
                Outbound::Close => {
                    tracing::info!(%conn_id, "closing unresponsive connection");
                    if let Err(e) = conn.close().await {
                        tracing::debug!(%conn_id, error = %e, "close failed");
                    }
                    break;
                }
            },
        }
    }

    // _guard drops here → disconnect transition fires.
    Ok(())
}
