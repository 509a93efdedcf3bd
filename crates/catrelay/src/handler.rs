//! Per-connection handler: attach to the relay, pump frames both ways.
//!
//! Each accepted connection gets its own Tokio task running this handler
//! plus a writer task:
//!   1. Attach an outbound queue to the relay actor
//!   2. Writer: drain the queue → encode → send text frames
//!   3. Reader: receive frames → decode → submit to the relay
//!   4. On any exit, detach from the relay exactly once

use std::sync::Arc;

use catrelay_hub::RelayHandle;
use catrelay_protocol::{ClientEvent, Codec, ConnectionId, ServerEvent};
use catrelay_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::CatrelayError;
use crate::server::ServerState;

/// Drop guard that detaches the connection from the relay when the handler
/// exits, however it exits.
///
/// `Drop` is synchronous, so the detach is sent from a spawned task.
struct DisconnectGuard {
    conn_id: ConnectionId,
    relay: RelayHandle,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let relay = self.relay.clone();
        // No runtime means the process is tearing down with the relay.
        if let Ok(rt) = tokio::runtime::Handle::try_current() {
            rt.spawn(async move {
                let _ = relay.disconnect(conn_id).await;
            });
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), CatrelayError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::info!(%conn_id, peer = %conn.peer_addr(), "connection opened");

    let (tx, rx) = mpsc::channel(state.outbound_buffer);
    state.relay.connect(conn_id, tx).await?;
    let _guard = DisconnectGuard {
        conn_id,
        relay: state.relay.clone(),
    };

    let mut writer = tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&state), rx));

    loop {
        let received = tokio::select! {
            received = conn.recv() => received,
            _ = &mut writer => {
                tracing::debug!(%conn_id, "writer finished, closing reader");
                break;
            }
        };
        let data = match received {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "dropping malformed event");
                continue;
            }
        };

        tracing::trace!(%conn_id, event = event.name(), "event received");
        state.relay.send_event(conn_id, event).await?;
    }

    writer.abort();
    // _guard drops here → relay detach fires.
    Ok(())
}

/// Drains the connection's outbound queue onto the socket.
///
/// Ends when the relay drops the queue (detach or shutdown) or the socket
/// stops accepting writes.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: mpsc::Receiver<ServerEvent>,
) {
    let conn_id = conn.id();
    while let Some(event) = rx.recv().await {
        let frame = match state.codec.encode(&event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(%conn_id, event = event.name(), error = %e, "encode failed");
                continue;
            }
        };
        if let Err(e) = conn.send(&frame).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            return;
        }
    }

    // Detached or relay shut down: let the client know.
    let _ = conn.close().await;
}
