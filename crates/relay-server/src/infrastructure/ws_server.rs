//! WebSocket server: accept loop and per-connection task management.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming TCP connections from game clients.
//! 3. Upgrading each connection to a WebSocket, capturing the request URI so
//!    the session gate can inspect the `filepath` query parameter.
//! 4. Rejecting gate failures with a single JSON notice followed by a Close
//!    frame — a rejected connection never reaches the registry.
//! 5. For admitted peers, running two tasks per connection:
//!    - **Reader** (the session task itself): reads inbound frames and hands
//!      each text payload to the registry for fan-out.
//!    - **Writer**: drains the peer's outbound channel into the socket sink,
//!      so broadcast never waits on this peer's network.
//! 6. Removing the peer from the registry on every exit path.
//! 7. Shutting down cleanly when the `running` flag is cleared.
//!
//! # Scalability
//!
//! Each connection runs in its own Tokio task.  The accept loop never
//! blocks: it accepts a connection and immediately spawns a task for it
//! before accepting the next one, so one slow client never delays others.
//! Fan-out cost is a linear scan of the admitted set per inbound message.
//!
//! # Failure containment
//!
//! Every per-connection fault — handshake failure, bad frame, dead socket —
//! is contained inside that connection's task.  The accept loop and the
//! other sessions are never affected; the only fatal error in this module
//! is failing to bind the listener at startup.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        handshake::server::{ErrorResponse, Request, Response},
        Error as WsError, Message as WsMessage,
    },
};
use tracing::{debug, error, info, warn};

use relay_core::{token_from_query, InboundPayload, ServerNotice, SessionGate};

use crate::application::registry::ConnectionRegistry;
use crate::domain::RelayConfig;

// ── Error type ────────────────────────────────────────────────────────────────

/// Fatal server-level errors.
///
/// Everything that can go wrong after startup is per-connection and handled
/// inside that connection's task; only a bind failure stops the server from
/// coming up at all.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The TCP listener could not be bound (port in use, no permission).
    #[error("failed to bind relay listener on {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds the configured address and runs the accept loop until `running` is
/// cleared.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the listener cannot be bound (e.g., the
/// port is already in use).  This is fatal: the server must not proceed to
/// accept connections.
pub async fn run_server(config: RelayConfig, running: Arc<AtomicBool>) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.bind_addr,
            source,
        })?;

    info!("Server running on {}", config.bind_addr);

    serve(listener, config, running).await;
    Ok(())
}

/// Runs the accept loop on an already-bound listener until `running` is
/// cleared.
///
/// Split out from [`run_server`] so tests can bind an ephemeral port
/// (`127.0.0.1:0`), learn the actual address, and then drive the server.
///
/// Each accepted connection is handed off to a dedicated Tokio task; the
/// loop itself never blocks on a client.
pub async fn serve(listener: TcpListener, config: RelayConfig, running: Arc<AtomicBool>) {
    // One gate and one registry for the whole server, shared with every
    // connection task.  Their lifetime is the accept loop's lifetime.
    let gate = Arc::new(SessionGate::new(config.session_token));
    let registry = Arc::new(ConnectionRegistry::new());

    loop {
        // Check the shutdown flag before each accept attempt.
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Use a short timeout on `accept()` so the loop can periodically
        // check the `running` flag even when no clients are connecting.
        let accept_result = timeout(Duration::from_millis(200), listener.accept()).await;

        match accept_result {
            Ok(Ok((stream, peer_addr))) => {
                info!("new connection from {peer_addr}");
                let gate = Arc::clone(&gate);
                let registry = Arc::clone(&registry);

                // `tokio::spawn` is non-blocking: it queues the task and
                // returns immediately, so the accept loop is never delayed
                // by a client's handshake or I/O.
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, gate, registry).await;
                });
            }
            Ok(Err(e)) => {
                // Transient accept error (e.g., too many open file
                // descriptors).  Log it and continue rather than taking the
                // whole relay down.
                error!("accept error: {e}");
            }
            Err(_) => {
                // Timeout — no new connection in the last 200 ms.
                // Loop back to check the `running` flag.
            }
        }
    }
}

// ── Per-connection handler ────────────────────────────────────────────────────

/// Top-level handler for a single client connection.
///
/// Wraps [`run_session`] and logs the outcome.  The outer/inner function
/// pair lets `run_session` use `?` for clean error propagation while this
/// function keeps every fault contained in the connection's own task.
async fn handle_connection(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    gate: Arc<SessionGate>,
    registry: Arc<ConnectionRegistry>,
) {
    match run_session(raw_stream, peer_addr, gate, registry).await {
        Ok(()) => info!("connection {peer_addr} closed"),
        Err(e) => warn!("connection {peer_addr} closed with error: {e:#}"),
    }
}

/// Runs the complete lifecycle of a single client connection: handshake,
/// gate check, then either reject-and-close or admit-and-relay.
///
/// # Errors
///
/// Returns an error only if the WebSocket handshake itself fails.  After
/// admission, socket failures end the session normally (the peer is removed
/// and the function returns `Ok`), because a dropped client is normal
/// operation for the relay, not an error.
async fn run_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    gate: Arc<SessionGate>,
    registry: Arc<ConnectionRegistry>,
) -> anyhow::Result<()> {
    // ── Step 1: WebSocket handshake, capturing the request URI ────────────────
    //
    // The session token rides on the upgrade request URL as a query
    // parameter (`ws://host:port?filepath=<token>`), so it has to be pulled
    // out of the HTTP request during the handshake — afterwards only frames
    // are visible.
    let mut requested: Option<String> = None;
    let callback = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        requested = req
            .uri()
            .query()
            .and_then(token_from_query)
            .map(str::to_owned);
        Ok(response)
    };

    let mut ws = accept_hdr_async(raw_stream, callback)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    // ── Step 2: Session gate ──────────────────────────────────────────────────
    //
    // The gate is a pure decision; transmitting the rejection notice and
    // closing the socket happens here, where the socket lives.  A rejected
    // connection is never registered.
    if let Err(reason) = gate.admit(requested.as_deref()) {
        info!("connection {peer_addr} rejected (requested token: {requested:?})");

        match ServerNotice::rejection(&reason).to_json() {
            Ok(json) => {
                // Best-effort: the client may already be gone, and a failed
                // notice must not take anything else down.
                if let Err(e) = ws.send(WsMessage::Text(json)).await {
                    debug!("connection {peer_addr}: could not deliver rejection notice: {e}");
                }
            }
            Err(e) => error!("connection {peer_addr}: failed to encode rejection notice: {e}"),
        }

        let _ = ws.close(None).await;
        return Ok(());
    }

    // ── Step 3: Admission ─────────────────────────────────────────────────────
    //
    // The registry stores the sending half of this peer's outbound queue;
    // the writer task below drains the receiving half into the socket.
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    let peer_id = registry.register(outbound_tx).await;
    info!(
        "connection {peer_addr} admitted as peer {peer_id} ({} in session)",
        registry.len().await
    );

    // Split the WebSocket into a write sink and a read stream so the writer
    // task and this read loop can run concurrently.
    let (mut ws_tx, mut ws_rx) = ws.split();

    // ── Writer task ───────────────────────────────────────────────────────────
    //
    // Owns the sink.  Broadcast only ever enqueues into the channel, so a
    // slow or dead socket here never blocks the sender or the registry; the
    // failure shows up as a closed channel on the next broadcast.
    let writer = tokio::spawn(async move {
        while let Some(text) = outbound_rx.recv().await {
            if let Err(e) = ws_tx.send(WsMessage::Text(text)).await {
                debug!("peer {peer_id}: outbound send failed: {e}");
                break;
            }
        }
    });

    // ── Read loop ─────────────────────────────────────────────────────────────
    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => {
                debug!("peer {peer_id}: received {} byte(s)", text.len());
                let delivered = registry
                    .broadcast(peer_id, &InboundPayload::Text(text).into_relay_text())
                    .await;
                debug!("peer {peer_id}: relayed to {delivered} peer(s)");
            }

            Ok(WsMessage::Binary(bytes)) => {
                // Binary frames relay as their text representation — a
                // contract carried over from the original system.
                debug!("peer {peer_id}: received {} binary byte(s)", bytes.len());
                let delivered = registry
                    .broadcast(peer_id, &InboundPayload::Binary(bytes).into_relay_text())
                    .await;
                debug!("peer {peer_id}: relayed to {delivered} peer(s)");
            }

            Ok(WsMessage::Ping(data)) => {
                // Protocol-level ping; tokio-tungstenite queues the Pong
                // reply automatically when the sink next writes.
                debug!("peer {peer_id}: WebSocket ping ({} bytes)", data.len());
            }

            Ok(WsMessage::Pong(_)) => {
                debug!("peer {peer_id}: WebSocket pong received");
            }

            Ok(WsMessage::Close(_)) => {
                debug!("peer {peer_id}: Close frame received");
                break;
            }

            Ok(WsMessage::Frame(_)) => {
                debug!("peer {peer_id}: raw frame (ignored)");
            }

            Err(WsError::ConnectionClosed | WsError::Protocol(_)) => {
                debug!("peer {peer_id}: connection closed");
                break;
            }

            Err(e) => {
                warn!("peer {peer_id}: WebSocket error: {e}");
                break;
            }
        }
    }

    // ── Cleanup ───────────────────────────────────────────────────────────────
    //
    // Removal is unconditional and idempotent; the same path runs whether
    // the peer closed cleanly, vanished, or failed mid-broadcast (in which
    // case the registry already pruned it and this is a no-op).
    registry.remove(peer_id).await;
    writer.abort();
    info!(
        "peer {peer_id} disconnected ({} remaining in session)",
        registry.len().await
    );

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(addr: SocketAddr) -> RelayConfig {
        RelayConfig {
            bind_addr: addr,
            session_token: "room42".to_string(),
        }
    }

    #[tokio::test]
    async fn test_bind_failure_is_fatal() {
        // Arrange: occupy an ephemeral port so run_server cannot bind it.
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = occupied.local_addr().unwrap();

        // Act
        let result = run_server(config_for(addr), Arc::new(AtomicBool::new(true))).await;

        // Assert: the server refuses to start, with the address in the error.
        let err = result.expect_err("binding an occupied port must fail");
        assert!(matches!(err, ServerError::Bind { .. }));
        assert!(err.to_string().contains(&addr.to_string()));
    }

    #[tokio::test]
    async fn test_serve_exits_when_shutdown_flag_is_cleared() {
        // Arrange: a listener nobody will connect to, and a flag that is
        // already cleared.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let running = Arc::new(AtomicBool::new(false));

        // Act / Assert: the accept loop notices the flag and returns well
        // within a second instead of blocking forever.
        timeout(
            Duration::from_secs(1),
            serve(listener, config_for(addr), running),
        )
        .await
        .expect("serve must exit promptly once the flag is cleared");
    }

    #[tokio::test]
    async fn test_serve_honors_flag_cleared_while_running() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let running = Arc::new(AtomicBool::new(true));

        let handle = tokio::spawn(serve(listener, config_for(addr), Arc::clone(&running)));

        // Let the loop start, then clear the flag.
        tokio::time::sleep(Duration::from_millis(50)).await;
        running.store(false, Ordering::Relaxed);

        timeout(Duration::from_secs(1), handle)
            .await
            .expect("serve must stop after the flag is cleared")
            .unwrap();
    }
}
