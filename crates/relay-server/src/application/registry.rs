//! The connection registry and broadcaster.
//!
//! [`ConnectionRegistry`] is the single shared mutable resource of the
//! relay: a map from peer id to that peer's outbound channel.  Every other
//! part of the server is per-connection state.
//!
//! # Peer lifecycle
//!
//! ```text
//! Pending   connection upgraded, token not yet validated (not in the map)
//!    │ gate accepts → register()
//! Admitted  in the map; eligible to send and receive broadcasts
//!    │ socket closes, or a send to this peer fails → remove()
//! Closed    absent from the map; terminal — a peer id is never reused
//! ```
//!
//! A peer is represented by the sending half of an unbounded channel.  The
//! receiving half is drained by that connection's writer task, which owns
//! the socket sink.  A peer whose writer task has exited (socket dead) is
//! observed here as a closed channel: the next broadcast's send fails, the
//! failure is isolated to that recipient, and the peer is pruned through the
//! same removal path as a normal disconnect.
//!
//! # Locking discipline
//!
//! All map access goes through one `RwLock`.  Broadcast takes a read lock
//! only long enough to snapshot the recipients, then releases it before any
//! send, so a slow recipient never blocks a concurrent admit or removal.
//! The lock is never held across an `.await` on a send.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// Identity of an admitted peer.
///
/// Minted once at admit time; never reused.  The underlying socket is the
/// *physical* identity, but tasks need a handle they can copy into log
/// messages and closures, so each admitted socket gets a fresh UUID.
pub type PeerId = Uuid;

/// The sending half of an admitted peer's outbound queue.
///
/// The payload is the already-normalized relay text; the peer's writer task
/// wraps it into a WebSocket text frame.
pub type PeerSender = mpsc::UnboundedSender<String>;

/// The set of currently admitted connections, plus the broadcast fan-out.
///
/// Owned by the server's accept loop (wrapped in an `Arc`) and shared with
/// every per-connection task; dropped when the server stops.
pub struct ConnectionRegistry {
    /// Admitted peers, unique by id.  No ordering guarantee — broadcast
    /// order across recipients is unspecified.
    peers: RwLock<HashMap<PeerId, PeerSender>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
        }
    }

    /// Admits a peer: stores its outbound sender and returns its new id.
    ///
    /// Callers must run the session gate *before* this; a connection that
    /// fails the gate is never registered.
    pub async fn register(&self, sender: PeerSender) -> PeerId {
        let id = Uuid::new_v4();
        self.peers.write().await.insert(id, sender);
        debug!("peer {id} registered");
        id
    }

    /// Removes a peer from the set.
    ///
    /// Unconditional and idempotent: removing an absent peer is a no-op.
    /// Returns `true` if the peer was present.  Dropping the stored sender
    /// here is what lets the peer's writer task finish draining and exit.
    pub async fn remove(&self, id: PeerId) -> bool {
        let removed = self.peers.write().await.remove(&id).is_some();
        if removed {
            debug!("peer {id} removed");
        }
        removed
    }

    /// Relays `text` to every admitted peer except `source`.
    ///
    /// Delivery is best-effort: a failed send to one recipient never
    /// prevents delivery to the rest and never surfaces to the sender.  A
    /// recipient whose channel is closed is treated as disconnected and
    /// pruned via [`ConnectionRegistry::remove`].
    ///
    /// Returns the number of successful deliveries (for logs and tests
    /// only — the sender is not told about failures).
    pub async fn broadcast(&self, source: PeerId, text: &str) -> usize {
        // Snapshot the recipients under the read lock, then drop the lock
        // before sending so new admits and removals are never blocked on
        // fan-out.  Each recipient appears in the snapshot exactly once.
        let recipients: Vec<(PeerId, PeerSender)> = {
            let peers = self.peers.read().await;
            peers
                .iter()
                .filter(|(id, _)| **id != source)
                .map(|(id, sender)| (*id, sender.clone()))
                .collect()
        };

        let mut delivered = 0;
        let mut dead: Vec<PeerId> = Vec::new();
        for (id, sender) in recipients {
            // An unbounded send only fails when the receiver is gone, i.e.
            // the peer's writer task has exited because its socket died.
            if sender.send(text.to_owned()).is_ok() {
                delivered += 1;
            } else {
                warn!("peer {id}: send failed (connection closed); removing from session");
                dead.push(id);
            }
        }

        // Prune dead peers through the same path as a normal disconnect.
        for id in dead {
            self.remove(id).await;
        }

        delivered
    }

    /// Number of currently admitted peers.
    pub async fn len(&self) -> usize {
        self.peers.read().await.len()
    }

    /// `true` when no peers are admitted.
    pub async fn is_empty(&self) -> bool {
        self.peers.read().await.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
