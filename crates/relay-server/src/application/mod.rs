//! Application layer for relay-server.
//!
//! The application layer owns the one piece of shared mutable state in the
//! whole server: the set of currently admitted connections, together with
//! the broadcast fan-out over it.
//!
//! # Responsibilities
//!
//! - Tracking which peers are admitted (add on admit, remove on disconnect)
//! - Fanning a relayed payload out to every peer except its sender
//! - Isolating per-recipient send failures and pruning dead peers
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or listening for connections (that is infrastructure)
//! - The admit/reject decision itself (that is `relay-core`'s session gate)
//! - WebSocket framing (handled by tokio-tungstenite)

pub mod registry;

// Re-export so callers can write `application::ConnectionRegistry`.
pub use registry::{ConnectionRegistry, PeerId, PeerSender};
