//! Infrastructure layer for relay-server.
//!
//! The infrastructure layer handles all I/O: binding the listener, accepting
//! TCP connections, performing the WebSocket upgrade handshake, and running
//! the per-connection read/write tasks.
//!
//! # Responsibilities
//!
//! - Binding the TCP listener (bind failure is the one fatal startup error)
//! - Completing the WebSocket handshake while capturing the request URI
//! - Running the session gate and transmitting the rejection notice
//! - Spawning per-connection Tokio tasks and the per-peer writer task
//! - Honoring the graceful shutdown flag
//!
//! # What does NOT belong here?
//!
//! - The admit/reject decision (that is `relay-core`'s session gate)
//! - The peer set and fan-out logic (that is the application layer)
//! - Configuration parsing (that is done in `main.rs`)

pub mod ws_server;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use ws_server::{run_server, serve, ServerError};
