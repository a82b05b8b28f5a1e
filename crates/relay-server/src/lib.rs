//! relay-server library crate.
//!
//! This crate provides a single-session WebSocket message relay: every text
//! payload one admitted client sends is fanned out, unchanged, to all other
//! admitted clients.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Game clients (text over WebSocket, ?filepath=<token> on the upgrade URL)
//!         ↕
//! [relay-server]
//!   ├── domain/           RelayConfig (bind address + session token)
//!   ├── application/      ConnectionRegistry: the live peer set + broadcast
//!   └── infrastructure/
//!         └── ws_server/  Accept loop, handshake, per-connection tasks
//!         ↕
//! relay-core  (session gate, rejection notice, payload normalization)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async, no frameworks).
//! - `application` owns the shared peer set; it depends on `tokio` sync
//!   primitives but never touches a socket.
//! - `infrastructure` depends on all other layers plus `tokio` and
//!   `tungstenite`; it is the only place a socket is read or written.

/// Domain layer: runtime configuration.
pub mod domain;

/// Application layer: the connection registry and broadcaster.
pub mod application;

/// Infrastructure layer: the WebSocket accept loop and session tasks.
pub mod infrastructure;
