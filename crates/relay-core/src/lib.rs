//! # relay-core
//!
//! Shared library for the session relay containing the session gate, the
//! client-facing notice protocol, and relay payload normalization.
//!
//! This crate is pure: it has zero dependencies on sockets, async runtimes,
//! or OS APIs.  Everything here can be unit tested without a network.
//!
//! # What the relay does
//!
//! The relay is a single-session message fan-out server.  Clients connect
//! over a persistent WebSocket, present a session token in the upgrade
//! request URL, and — once admitted — every message a client sends is
//! forwarded verbatim to all other admitted clients.  The relay never
//! inspects payload contents.
//!
//! This crate defines:
//!
//! - **`domain`** – The session gate: extracting the requested token from the
//!   upgrade request's query string and deciding, by exact string equality,
//!   whether the connection may join the configured session.
//!
//! - **`protocol`** – The one structured wire message the relay ever
//!   produces (the JSON rejection notice sent to a connection that fails the
//!   gate) and the normalization rule that turns an inbound frame into the
//!   text that gets relayed.

// Declare the two top-level modules.  Rust will look for each in a
// subdirectory with the same name (e.g., src/protocol/mod.rs).
pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `relay_core::SessionGate` instead of `relay_core::domain::gate::SessionGate`.
pub use domain::gate::{token_from_query, AdmitError, SessionGate};
pub use protocol::codec::InboundPayload;
pub use protocol::messages::ServerNotice;
