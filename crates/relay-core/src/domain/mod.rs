//! Domain layer for relay-core.
//!
//! The domain layer contains pure business-logic types that have no
//! dependencies on I/O, networking, or external frameworks.
//!
//! # What belongs in the domain layer?
//!
//! - The session gate (the admit/reject decision)
//! - Query-string token extraction
//! - Error types that describe business-logic failures
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream`, or `WebSocket` types
//! - Socket reads/writes or task spawning
//! - Anything that could block or fail due to external state

pub mod gate;

// Re-export so callers can write `domain::SessionGate` instead of the
// longer path.
pub use gate::{token_from_query, AdmitError, SessionGate};
