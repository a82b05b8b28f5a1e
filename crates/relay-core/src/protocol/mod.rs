//! Protocol layer for relay-core.
//!
//! The relay deliberately has almost no wire protocol of its own: relayed
//! payloads are opaque text passed through unchanged, with no envelope, no
//! sender identity, and no timestamp.  This module holds the two pieces that
//! do exist:
//!
//! - **`messages`** – The JSON notice sent to a connection that fails the
//!   session gate (the only structured message the server ever produces).
//! - **`codec`** – The normalization rule that turns an inbound frame into
//!   the text that gets fanned out to the other clients.

pub mod codec;
pub mod messages;

// Re-export the primary types so callers can write `protocol::ServerNotice`.
pub use codec::InboundPayload;
pub use messages::ServerNotice;
