//! Relay payload normalization.
//!
//! The relay forwards payloads as WebSocket *text* frames.  Text frames pass
//! through unchanged.  Binary frames are stringified to their UTF-8 text
//! representation before fan-out, so a message sent as binary is relayed as
//! text.
//!
//! Stringifying binary frames is a deliberate, testable contract inherited
//! from the original system, not an accident of this implementation: clients
//! that send binary data receive it back on the other side as (lossily
//! decoded) text.  Invalid UTF-8 sequences decode to U+FFFD replacement
//! characters rather than failing the relay.

/// An inbound frame as the relay sees it, before fan-out.
///
/// The infrastructure layer maps WebSocket frames into this type so that the
/// normalization rule stays pure and unit-testable without a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPayload {
    /// A text frame; relayed verbatim.
    Text(String),
    /// A binary frame; relayed as its lossy UTF-8 text representation.
    Binary(Vec<u8>),
}

impl InboundPayload {
    /// Normalizes the payload into the text that gets relayed to every
    /// other admitted client.
    ///
    /// # Example
    ///
    /// ```rust
    /// use relay_core::protocol::codec::InboundPayload;
    ///
    /// let text = InboundPayload::Binary(b"hello".to_vec()).into_relay_text();
    /// assert_eq!(text, "hello");
    /// ```
    pub fn into_relay_text(self) -> String {
        match self {
            InboundPayload::Text(text) => text,
            // `from_utf8_lossy` never fails; invalid sequences become U+FFFD.
            InboundPayload::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
