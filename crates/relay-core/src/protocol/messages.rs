//! JSON notice types for the client-facing protocol.
//!
//! Relayed game traffic is opaque to the server, so the only structured
//! message the relay ever sends is a notice to a connection that is about to
//! be closed.  Notices are JSON objects with a `"type"` field identifying
//! the variant; all other fields are flattened into the same object:
//!
//! ```json
//! {"type":"error","message":"Attempting to join wrong game type."}
//! ```
//!
//! Serde's `#[serde(tag = "type")]` attribute handles the discriminant
//! automatically.  Clients parse the notice as generic key/value data, so
//! the field names and the literal `"error"` tag are a wire contract.

use serde::{Deserialize, Serialize};

use crate::domain::gate::AdmitError;

/// A structured notice sent to a single client, always immediately before
/// the server closes that client's connection.
///
/// # Serde representation
///
/// ```json
/// {"type":"error","message":"Attempting to join wrong game type."}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
// `tag = "type"` puts the variant name in a `"type"` field; `rename_all`
// lowercases it so the wire tag is `"error"`, matching what clients expect.
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerNotice {
    /// The connection was refused; `message` explains why in human-readable
    /// text.  Sent exactly once to a connection that fails the session gate,
    /// before the server closes it.
    Error {
        /// Human-readable explanation, shown to the player by the client.
        message: String,
    },
}

impl ServerNotice {
    /// Builds the rejection notice for a failed admit decision.
    ///
    /// The notice text is the error's `Display` output, which keeps the
    /// client-facing message defined in exactly one place ([`AdmitError`]).
    pub fn rejection(reason: &AdmitError) -> Self {
        Self::Error {
            message: reason.to_string(),
        }
    }

    /// Serializes the notice to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error if serialization fails;
    /// with these plain string fields that only happens on allocation
    /// failure, but the caller is expected to log rather than crash.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_notice_serializes_to_exact_wire_form() {
        // Arrange
        let notice = ServerNotice::rejection(&AdmitError::WrongSession);
        // Act
        let json = notice.to_json().unwrap();
        // Assert: byte-for-byte wire contract, including field order.
        assert_eq!(
            json,
            r#"{"type":"error","message":"Attempting to join wrong game type."}"#
        );
    }

    #[test]
    fn test_error_notice_round_trips_through_json() {
        let notice = ServerNotice::Error {
            message: "shutting down".to_string(),
        };
        let json = notice.to_json().unwrap();
        let parsed: ServerNotice = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, notice);
    }

    #[test]
    fn test_notice_tag_field_is_lowercase_error() {
        // Clients dispatch on the `"type"` field, so the tag must be the
        // lowercase literal `"error"`, not the Rust variant name `"Error"`.
        let notice = ServerNotice::Error {
            message: String::new(),
        };
        let value: serde_json::Value = serde_json::to_value(&notice).unwrap();
        assert_eq!(value["type"], "error");
    }

    #[test]
    fn test_notice_parses_as_generic_key_value_data() {
        // A generic client reads the notice as a plain JSON object.
        let notice = ServerNotice::rejection(&AdmitError::WrongSession);
        let value: serde_json::Value =
            serde_json::from_str(&notice.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["message"], "Attempting to join wrong game type.");
    }
}
