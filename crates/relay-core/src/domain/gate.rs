//! The session gate: decides whether an incoming connection may join the
//! configured session.
//!
//! Every server instance is configured with exactly one session token (a
//! string, in practice the path of the game file the session is playing).
//! A connecting client presents its own token as the `filepath` query
//! parameter on the WebSocket upgrade URL:
//!
//! ```text
//! ws://host:3000?filepath=data/games/dinosaurgame.xml
//! ```
//!
//! The gate accepts the connection iff the presented token equals the
//! configured token — exact, case-sensitive string equality with no
//! normalization.  A missing or empty token is always a reject, never a
//! wildcard accept.
//!
//! The gate is a pure decision function: it does not touch the connection
//! registry and has no side effects.  Transmitting the rejection notice and
//! closing the socket is the caller's responsibility (see
//! `relay-server`'s infrastructure layer).

use thiserror::Error;

// ── Error type ────────────────────────────────────────────────────────────────

/// Why the gate refused a connection.
///
/// The `Display` text is the exact human-readable message delivered to the
/// rejected client inside the JSON notice payload, so tests can assert on
/// `err.to_string()` directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmitError {
    /// The presented token did not match the configured session token
    /// (or no token was presented at all).
    #[error("Attempting to join wrong game type.")]
    WrongSession,
}

// ── Token extraction ──────────────────────────────────────────────────────────

/// Extracts the session token from a raw URI query string.
///
/// Looks for the first `filepath=<value>` pair in `query` (the part of the
/// upgrade request URI after the `?`).  Pairs are separated by `&`; the
/// value is taken verbatim, with no percent-decoding, because the gate
/// compares tokens by exact string equality.
///
/// Returns `None` when the parameter is absent, has no `=`, or has an empty
/// value — all of which the gate treats as a reject.
///
/// # Example
///
/// ```rust
/// use relay_core::domain::gate::token_from_query;
///
/// assert_eq!(token_from_query("filepath=room42"), Some("room42"));
/// assert_eq!(token_from_query("foo=1&filepath=room42"), Some("room42"));
/// assert_eq!(token_from_query("filepath="), None);
/// assert_eq!(token_from_query("other=x"), None);
/// ```
pub fn token_from_query(query: &str) -> Option<&str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "filepath")
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

// ── The gate ──────────────────────────────────────────────────────────────────

/// The admit/reject decision for the single configured session.
///
/// Construct one `SessionGate` per server from the configured token and call
/// [`SessionGate::admit`] for each incoming connection before it is allowed
/// anywhere near the registry.
#[derive(Debug, Clone)]
pub struct SessionGate {
    /// The token every joining connection must present.
    expected: String,
}

impl SessionGate {
    /// Creates a gate that admits only connections presenting `expected`.
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }

    /// Decides whether a connection presenting `requested` may join.
    ///
    /// `requested` is the token extracted from the upgrade request (usually
    /// via [`token_from_query`]); `None` means the client presented no
    /// token.
    ///
    /// # Errors
    ///
    /// Returns [`AdmitError::WrongSession`] when the token is missing,
    /// empty, or not exactly equal to the configured token.
    pub fn admit(&self, requested: Option<&str>) -> Result<(), AdmitError> {
        match requested {
            // An empty token is never a wildcard, even if the configured
            // token were itself empty.
            Some(token) if !token.is_empty() && token == self.expected => Ok(()),
            _ => Err(AdmitError::WrongSession),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── token_from_query ──────────────────────────────────────────────────────

    #[test]
    fn test_token_from_query_extracts_filepath_value() {
        // Arrange / Act
        let token = token_from_query("filepath=data/games/dinosaurgame.xml");
        // Assert
        assert_eq!(token, Some("data/games/dinosaurgame.xml"));
    }

    #[test]
    fn test_token_from_query_finds_filepath_among_other_params() {
        let token = token_from_query("v=2&filepath=room42&debug=true");
        assert_eq!(token, Some("room42"));
    }

    #[test]
    fn test_token_from_query_missing_param_returns_none() {
        assert_eq!(token_from_query("v=2&debug=true"), None);
    }

    #[test]
    fn test_token_from_query_empty_value_returns_none() {
        // `filepath=` with nothing after the `=` must not count as a token.
        assert_eq!(token_from_query("filepath="), None);
    }

    #[test]
    fn test_token_from_query_empty_query_returns_none() {
        assert_eq!(token_from_query(""), None);
    }

    #[test]
    fn test_token_from_query_key_without_equals_returns_none() {
        assert_eq!(token_from_query("filepath"), None);
    }

    #[test]
    fn test_token_from_query_value_taken_verbatim() {
        // No percent-decoding: the encoded form is compared as-is.
        let token = token_from_query("filepath=a%20b");
        assert_eq!(token, Some("a%20b"));
    }

    #[test]
    fn test_token_from_query_first_match_wins() {
        let token = token_from_query("filepath=one&filepath=two");
        assert_eq!(token, Some("one"));
    }

    // ── SessionGate::admit ────────────────────────────────────────────────────

    #[test]
    fn test_admit_accepts_exact_match() {
        let gate = SessionGate::new("room42");
        assert_eq!(gate.admit(Some("room42")), Ok(()));
    }

    #[test]
    fn test_admit_rejects_mismatched_token() {
        let gate = SessionGate::new("room42");
        assert_eq!(gate.admit(Some("wrongroom")), Err(AdmitError::WrongSession));
    }

    #[test]
    fn test_admit_is_case_sensitive() {
        let gate = SessionGate::new("room42");
        assert_eq!(gate.admit(Some("Room42")), Err(AdmitError::WrongSession));
    }

    #[test]
    fn test_admit_rejects_missing_token() {
        let gate = SessionGate::new("room42");
        assert_eq!(gate.admit(None), Err(AdmitError::WrongSession));
    }

    #[test]
    fn test_admit_rejects_empty_token() {
        let gate = SessionGate::new("room42");
        assert_eq!(gate.admit(Some("")), Err(AdmitError::WrongSession));
    }

    #[test]
    fn test_admit_does_not_normalize_whitespace() {
        let gate = SessionGate::new("room42");
        assert_eq!(gate.admit(Some(" room42")), Err(AdmitError::WrongSession));
        assert_eq!(gate.admit(Some("room42 ")), Err(AdmitError::WrongSession));
    }

    #[test]
    fn test_admit_error_display_is_the_client_facing_message() {
        // The Display text travels to the client verbatim inside the JSON
        // notice, so it must not drift.
        assert_eq!(
            AdmitError::WrongSession.to_string(),
            "Attempting to join wrong game type."
        );
    }
}
