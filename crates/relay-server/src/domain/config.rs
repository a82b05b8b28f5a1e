//! Relay configuration types.
//!
//! [`RelayConfig`] is the single source of truth for all runtime settings.
//! It is built once from CLI arguments in `main.rs` and never mutated for
//! the lifetime of the process.
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! variable reads inside the domain) keeps the server easy to embed in
//! tests: integration tests construct a `RelayConfig` directly with an
//! ephemeral port and a throwaway token.

use std::net::SocketAddr;

/// All runtime configuration for the relay.
///
/// Build this struct once at startup (from CLI args) and hand it to
/// `infrastructure::ws_server::run_server`.
///
/// # Example
///
/// ```rust
/// use relay_server::domain::RelayConfig;
///
/// let cfg = RelayConfig {
///     bind_addr: "127.0.0.1:3000".parse().unwrap(),
///     session_token: "data/games/dinosaurgame.xml".to_string(),
/// };
/// assert_eq!(cfg.bind_addr.port(), 3000);
/// ```
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// The address and port the WebSocket listener binds to.
    ///
    /// `0.0.0.0` accepts connections from any network interface (LAN +
    /// localhost).  Set to `127.0.0.1` to accept only local connections.
    pub bind_addr: SocketAddr,

    /// The session token every joining connection must present as the
    /// `filepath` query parameter on its upgrade URL.
    ///
    /// In practice this is the path of the game file the session is
    /// playing; the server never opens it — it is compared as an opaque
    /// string, exactly and case-sensitively.
    pub session_token: String,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RelayConfig {
        RelayConfig {
            bind_addr: "0.0.0.0:3000".parse().unwrap(),
            session_token: "room42".to_string(),
        }
    }

    #[test]
    fn test_config_stores_bind_addr_and_token() {
        // Arrange / Act
        let cfg = sample();
        // Assert
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert_eq!(cfg.session_token, "room42");
    }

    #[test]
    fn test_config_can_be_cloned() {
        // Cloneability is required so the accept loop can hand the config
        // to per-connection tasks.
        let cfg = sample();
        let cloned = cfg.clone();
        assert_eq!(cfg.bind_addr, cloned.bind_addr);
        assert_eq!(cfg.session_token, cloned.session_token);
    }
}
