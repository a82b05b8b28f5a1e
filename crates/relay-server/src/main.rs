//! Session relay — entry point.
//!
//! This binary runs the multiplayer relay server: clients connect over
//! WebSocket with a session token on the upgrade URL, and every message an
//! admitted client sends is forwarded to all other admitted clients.  The
//! server never parses relayed payloads; game semantics live entirely in the
//! clients.
//!
//! # Usage
//!
//! ```text
//! relay-server --filepath <TOKEN> [OPTIONS]
//!
//! Options:
//!   --port     <PORT>   WebSocket listener port [default: 3000]
//!   --bind     <IP>     Listener bind address [default: 0.0.0.0]
//!   --filepath <TOKEN>  Session token clients must present (required)
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable         | Default   | Description                         |
//! |------------------|-----------|-------------------------------------|
//! | `RELAY_PORT`     | `3000`    | WebSocket listener port             |
//! | `RELAY_BIND`     | `0.0.0.0` | Listener bind address               |
//! | `RELAY_FILEPATH` | —         | Session token (required)            |
//!
//! # Architecture overview
//!
//! ```text
//! Game clients  (text over WebSocket, ?filepath=<token>)
//!       ↕
//! relay-server  ← this process
//!   domain/          RelayConfig
//!   application/     ConnectionRegistry (peer set + broadcast)
//!   infrastructure/
//!     ws_server/     Accept loop + per-connection tasks
//!       ↕
//! relay-core  (session gate, rejection notice, payload normalization)
//! ```

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use relay_server::domain::RelayConfig;
use relay_server::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Single-session WebSocket message relay.
///
/// Accepts WebSocket connections carrying a `filepath` session token and
/// broadcasts every admitted client's messages to all other admitted clients.
///
/// The `#[derive(Parser)]` macro from `clap` generates the argument parser
/// automatically from the struct fields and their `#[arg(...)]` attributes.
#[derive(Debug, Parser)]
#[command(
    name = "relay-server",
    about = "Single-session WebSocket message relay for multiplayer games",
    version
)]
struct Cli {
    /// TCP port for the WebSocket listener.
    ///
    /// Clients connect to this port via WebSocket (ws://host:PORT).
    #[arg(long, default_value_t = 3000, env = "RELAY_PORT")]
    port: u16,

    /// IP address to bind the listener to.
    ///
    /// Use `0.0.0.0` to accept connections from any network interface
    /// (LAN + localhost), or `127.0.0.1` to accept only local connections.
    #[arg(long, default_value = "0.0.0.0", env = "RELAY_BIND")]
    bind: String,

    /// The session token every joining client must present.
    ///
    /// Clients send it as the `filepath` query parameter on the upgrade
    /// URL; in practice it is the path of the game file the session is
    /// playing.  Compared as an opaque string — exact and case-sensitive.
    #[arg(long, env = "RELAY_FILEPATH")]
    filepath: String,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`RelayConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address, i.e. the
    /// resulting socket address string cannot be parsed.
    fn into_relay_config(self) -> anyhow::Result<RelayConfig> {
        let bind_addr: SocketAddr = format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address: '{}:{}'", self.bind, self.port))?;

        Ok(RelayConfig {
            bind_addr,
            session_token: self.filepath,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. `tracing_subscriber` is initialised; the log level is controlled by
///    the `RUST_LOG` environment variable (default `info`).
/// 2. CLI arguments are parsed with `clap` into a [`Cli`] struct.
/// 3. A [`RelayConfig`] is constructed from the CLI arguments.
/// 4. A Ctrl+C handler task is spawned; it clears a shared `AtomicBool`.
/// 5. [`run_server`] binds the listener and accepts connections until the
///    flag is cleared.  A bind failure is fatal and surfaces here.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `EnvFilter::try_from_default_env()` reads the `RUST_LOG` environment
    // variable.  If it is absent or invalid, fall back to `info` level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.into_relay_config()?;

    info!(
        "session relay starting — listening on {}, session token {:?}",
        config.bind_addr, config.session_token
    );

    // Shutdown flag shared with the accept loop.  `Relaxed` ordering is
    // enough: the value only needs to eventually propagate.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    // Spawn a task that listens for Ctrl+C (SIGINT on Unix).  The accept
    // loop checks the flag every 200 ms and exits cleanly.
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C — initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, running).await?;

    info!("session relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_port_is_3000() {
        // Arrange: only the required token is supplied; defaults apply.
        let cli = Cli::parse_from(["relay-server", "--filepath", "room42"]);
        // Assert
        assert_eq!(cli.port, 3000);
    }

    #[test]
    fn test_cli_default_bind_is_any_interface() {
        let cli = Cli::parse_from(["relay-server", "--filepath", "room42"]);
        assert_eq!(cli.bind, "0.0.0.0");
    }

    #[test]
    fn test_cli_filepath_is_required() {
        // Without --filepath (or RELAY_FILEPATH) parsing must fail; the
        // relay has no meaningful default session token.
        let result = Cli::try_parse_from(["relay-server"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_port_override() {
        let cli = Cli::parse_from(["relay-server", "--filepath", "room42", "--port", "9999"]);
        assert_eq!(cli.port, 9999);
    }

    #[test]
    fn test_cli_bind_override() {
        let cli = Cli::parse_from(["relay-server", "--filepath", "room42", "--bind", "127.0.0.1"]);
        assert_eq!(cli.bind, "127.0.0.1");
    }

    #[test]
    fn test_cli_filepath_takes_a_path_like_token() {
        let cli = Cli::parse_from([
            "relay-server",
            "--filepath",
            "data/games/dinosaurgame.xml",
        ]);
        assert_eq!(cli.filepath, "data/games/dinosaurgame.xml");
    }

    #[test]
    fn test_into_relay_config_defaults() {
        // Arrange
        let cli = Cli::parse_from(["relay-server", "--filepath", "room42"]);
        // Act
        let config = cli.into_relay_config().unwrap();
        // Assert
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.session_token, "room42");
    }

    #[test]
    fn test_into_relay_config_custom_bind_and_port() {
        let cli = Cli::parse_from([
            "relay-server",
            "--filepath",
            "room42",
            "--bind",
            "127.0.0.1",
            "--port",
            "8080",
        ]);
        let config = cli.into_relay_config().unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_into_relay_config_invalid_bind_returns_error() {
        // Arrange: an invalid IP address string.
        let cli = Cli {
            port: 3000,
            bind: "not.an.ip".to_string(),
            filepath: "room42".to_string(),
        };
        // Act
        let result = cli.into_relay_config();
        // Assert: must return an error, not panic.
        assert!(result.is_err());
    }
}
