//! Transport layer.
//!
//! The manager never touches sockets. It drives a [`Transport`] created by a
//! [`TransportFactory`] and reacts to the notifications the transport sends
//! through its [`EventSink`].
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐   open(endpoint, sink)   ┌────────────────────┐
//! │ ConnectionManager  │─────────────────────────►│ TransportFactory   │
//! │                    │                          └─────────┬──────────┘
//! │  state / gen /     │                                    │ spawns
//! │  transport slot    │◄──── sink.ready() ───────┌─────────▼──────────┐      WebSocket
//! │                    │◄──── sink.error(detail) ─│ Transport task     │◄────────────────► rosbridge
//! └────────────────────┘                          └────────────────────┘
//! ```
//!
//! # Contract
//!
//! - `open` only initiates the attempt and must not block on the handshake.
//!   It may report through the sink before returning.
//! - `ready` is sent at most once, after `is_open` starts returning `true`.
//! - `error` may be sent any number of times, during or after the handshake.
//! - `close` is idempotent and returns once the transport has shut down.
//! - `shutdown` never blocks; it is the close path of `Drop`.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `websocket` | `tokio-tungstenite` client transport and event loop |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use url::Url;

use crate::config::RosVersion;
use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket client transport.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use crate::manager::EventSink;
pub use websocket::{WebSocketFactory, WebSocketTransport};

// ============================================================================
// Endpoint
// ============================================================================

/// Address of a rosbridge server as seen by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Server host name or IP address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// ROS version, passed through untouched.
    pub version: RosVersion,
}

impl Endpoint {
    /// Creates an endpoint.
    #[inline]
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, version: RosVersion) -> Self {
        Self {
            host: host.into(),
            port,
            version,
        }
    }

    /// Returns the WebSocket URL for this endpoint.
    ///
    /// Format: `ws://{host}:{port}/`. Bare IPv6 literals are bracketed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`](crate::Error::Url) if the host does not form a
    /// valid URL.
    pub fn ws_url(&self) -> Result<Url> {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        Ok(Url::parse(&format!("ws://{host}:{}", self.port))?)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.host, self.port, self.version)
    }
}

// ============================================================================
// Transport
// ============================================================================

/// A live connection attempt or connection to a bridge server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns `true` while the connection is established and usable.
    fn is_open(&self) -> bool;

    /// Signals the transport to close without waiting for it.
    ///
    /// Used when the manager is dropped and cannot await.
    fn shutdown(&self);

    /// Closes the connection and waits for the transport to shut down.
    ///
    /// Also cancels an attempt that is still handshaking.
    async fn close(&self);
}

// ============================================================================
// TransportFactory
// ============================================================================

/// Creates transports for a manager.
///
/// One factory serves every `connect` of its manager.
pub trait TransportFactory: Send + Sync {
    /// Creates a transport bound to `endpoint` and starts its connection attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be created or its attempt
    /// cannot be started. The manager records it as a construction failure.
    fn open(&self, endpoint: &Endpoint, events: EventSink) -> Result<Box<dyn Transport>>;
}

// ============================================================================
// Tests
// ============================================================================
