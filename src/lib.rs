//! rosbridge connection - lifecycle management for a ROS bridge link.
//!
//! This library manages a single asynchronous WebSocket connection from an
//! agent host to a ROS bridge server (rosbridge), exposing three operations:
//! `connect`, `disconnect` and `status`.
//!
//! # Architecture
//!
//! - **Manager**: owns at most one transport and the connection state
//! - **Transport**: performs the I/O on its own task and reports back
//! - **Generations**: every transport is tagged; reports from superseded
//!   transports are discarded
//!
//! ```text
//! Disconnected --connect()--> Connecting --ready--> Connected
//!                                  │                    │
//!                                error                error
//!                                  ▼                    ▼
//!                                Error ◄────────────────┘
//! ```
//!
//! `disconnect()` returns any state to Disconnected. `connect()` while
//! Connecting or Connected does nothing.
//!
//! # Quick Start
//!
//! ```no_run
//! use rosbridge_connection::{BridgeSettings, ConnectionManager, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let settings = BridgeSettings::from_json(r#"{"host": "robot.local", "port": 9090}"#)?;
//!     let manager = ConnectionManager::new(settings);
//!
//!     println!("{}", manager.connect().await);
//!     manager.wait_connected().await?;
//!     println!("Status: {}", manager.status());
//!
//!     println!("{}", manager.disconnect().await);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | [`BridgeSettings`] and its builder |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | [`Generation`] tags |
//! | [`manager`] | [`ConnectionManager`] and its state machine |
//! | [`transport`] | Transport traits and the WebSocket transport |

// ============================================================================
// Modules
// ============================================================================

/// Bridge connection settings.
pub mod config;

/// Error types and result aliases.
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Connection lifecycle management.
///
/// Use [`ConnectionManager::new`] to manage a connection.
pub mod manager;

/// Transport layer.
///
/// Implement [`Transport`] and [`TransportFactory`] to plug in another
/// client; [`WebSocketFactory`] is the default.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration types
pub use config::{BridgeSettings, RosVersion, SettingsBuilder};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::Generation;

// Manager types
pub use manager::{
    ConnectOutcome, ConnectionManager, ConnectionState, ConnectionStatus, DisconnectOutcome,
    EventSink,
};

// Transport types
pub use transport::{Endpoint, Transport, TransportFactory, WebSocketFactory, WebSocketTransport};
