//! Error types for the rosbridge connection manager.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Transport construction and configuration return [`Result<T>`] which uses
//! [`Error`]. The manager itself never propagates errors past its boundary:
//! faults are captured into [`ConnectionStatus`](crate::ConnectionStatus) and
//! reported through outcome values.
//!
//! ```ignore
//! use rosbridge_connection::{BridgeSettings, Result};
//!
//! fn load(json: &str) -> Result<BridgeSettings> {
//!     let settings = BridgeSettings::from_json(json)?;
//!     Ok(settings)
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Lifecycle | [`Error::Construction`], [`Error::TransportFault`], [`Error::InvalidTransition`] |
//! | Connection | [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | External | [`Error::Json`], [`Error::WebSocket`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;
use url::ParseError as UrlError;

use crate::manager::ConnectionState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when bridge settings are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Transport could not be created or its connection attempt not started.
    ///
    /// Synchronous fault raised while `connect` is running.
    #[error("Connection failed: {message}")]
    Construction {
        /// Description of the construction failure.
        message: String,
    },

    /// Asynchronous fault reported by the transport.
    ///
    /// Socket reset, handshake rejection, remote close.
    #[error("ROS connection error: {message}")]
    TransportFault {
        /// Detail reported by the transport.
        message: String,
    },

    /// Operation not supported in the current state.
    ///
    /// The manager treats these as no-ops; the variant exists for callers
    /// that prefer a [`Result`] view of an outcome.
    #[error("Cannot {operation} while {state}")]
    InvalidTransition {
        /// The requested operation.
        operation: &'static str,
        /// State the manager was in.
        state: ConnectionState,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection attempt did not become ready in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Connection closed before it became usable.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Endpoint URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] UrlError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a construction failure.
    #[inline]
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction {
            message: message.into(),
        }
    }

    /// Creates a transport fault.
    #[inline]
    pub fn transport_fault(message: impl Into<String>) -> Self {
        Self::TransportFault {
            message: message.into(),
        }
    }

    /// Creates an invalid transition error.
    #[inline]
    pub fn invalid_transition(operation: &'static str, state: ConnectionState) -> Self {
        Self::InvalidTransition { operation, state }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Construction { .. }
                | Self::TransportFault { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if calling `connect` again may succeed.
    ///
    /// Configuration and URL errors will fail the same way on every retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TransportFault { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
