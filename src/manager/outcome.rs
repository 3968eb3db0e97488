//! Acknowledgements returned by `connect` and `disconnect`.
//!
//! Both render as the short messages the host relays to the user.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::identifiers::Generation;

use super::state::{ConnectionState, ConnectionStatus};

// ============================================================================
// ConnectOutcome
// ============================================================================

/// Result of a `connect` call.
///
/// `Initiated` only means the attempt started; the outcome arrives later
/// through the manager's status.
#[derive(Debug)]
pub enum ConnectOutcome {
    /// A new transport was created and is handshaking.
    Initiated {
        /// Generation of the new transport.
        generation: Generation,
    },

    /// An attempt is already running or established; nothing was opened.
    AlreadyActive {
        /// Status at the time of the call.
        status: ConnectionStatus,
    },

    /// The transport could not be created or started.
    ///
    /// The manager is now in [`ConnectionState::Error`].
    Failed {
        /// The construction failure.
        error: Error,
    },
}

impl ConnectOutcome {
    /// Returns `true` if a new attempt was started.
    #[inline]
    #[must_use]
    pub fn is_initiated(&self) -> bool {
        matches!(self, Self::Initiated { .. })
    }

    /// Returns the generation of the started attempt.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> Option<Generation> {
        match self {
            Self::Initiated { generation } => Some(*generation),
            _ => None,
        }
    }

    /// Converts into a [`Result`] for callers that want `?`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidTransition`] if an attempt was already active
    /// - [`Error::Construction`] if the transport could not be started
    pub fn into_result(self) -> Result<Generation> {
        match self {
            Self::Initiated { generation } => Ok(generation),
            Self::AlreadyActive { status } => Err(Error::invalid_transition("connect", status.state)),
            Self::Failed { error } => Err(error),
        }
    }
}

impl fmt::Display for ConnectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initiated { .. } => f.write_str("Connection initiated"),
            Self::AlreadyActive { status } if status.is_connected() => {
                f.write_str("Already connected to ROS server")
            }
            Self::AlreadyActive { .. } => f.write_str("Connection already in progress"),
            Self::Failed { error } => write!(f, "{error}"),
        }
    }
}

// ============================================================================
// DisconnectOutcome
// ============================================================================

/// Result of a `disconnect` call. The manager is Disconnected in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DisconnectOutcome {
    /// An established connection was closed.
    Disconnected,

    /// A pending or failed connection was discarded.
    Released {
        /// State before the call.
        previous: ConnectionState,
    },

    /// Nothing to do.
    NotConnected,
}

impl fmt::Display for DisconnectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("Disconnected successfully"),
            Self::Released { previous } => write!(f, "Not connected ({previous}); connection released"),
            Self::NotConnected => f.write_str("Not connected"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
