//! Connection lifecycle management.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ConnectionManager`] | Owns the transport and drives the state machine |
//! | [`ConnectionState`] | Disconnected, Connecting, Connected, Error |
//! | [`ConnectionStatus`] | State snapshot with the last error |
//! | [`ConnectOutcome`] / [`DisconnectOutcome`] | Acknowledgements for the host |
//! | [`EventSink`] | Generation-tagged notification handle for transports |

// ============================================================================
// Submodules
// ============================================================================

/// Connection manager.
pub mod core;

/// Transport notification handle.
pub mod events;

/// Operation acknowledgements.
pub mod outcome;

/// States, status snapshots and transitions.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::ConnectionManager;
pub use events::EventSink;
pub use outcome::{ConnectOutcome, DisconnectOutcome};
pub use state::{ConnectionState, ConnectionStatus};
