//! Builder pattern for bridge settings.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use rosbridge_connection::SettingsBuilder;
//!
//! # fn example() -> rosbridge_connection::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .host("192.168.1.20")
//!     .connect_timeout(Duration::from_secs(5))
//!     .build()?;
//!
//! assert_eq!(settings.port, 9090);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::Result;

use super::settings::{BridgeSettings, RosVersion};

// ============================================================================
// SettingsBuilder
// ============================================================================

/// Builder for [`BridgeSettings`].
///
/// Unset fields keep the plugin defaults (`localhost:9090`, ROS1, no
/// connect timeout).
#[derive(Debug, Default, Clone)]
pub struct SettingsBuilder {
    settings: BridgeSettings,
}

// ============================================================================
// SettingsBuilder Implementation
// ============================================================================

impl SettingsBuilder {
    /// Creates a builder holding the default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bridge server host.
    #[inline]
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.settings.host = host.into();
        self
    }

    /// Sets the bridge server port.
    #[inline]
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.settings.port = port;
        self
    }

    /// Sets the ROS version passed to the transport.
    #[inline]
    #[must_use]
    pub fn version(mut self, version: RosVersion) -> Self {
        self.settings.version = version;
        self
    }

    /// Bounds how long a connection attempt may stay pending.
    ///
    /// Sub-millisecond remainders are truncated.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.settings.connect_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Builds the settings with validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if any field is invalid.
    pub fn build(self) -> Result<BridgeSettings> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

// ============================================================================
// Tests
// ============================================================================
