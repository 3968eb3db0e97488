//! Settings model for a rosbridge connection.
//!
//! Field names and defaults follow the host plugin's settings schema:
//!
//! ```json
//! { "host": "localhost", "port": 9090, "version": "ROS1" }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::transport::Endpoint;

use super::builder::SettingsBuilder;

// ============================================================================
// Constants
// ============================================================================

/// Default rosbridge server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default rosbridge server port.
pub const DEFAULT_PORT: u16 = 9090;

// ============================================================================
// RosVersion
// ============================================================================

/// ROS generation spoken by the bridge server.
///
/// Opaque to the manager: handed to the transport and logged, never
/// branched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RosVersion {
    /// ROS 1 (rosbridge_suite on ROS Noetic and earlier).
    #[default]
    #[serde(rename = "ROS1")]
    Ros1,

    /// ROS 2.
    #[serde(rename = "ROS2")]
    Ros2,
}

impl fmt::Display for RosVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ros1 => f.write_str("ROS1"),
            Self::Ros2 => f.write_str("ROS2"),
        }
    }
}

// ============================================================================
// BridgeSettings
// ============================================================================

/// Connection settings for one rosbridge server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Server host name or IP address.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// ROS version of the server.
    pub version: RosVersion,

    /// Maximum time a connection attempt may stay pending, in milliseconds.
    ///
    /// `None` waits indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            version: RosVersion::default(),
            connect_timeout_ms: None,
        }
    }
}

// ============================================================================
// BridgeSettings - Constructors
// ============================================================================

impl BridgeSettings {
    /// Creates a settings builder starting from the defaults.
    #[inline]
    #[must_use]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Parses and validates settings from the host's JSON settings blob.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the blob is not valid settings JSON
    /// - [`Error::Config`] if a field value is invalid
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }
}

// ============================================================================
// BridgeSettings - Accessors
// ============================================================================

impl BridgeSettings {
    /// Returns the connect timeout, if one is configured.
    #[inline]
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// Returns the WebSocket URL of the bridge server.
    ///
    /// Format: `ws://{host}:{port}/`. Bare IPv6 literals are bracketed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if the host does not form a valid URL.
    pub fn ws_url(&self) -> Result<Url> {
        self.endpoint().ws_url()
    }

    /// Returns the endpoint handed to the transport.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port, self.version)
    }

    /// Checks that the settings can describe a reachable endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::config("host must not be empty"));
        }

        if self.host.chars().any(char::is_whitespace) {
            return Err(Error::config(format!(
                "host must not contain whitespace: {:?}",
                self.host
            )));
        }

        if self.port == 0 {
            return Err(Error::config("port must be between 1 and 65535"));
        }

        if self.connect_timeout_ms == Some(0) {
            return Err(Error::config(
                "connect_timeout_ms must be positive; omit it to wait indefinitely",
            ));
        }

        self.ws_url()
            .map_err(|e| Error::config(format!("host {:?} is not usable: {e}", self.host)))?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
