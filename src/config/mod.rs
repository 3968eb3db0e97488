//! Bridge connection settings.
//!
//! Settings are supplied by the host at manager construction time. The
//! manager never persists or reloads them.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BridgeSettings`] | Host, port, ROS version and connect timeout |
//! | [`SettingsBuilder`] | Fluent, validating builder |
//! | [`RosVersion`] | ROS protocol generation of the server |
//!
//! # Example
//!
//! ```
//! use rosbridge_connection::{BridgeSettings, RosVersion};
//!
//! # fn example() -> rosbridge_connection::Result<()> {
//! let settings = BridgeSettings::builder()
//!     .host("robot.local")
//!     .port(9090)
//!     .version(RosVersion::Ros2)
//!     .build()?;
//!
//! assert_eq!(settings.ws_url()?.as_str(), "ws://robot.local:9090/");
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for settings.
pub mod builder;

/// Settings model and defaults.
pub mod settings;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::SettingsBuilder;
pub use settings::{BridgeSettings, RosVersion};
