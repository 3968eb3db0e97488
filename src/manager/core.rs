//! Connection manager for one rosbridge server.
//!
//! The [`ConnectionManager`] owns at most one transport at a time and moves
//! through the lifecycle documented in [`state`](super::state).
//!
//! # Example
//!
//! ```no_run
//! use rosbridge_connection::{BridgeSettings, ConnectionManager};
//!
//! # async fn example() -> rosbridge_connection::Result<()> {
//! let manager = ConnectionManager::new(BridgeSettings::default());
//!
//! println!("{}", manager.connect().await);
//! manager.wait_connected().await?;
//!
//! println!("{}", manager.disconnect().await);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::config::BridgeSettings;
use crate::error::{Error, Result};
use crate::identifiers::Generation;
use crate::transport::{Endpoint, Transport, TransportFactory, WebSocketFactory};

use super::events::EventSink;
use super::outcome::{ConnectOutcome, DisconnectOutcome};
use super::state::{ConnectionState, ConnectionStatus, StateCell};

// ============================================================================
// Constants
// ============================================================================

/// Upper bound on waiting for a transport to close.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// ConnectionManager
// ============================================================================

/// Lifecycle manager for a single connection to a rosbridge server.
///
/// # Thread Safety
///
/// `ConnectionManager` is `Send + Sync`. Share it behind an `Arc` when
/// several tasks drive it. `connect` and `disconnect` are serialized with
/// each other; `status` never waits on them.
///
/// Dropping the manager shuts down any owned transport.
pub struct ConnectionManager {
    /// Immutable connection settings.
    settings: BridgeSettings,
    /// Endpoint derived from `settings`.
    endpoint: Endpoint,
    /// Creates a transport per connection attempt.
    factory: Arc<dyn TransportFactory>,
    /// State shared with transport notifications.
    cell: Arc<Mutex<StateCell>>,
    /// Serializes `connect` and `disconnect`.
    ops: AsyncMutex<()>,
}

// ============================================================================
// ConnectionManager - Constructors
// ============================================================================

impl ConnectionManager {
    /// Creates a disconnected manager using the WebSocket transport.
    #[must_use]
    pub fn new(settings: BridgeSettings) -> Self {
        Self::with_factory(settings, Arc::new(WebSocketFactory::new()))
    }

    /// Creates a disconnected manager using a custom transport factory.
    #[must_use]
    pub fn with_factory(settings: BridgeSettings, factory: Arc<dyn TransportFactory>) -> Self {
        let endpoint = settings.endpoint();
        debug!(%endpoint, "Connection manager created");

        Self {
            settings,
            endpoint,
            factory,
            cell: Arc::new(Mutex::new(StateCell::new())),
            ops: AsyncMutex::new(()),
        }
    }
}

// ============================================================================
// ConnectionManager - Accessors
// ============================================================================

impl ConnectionManager {
    /// Returns the server host.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.settings.host
    }

    /// Returns the server port.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.settings.port
    }

    /// Returns the settings the manager was built with.
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Returns a snapshot of the current status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.cell.lock().snapshot()
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.cell.lock().state()
    }

    /// Returns `true` if a transport is currently owned.
    #[inline]
    #[must_use]
    pub fn has_transport(&self) -> bool {
        self.cell.lock().has_transport()
    }

    /// Subscribes to status changes.
    ///
    /// The receiver starts at the current status and sees every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.cell.lock().subscribe()
    }

    /// Waits until no attempt is pending and returns the resulting status.
    ///
    /// Returns immediately unless the manager is Connecting. Without a
    /// connect timeout this may wait as long as the transport does.
    pub async fn settled(&self) -> ConnectionStatus {
        let mut rx = self.subscribe();
        match rx
            .wait_for(|status| status.state != ConnectionState::Connecting)
            .await
        {
            Ok(status) => status.clone(),
            Err(_) => self.status(),
        }
    }

    /// Waits for the pending attempt to settle and reports whether it connected.
    ///
    /// # Errors
    ///
    /// - [`Error::TransportFault`] if the attempt ended in Error
    /// - [`Error::ConnectionClosed`] if the manager was disconnected
    pub async fn wait_connected(&self) -> Result<()> {
        let status = self.settled().await;
        match status.state {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Error => Err(Error::transport_fault(
                status.last_error.unwrap_or_default(),
            )),
            ConnectionState::Disconnected | ConnectionState::Connecting => {
                Err(Error::ConnectionClosed)
            }
        }
    }
}

// ============================================================================
// ConnectionManager - Lifecycle
// ============================================================================

impl ConnectionManager {
    /// Starts a connection attempt.
    ///
    /// Returns once the attempt has been initiated; the handshake result is
    /// reported through [`status`](Self::status). A call while Connecting or
    /// Connected opens nothing and reports the current status. A transport
    /// left over from a failed attempt is closed before the new one opens.
    pub async fn connect(&self) -> ConnectOutcome {
        let _op = self.ops.lock().await;

        let previous = {
            let mut cell = self.cell.lock();
            if cell.state().is_active() {
                let status = cell.snapshot();
                debug!(state = %status.state, "Connect ignored, attempt already active");
                return ConnectOutcome::AlreadyActive { status };
            }
            cell.take_transport()
        };

        // Closed while still in Error: a cancelled connect leaves a retryable manager.
        if let Some(previous) = previous {
            debug!("Closing superseded transport");
            close_transport(previous).await;
        }

        // No await from here on.
        let generation = self.cell.lock().begin_attempt();
        info!(endpoint = %self.endpoint, %generation, "Trying connection to ROS server");

        match self.start_attempt(generation) {
            Ok((transport, timer)) => {
                let status = self.cell.lock().install(generation, transport, timer);
                match status.state {
                    ConnectionState::Connected => {
                        info!(%generation, "Connected to ROS server");
                        ConnectOutcome::Initiated { generation }
                    }
                    ConnectionState::Error => {
                        let detail = status.last_error.unwrap_or_default();
                        error!(%generation, %detail, "Connection failed while opening");
                        ConnectOutcome::Failed {
                            error: Error::transport_fault(detail),
                        }
                    }
                    ConnectionState::Connecting | ConnectionState::Disconnected => {
                        ConnectOutcome::Initiated { generation }
                    }
                }
            }
            Err(error) => {
                let detail = match &error {
                    Error::Construction { message } => message.clone(),
                    other => other.to_string(),
                };
                error!(%generation, %detail, "Connection failed");
                self.cell.lock().fail(detail);
                ConnectOutcome::Failed { error }
            }
        }
    }

    /// Closes the connection and returns to Disconnected.
    ///
    /// Callable in any state. An owned transport is always released; an open
    /// one is closed first, waiting at most a few seconds for it.
    pub async fn disconnect(&self) -> DisconnectOutcome {
        let _op = self.ops.lock().await;

        let (previous, transport) = self.cell.lock().release();

        if let Some(transport) = transport {
            close_transport(transport).await;
        }

        match previous {
            ConnectionState::Disconnected => {
                debug!("Disconnect ignored, not connected");
                DisconnectOutcome::NotConnected
            }
            ConnectionState::Connected => {
                info!(endpoint = %self.endpoint, "Disconnected from ROS server");
                DisconnectOutcome::Disconnected
            }
            previous @ (ConnectionState::Connecting | ConnectionState::Error) => {
                info!(endpoint = %self.endpoint, %previous, "Released connection");
                DisconnectOutcome::Released { previous }
            }
        }
    }

    /// Creates the transport and, if configured, its connect-timeout timer.
    ///
    /// Runs without the state lock held, so the transport may report through
    /// its sink from inside `open`.
    fn start_attempt(
        &self,
        generation: Generation,
    ) -> Result<(Box<dyn Transport>, Option<tokio::task::AbortHandle>)> {
        let events = EventSink::new(generation, &self.cell);

        let deadline = match self.settings.connect_timeout() {
            Some(limit) => {
                let runtime = Handle::try_current().map_err(|e| {
                    Error::construction(format!("connect timeout requires a tokio runtime: {e}"))
                })?;
                Some((limit, runtime))
            }
            None => None,
        };

        let transport = self
            .factory
            .open(&self.endpoint, events.clone())
            .map_err(|e| match e {
                Error::Construction { .. } => e,
                other => Error::construction(other.to_string()),
            })?;

        let timer = deadline.map(|(limit, runtime)| {
            debug!(%generation, timeout_ms = limit.as_millis() as u64, "Connect timeout armed");
            runtime
                .spawn(async move {
                    sleep(limit).await;
                    events.timed_out(limit);
                })
                .abort_handle()
        });

        Ok((transport, timer))
    }
}

/// Closes a transport, giving up after [`CLOSE_TIMEOUT`].
async fn close_transport(transport: Box<dyn Transport>) {
    if timeout(CLOSE_TIMEOUT, transport.close()).await.is_err() {
        warn!(
            timeout_ms = CLOSE_TIMEOUT.as_millis() as u64,
            "Transport did not close in time, abandoning it"
        );
        transport.shutdown();
    }
}

// ============================================================================
// ConnectionManager - Traits
// ============================================================================

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("endpoint", &self.endpoint)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        let (_, transport) = self.cell.lock().release();
        if let Some(transport) = transport {
            debug!(endpoint = %self.endpoint, "Force-closing transport on drop");
            transport.shutdown();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
