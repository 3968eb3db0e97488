//! Connection state and the guarded cell the manager and its transports share.
//!
//! Every transition of the state machine lives here:
//!
//! ```text
//! Disconnected --connect()------> Connecting
//! Connecting   --ready----------> Connected
//! Connecting   --error/timeout--> Error
//! Connected    --error----------> Error
//! Connected    --disconnect()---> Disconnected
//! Connecting   --disconnect()---> Disconnected
//! Error        --disconnect()---> Disconnected
//! Error        --connect()------> Connecting
//! ```
//!
//! Notifications carry the [`Generation`] of the transport that sent them and
//! only apply while it is the current one. A ready notification that arrives
//! before its transport is installed is held and applied by `install`.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::AbortHandle;

use crate::identifiers::Generation;
use crate::transport::Transport;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of a connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No transport is owned.
    #[default]
    Disconnected,
    /// A transport is handshaking.
    Connecting,
    /// The owned transport is open.
    Connected,
    /// The last attempt or connection failed.
    Error,
}

impl ConnectionState {
    /// Returns `true` if a connection attempt is running or established.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }

    /// Returns the lowercase state name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ConnectionStatus
// ============================================================================

/// Snapshot of a manager's observable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    /// Current state.
    pub state: ConnectionState,

    /// Failure detail; present only in [`ConnectionState::Error`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    /// Generation of the most recent connection attempt.
    pub generation: Generation,
}

impl ConnectionStatus {
    /// Returns `true` if the manager is connected.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last_error {
            Some(detail) => write!(f, "{}: {}", self.state, detail),
            None => write!(f, "{}", self.state),
        }
    }
}

// ============================================================================
// ReadyDisposition
// ============================================================================

/// What became of a ready notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadyDisposition {
    /// The manager is now Connected.
    Applied,
    /// The transport is not installed yet; `install` will apply it.
    Deferred,
    /// Superseded generation, wrong state, or transport not open.
    Stale,
}

// ============================================================================
// StateCell
// ============================================================================

/// Mutable manager state, always accessed under the manager's mutex.
pub(crate) struct StateCell {
    state: ConnectionState,
    generation: Generation,
    transport: Option<Box<dyn Transport>>,
    last_error: Option<String>,
    /// Pending connect-timeout timer of the current attempt.
    timer: Option<AbortHandle>,
    /// Ready reported while `open` was still running.
    pending_ready: Option<Generation>,
    status_tx: watch::Sender<ConnectionStatus>,
}

impl StateCell {
    /// Creates a disconnected cell.
    pub(crate) fn new() -> Self {
        let status = ConnectionStatus {
            state: ConnectionState::Disconnected,
            last_error: None,
            generation: Generation::initial(),
        };
        let (status_tx, _) = watch::channel(status);

        Self {
            state: ConnectionState::Disconnected,
            generation: Generation::initial(),
            transport: None,
            last_error: None,
            timer: None,
            pending_ready: None,
            status_tx,
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    #[inline]
    pub(crate) fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    pub(crate) fn snapshot(&self) -> ConnectionStatus {
        ConnectionStatus {
            state: self.state,
            last_error: self.last_error.clone(),
            generation: self.generation,
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.snapshot());
    }

    fn enter(&mut self, state: ConnectionState, last_error: Option<String>) {
        self.state = state;
        self.last_error = last_error;
        self.pending_ready = None;
        if state != ConnectionState::Connecting
            && let Some(timer) = self.timer.take()
        {
            timer.abort();
        }
        self.publish();
    }

    // ========================================================================
    // Caller-side transitions
    // ========================================================================

    /// Takes the transport left over from a failed attempt.
    ///
    /// The state is untouched, so notifications from that transport stay
    /// stale while it closes.
    pub(crate) fn take_transport(&mut self) -> Option<Box<dyn Transport>> {
        debug_assert!(!self.state.is_active());
        self.transport.take()
    }

    /// Starts a new attempt: Connecting under the next generation.
    pub(crate) fn begin_attempt(&mut self) -> Generation {
        debug_assert!(!self.state.is_active());
        debug_assert!(self.transport.is_none());

        self.generation = self.generation.next();
        self.enter(ConnectionState::Connecting, None);

        self.generation
    }

    /// Installs the transport created for `generation`.
    ///
    /// The transport may already have reported while `open` ran. A deferred
    /// ready is applied here once the transport is open. If the attempt has
    /// already failed, the transport is still kept so the next `connect` or
    /// `disconnect` releases it, and the timer is disarmed.
    pub(crate) fn install(
        &mut self,
        generation: Generation,
        transport: Box<dyn Transport>,
        timer: Option<AbortHandle>,
    ) -> ConnectionStatus {
        debug_assert_eq!(generation, self.generation);
        debug_assert!(self.transport.is_none());

        let ready = self.pending_ready.take() == Some(generation) && transport.is_open();
        self.transport = Some(transport);

        if self.state == ConnectionState::Connecting {
            self.timer = timer;
            if ready {
                self.enter(ConnectionState::Connected, None);
            }
        } else if let Some(timer) = timer {
            timer.abort();
        }

        self.snapshot()
    }

    /// Records a synchronous construction failure.
    pub(crate) fn fail(&mut self, detail: String) {
        self.enter(ConnectionState::Error, Some(detail));
    }

    /// Returns to Disconnected, handing back the owned transport.
    pub(crate) fn release(&mut self) -> (ConnectionState, Option<Box<dyn Transport>>) {
        let previous = self.state;
        let transport = self.transport.take();

        if previous != ConnectionState::Disconnected {
            self.enter(ConnectionState::Disconnected, None);
        }

        (previous, transport)
    }

    // ========================================================================
    // Transport-side transitions
    // ========================================================================

    /// Applies a ready notification.
    pub(crate) fn apply_ready(&mut self, generation: Generation) -> ReadyDisposition {
        if generation != self.generation || self.state != ConnectionState::Connecting {
            return ReadyDisposition::Stale;
        }

        match &self.transport {
            None => {
                self.pending_ready = Some(generation);
                ReadyDisposition::Deferred
            }
            Some(transport) if transport.is_open() => {
                self.enter(ConnectionState::Connected, None);
                ReadyDisposition::Applied
            }
            Some(_) => ReadyDisposition::Stale,
        }
    }

    /// Applies an error notification. Returns `false` if it was stale.
    pub(crate) fn apply_error(&mut self, generation: Generation, detail: String) -> bool {
        let is_current = generation == self.generation && self.state.is_active();

        if is_current {
            self.enter(ConnectionState::Error, Some(detail));
        }
        is_current
    }

    /// Applies an expired connect timeout. Returns `false` if the attempt
    /// already settled or was superseded.
    pub(crate) fn apply_timeout(&mut self, generation: Generation, detail: String) -> bool {
        let is_current =
            generation == self.generation && self.state == ConnectionState::Connecting;

        if is_current {
            // The timer is the task running this call; it finishes on its own.
            self.timer = None;
            self.enter(ConnectionState::Error, Some(detail));
        }
        is_current
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    struct FlagTransport(Arc<AtomicBool>);

    #[async_trait]
    impl Transport for FlagTransport {
        fn is_open(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }

        fn shutdown(&self) {
            self.0.store(false, Ordering::SeqCst);
        }

        async fn close(&self) {
            self.shutdown();
        }
    }

    fn open_transport() -> (Box<dyn Transport>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(true));
        (Box::new(FlagTransport(Arc::clone(&flag))), flag)
    }

    #[test]
    fn test_new_cell_is_disconnected() {
        let cell = StateCell::new();
        assert_eq!(cell.state(), ConnectionState::Disconnected);
        assert!(!cell.has_transport());
        assert_eq!(cell.snapshot().generation, Generation::initial());
    }

    #[test]
    fn test_begin_attempt_bumps_generation() {
        let mut cell = StateCell::new();
        let first = cell.begin_attempt();
        assert_eq!(cell.state(), ConnectionState::Connecting);

        cell.fail("refused".into());
        let second = cell.begin_attempt();
        assert!(second > first);
        assert!(cell.snapshot().last_error.is_none());
    }

    #[test]
    fn test_ready_requires_open_transport() {
        let mut cell = StateCell::new();
        let generation = cell.begin_attempt();
        let (transport, flag) = open_transport();
        flag.store(false, Ordering::SeqCst);
        cell.install(generation, transport, None);

        assert_eq!(cell.apply_ready(generation), ReadyDisposition::Stale);
        flag.store(true, Ordering::SeqCst);
        assert_eq!(cell.apply_ready(generation), ReadyDisposition::Applied);
        assert_eq!(cell.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_ready_before_install_is_applied_on_install() {
        let mut cell = StateCell::new();
        let generation = cell.begin_attempt();

        assert_eq!(cell.apply_ready(generation), ReadyDisposition::Deferred);
        assert_eq!(cell.state(), ConnectionState::Connecting);

        let (transport, _) = open_transport();
        let status = cell.install(generation, transport, None);
        assert_eq!(status.state, ConnectionState::Connected);
        assert!(cell.has_transport());
    }

    #[test]
    fn test_deferred_ready_needs_open_transport() {
        let mut cell = StateCell::new();
        let generation = cell.begin_attempt();
        cell.apply_ready(generation);

        let (transport, flag) = open_transport();
        flag.store(false, Ordering::SeqCst);
        let status = cell.install(generation, transport, None);
        assert_eq!(status.state, ConnectionState::Connecting);
    }

    #[test]
    fn test_error_before_install_keeps_transport() {
        let mut cell = StateCell::new();
        let generation = cell.begin_attempt();
        cell.apply_ready(generation);
        assert!(cell.apply_error(generation, "refused".into()));

        let (transport, _) = open_transport();
        let status = cell.install(generation, transport, None);
        assert_eq!(status.state, ConnectionState::Error);
        assert_eq!(status.last_error.as_deref(), Some("refused"));
        assert!(cell.has_transport());

        let (previous, transport) = cell.release();
        assert_eq!(previous, ConnectionState::Error);
        assert!(transport.is_some());
    }

    #[test]
    fn test_take_transport_leaves_error_state() {
        let mut cell = StateCell::new();
        let generation = cell.begin_attempt();
        let (transport, _) = open_transport();
        cell.install(generation, transport, None);
        cell.apply_error(generation, "reset".into());

        assert!(cell.take_transport().is_some());
        assert_eq!(cell.state(), ConnectionState::Error);
        assert_eq!(cell.snapshot().last_error.as_deref(), Some("reset"));
        assert!(!cell.has_transport());
        assert_eq!(cell.apply_ready(generation), ReadyDisposition::Stale);
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let mut cell = StateCell::new();
        let old = cell.begin_attempt();
        cell.fail("refused".into());
        let current = cell.begin_attempt();
        let (transport, _) = open_transport();
        cell.install(current, transport, None);

        assert_eq!(cell.apply_ready(old), ReadyDisposition::Stale);
        assert!(!cell.apply_error(old, "late".into()));
        assert_eq!(cell.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_error_only_applies_while_active() {
        let mut cell = StateCell::new();
        let generation = cell.begin_attempt();
        let (transport, _) = open_transport();
        cell.install(generation, transport, None);

        assert!(cell.apply_error(generation, "reset".into()));
        assert!(!cell.apply_error(generation, "again".into()));
        assert_eq!(cell.snapshot().last_error.as_deref(), Some("reset"));
    }

    #[test]
    fn test_timeout_only_applies_while_connecting() {
        let mut cell = StateCell::new();
        let generation = cell.begin_attempt();
        let (transport, _) = open_transport();
        cell.install(generation, transport, None);
        assert_eq!(cell.apply_ready(generation), ReadyDisposition::Applied);

        assert!(!cell.apply_timeout(generation, "timeout".into()));
        assert_eq!(cell.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_release_clears_everything() {
        let mut cell = StateCell::new();
        let generation = cell.begin_attempt();
        let (transport, _) = open_transport();
        cell.install(generation, transport, None);
        cell.apply_error(generation, "reset".into());

        let (previous, transport) = cell.release();
        assert_eq!(previous, ConnectionState::Error);
        assert!(transport.is_some());
        assert_eq!(cell.state(), ConnectionState::Disconnected);
        assert!(cell.snapshot().last_error.is_none());
        assert!(!cell.has_transport());
    }

    #[test]
    fn test_transitions_are_published() {
        let mut cell = StateCell::new();
        let rx = cell.subscribe();
        cell.begin_attempt();
        assert_eq!(rx.borrow().state, ConnectionState::Connecting);
        cell.fail("refused".into());
        assert_eq!(rx.borrow().last_error.as_deref(), Some("refused"));
    }

    #[test]
    fn test_status_display() {
        let status = ConnectionStatus {
            state: ConnectionState::Error,
            last_error: Some("reset".into()),
            generation: Generation::initial().next(),
        };
        assert_eq!(status.to_string(), "error: reset");
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
    }

    #[test]
    fn test_status_serialization() {
        let status = ConnectionStatus {
            state: ConnectionState::Connected,
            last_error: None,
            generation: Generation::initial().next(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json, serde_json::json!({"state": "connected", "generation": 1}));
    }
}
