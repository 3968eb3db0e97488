//! Generation-tagged notification handle given to transports.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::identifiers::Generation;

use super::state::{ReadyDisposition, StateCell};

// ============================================================================
// EventSink
// ============================================================================

/// Handle through which a transport reports readiness and faults.
///
/// Bound to the generation of the transport it was handed to. Reports from a
/// superseded generation, or arriving after the manager was dropped, are
/// discarded.
///
/// The sink may be cloned and moved to any task, and may be called from
/// inside [`TransportFactory::open`](crate::transport::TransportFactory::open).
/// Its methods lock the manager's state briefly and never await.
#[derive(Clone)]
pub struct EventSink {
    generation: Generation,
    cell: Weak<Mutex<StateCell>>,
}

impl EventSink {
    pub(crate) fn new(generation: Generation, cell: &Arc<Mutex<StateCell>>) -> Self {
        Self {
            generation,
            cell: Arc::downgrade(cell),
        }
    }

    /// Returns the generation this sink reports for.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Reports that the connection became ready.
    pub fn ready(&self) {
        let Some(cell) = self.cell.upgrade() else {
            debug!(generation = %self.generation, "Ready after manager dropped");
            return;
        };

        let mut cell = cell.lock();
        match cell.apply_ready(self.generation) {
            ReadyDisposition::Applied => {
                info!(generation = %self.generation, "Connected to ROS server");
            }
            ReadyDisposition::Deferred => {
                debug!(generation = %self.generation, "Ready before transport installed");
            }
            ReadyDisposition::Stale => {
                debug!(
                    generation = %self.generation,
                    state = %cell.state(),
                    "Ignoring stale ready notification"
                );
            }
        }
    }

    /// Reports a connection fault.
    pub fn error(&self, detail: impl Into<String>) {
        let detail = detail.into();
        let Some(cell) = self.cell.upgrade() else {
            debug!(generation = %self.generation, %detail, "Error after manager dropped");
            return;
        };

        let mut cell = cell.lock();
        if cell.apply_error(self.generation, detail.clone()) {
            error!(generation = %self.generation, %detail, "ROS connection error");
        } else {
            debug!(
                generation = %self.generation,
                state = %cell.state(),
                %detail,
                "Ignoring stale error notification"
            );
        }
    }

    /// Reports that the connect timeout elapsed.
    pub(crate) fn timed_out(&self, timeout: Duration) {
        let Some(cell) = self.cell.upgrade() else {
            return;
        };

        let timeout_ms = timeout.as_millis() as u64;
        let detail = Error::connection_timeout(timeout_ms).to_string();

        if cell.lock().apply_timeout(self.generation, detail) {
            warn!(generation = %self.generation, timeout_ms, "Connection attempt timed out");
        }
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("generation", &self.generation)
            .field("attached", &(self.cell.strong_count() > 0))
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
