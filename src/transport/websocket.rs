//! WebSocket client transport to a rosbridge server.
//!
//! # Event Loop
//!
//! Each transport spawns one tokio task that:
//!
//! - Performs the client handshake, reporting `ready` or `error`
//! - Reads frames from the server until it closes or faults
//! - Handles shutdown requests from the manager
//!
//! Frames from the server are logged and otherwise dropped. Publishing,
//! subscribing and service calls belong to higher layers.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};
use url::Url;

use crate::config::RosVersion;
use crate::error::{Error, Result};

use super::{Endpoint, EventSink, Transport, TransportFactory};

// ============================================================================
// TransportCommand
// ============================================================================

/// Internal commands for the event loop.
enum TransportCommand {
    /// Close the connection, or abandon the handshake.
    Shutdown,
}

// ============================================================================
// WebSocketFactory
// ============================================================================

/// Creates [`WebSocketTransport`]s on the current tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketFactory;

impl WebSocketFactory {
    /// Creates a factory.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TransportFactory for WebSocketFactory {
    fn open(&self, endpoint: &Endpoint, events: EventSink) -> Result<Box<dyn Transport>> {
        let url = endpoint.ws_url()?;
        let runtime = Handle::try_current().map_err(|e| {
            Error::construction(format!("WebSocket transport requires a tokio runtime: {e}"))
        })?;

        debug!(
            %url,
            version = %endpoint.version,
            generation = %events.generation(),
            "Opening WebSocket transport"
        );

        Ok(Box::new(WebSocketTransport::spawn(
            &runtime,
            url,
            endpoint.version,
            events,
        )))
    }
}

// ============================================================================
// WebSocketTransport
// ============================================================================

/// WebSocket connection to a rosbridge server.
///
/// Dropping the transport asks its task to shut down without waiting.
pub struct WebSocketTransport {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<TransportCommand>,
    /// Set once the handshake completes, cleared when the loop ends.
    open: Arc<AtomicBool>,
    /// Event loop task, taken by `close`.
    task: Mutex<Option<JoinHandle<()>>>,
}

impl WebSocketTransport {
    /// Spawns the event loop and starts the handshake.
    pub(crate) fn spawn(runtime: &Handle, url: Url, version: RosVersion, events: EventSink) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(false));

        let task = runtime.spawn(Self::run_event_loop(
            url,
            version,
            command_rx,
            Arc::clone(&open),
            events,
        ));

        Self {
            command_tx,
            open,
            task: Mutex::new(Some(task)),
        }
    }

    /// Event loop that handles the handshake and WebSocket I/O.
    async fn run_event_loop(
        url: Url,
        version: RosVersion,
        mut command_rx: mpsc::UnboundedReceiver<TransportCommand>,
        open: Arc<AtomicBool>,
        events: EventSink,
    ) {
        let generation = events.generation();

        let handshake = tokio::select! {
            result = connect_async(url.as_str()) => result,
            _ = command_rx.recv() => {
                debug!(%generation, "Handshake abandoned");
                return;
            }
        };

        let ws_stream = match handshake {
            Ok((ws_stream, response)) => {
                debug!(%generation, %version, status = %response.status(), "WebSocket handshake completed");
                ws_stream
            }
            Err(e) => {
                events.error(Error::from(e).to_string());
                return;
            }
        };

        open.store(true, Ordering::SeqCst);
        events.ready();

        let (mut ws_write, mut ws_read) = ws_stream.split();

        let fault = loop {
            tokio::select! {
                // Incoming frames from the bridge
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_message(&text);
                        }

                        Some(Ok(Message::Close(frame))) => {
                            break Some(match frame {
                                Some(frame) => format!(
                                    "connection closed by server ({}): {}",
                                    u16::from(frame.code),
                                    frame.reason.as_str()
                                ),
                                None => "connection closed by server".to_string(),
                            });
                        }

                        Some(Err(e)) => break Some(Error::from(e).to_string()),

                        None => break Some("WebSocket stream ended".to_string()),

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from the manager
                command = command_rx.recv() => {
                    match command {
                        Some(TransportCommand::Shutdown) | None => {
                            debug!(%generation, "Shutdown command received");
                            if let Err(e) = ws_write.close().await {
                                debug!(%generation, error = %e, "Close handshake failed");
                            }
                            break None;
                        }
                    }
                }
            }
        };

        open.store(false, Ordering::SeqCst);

        if let Some(detail) = fault {
            warn!(%generation, %detail, "WebSocket connection lost");
            events.error(detail);
        }

        debug!(%generation, "Event loop terminated");
    }

    /// Logs a text frame from the bridge.
    fn handle_incoming_message(text: &str) {
        let Ok(value) = serde_json::from_str::<Value>(text) else {
            warn!(text = %text, "Failed to parse incoming message");
            return;
        };

        match value.get("op").and_then(Value::as_str) {
            Some("status") => {
                let level = value.get("level").and_then(Value::as_str).unwrap_or("info");
                let msg = value.get("msg").and_then(Value::as_str).unwrap_or_default();
                debug!(level, msg, "Bridge status message");
            }
            op => trace!(?op, "Ignoring bridge message"),
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn shutdown(&self) {
        let _ = self.command_tx.send(TransportCommand::Shutdown);
    }

    async fn close(&self) {
        self.shutdown();

        let task = self.task.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            debug!(error = %e, "Transport task ended abnormally");
        }
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// Tests
// ============================================================================
