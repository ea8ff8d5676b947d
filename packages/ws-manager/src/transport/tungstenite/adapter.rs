//! WebSocket Transport
//!
//! Transport backed by `tokio-tungstenite`. Opening is non-blocking: the
//! handshake and the read loop run on a task spawned onto the current tokio
//! runtime, and failures are reported through logs and the ready state.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn, Instrument};

use crate::connection::payload::Payload;
use crate::connection::state::ReadyStateTracker;
use crate::error::ConnectionError;
use crate::transport::adapter::{Connector, Listener, Listeners, Transport};

/// Default time allowed for the WebSocket handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long to wait for the server to acknowledge a client close
const CLOSE_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens [`TungsteniteTransport`]s
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    connect_timeout: Duration,
}

impl TungsteniteConnector {
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set the handshake timeout
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

impl Default for TungsteniteConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for TungsteniteConnector {
    type Transport = TungsteniteTransport;

    fn open(&self, url: &str) -> Result<TungsteniteTransport, ConnectionError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ConnectionError::NoRuntime)?;

        let listeners = Listeners::new();
        let state = ReadyStateTracker::new();
        let (close_tx, close_rx) = watch::channel(false);

        let task = ReaderTask {
            url: url.to_string(),
            connect_timeout: self.connect_timeout,
            listeners: listeners.clone(),
            state: state.clone(),
            close_rx,
        };
        runtime.spawn(task.run().instrument(tracing::Span::current()));

        Ok(TungsteniteTransport {
            listeners,
            state,
            close_tx,
        })
    }
}

/// A WebSocket connection driven by a background reader task
pub struct TungsteniteTransport {
    listeners: Listeners,
    state: ReadyStateTracker,
    close_tx: watch::Sender<bool>,
}

impl Transport for TungsteniteTransport {
    fn add_listener(&self, listener: Listener) {
        self.listeners.push(listener);
    }

    fn close(&self) {
        if self.state.is_shutting_down() {
            debug!(state = %self.state.current(), "Close requested on a connection that is already shutting down");
        } else {
            self.state.set_closing(Some("Close requested".to_string()));
        }
        // The reader task may already be gone; nothing left to signal then.
        let _ = self.close_tx.send(true);
    }

    fn state(&self) -> &ReadyStateTracker {
        &self.state
    }
}

/// Why the read loop stopped
enum LoopExit {
    Remote,
    CloseRequested,
}

struct ReaderTask {
    url: String,
    connect_timeout: Duration,
    listeners: Listeners,
    state: ReadyStateTracker,
    close_rx: watch::Receiver<bool>,
}

impl ReaderTask {
    async fn run(self) {
        let ReaderTask {
            url,
            connect_timeout,
            listeners,
            state,
            mut close_rx,
        } = self;

        info!(url = %url, "Connecting to WebSocket endpoint");

        let ws_stream = tokio::select! {
            result = timeout(connect_timeout, connect_async(url.as_str())) => {
                match result {
                    Ok(Ok((stream, _response))) => stream,
                    Ok(Err(e)) => {
                        let err = ConnectionError::Handshake(e);
                        error!(url = %url, error = %err, "WebSocket connection failed");
                        state.set_closed(Some(err.to_string()));
                        return;
                    }
                    Err(_) => {
                        let err = ConnectionError::Timeout(connect_timeout);
                        error!(url = %url, error = %err, "WebSocket connection failed");
                        state.set_closed(Some(err.to_string()));
                        return;
                    }
                }
            }
            _ = wait_for_close(&mut close_rx) => {
                info!(url = %url, "Close requested before the handshake finished");
                state.set_closed(Some("Closed while connecting".to_string()));
                return;
            }
        };

        if !state.set_open() {
            // close() raced the handshake; the loop below sends the close frame
            debug!(state = %state.current(), "Handshake finished after close was requested");
        } else {
            info!(url = %url, "WebSocket connection established");
        }

        let (mut write, mut read) = ws_stream.split();

        let exit = loop {
            tokio::select! {
                biased;

                _ = wait_for_close(&mut close_rx) => {
                    break LoopExit::CloseRequested;
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if state.is_open() {
                                listeners.dispatch(Payload::Text(text));
                            } else {
                                debug!(state = %state.current(), "Discarding text frame received while closing");
                            }
                        }
                        Some(Ok(Message::Binary(data))) => {
                            if state.is_open() {
                                listeners.dispatch(Payload::Binary(data));
                            } else {
                                debug!(state = %state.current(), "Discarding binary frame received while closing");
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            if let Err(e) = write.send(Message::Pong(data)).await {
                                warn!(error = %e, "Failed to answer ping");
                            }
                        }
                        Some(Ok(Message::Pong(_))) => {
                            debug!("Received pong");
                        }
                        Some(Ok(Message::Close(frame))) => {
                            info!(?frame, "Received close frame");
                            // Pushes out the close reply tungstenite queued while reading
                            if let Err(e) = write.flush().await {
                                debug!(error = %e, "Failed to flush close reply");
                            }
                            state.set_closed(Some("Server closed connection".to_string()));
                            break LoopExit::Remote;
                        }
                        Some(Ok(Message::Frame(_))) => {
                            // Raw frame, not produced when reading
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            state.set_closed(Some(format!("WebSocket error: {}", e)));
                            break LoopExit::Remote;
                        }
                        None => {
                            info!("WebSocket stream ended");
                            state.set_closed(Some("Stream ended".to_string()));
                            break LoopExit::Remote;
                        }
                    }
                }
            }
        };

        if let LoopExit::CloseRequested = exit {
            debug!("Sending close frame");
            if let Err(e) = write.send(Message::Close(None)).await {
                debug!(error = %e, "Failed to send close frame");
            }

            // Frames arriving while closing are discarded, not dispatched.
            let drain = async {
                while let Some(msg) = read.next().await {
                    if msg.is_err() {
                        break;
                    }
                }
            };
            if timeout(CLOSE_DRAIN_TIMEOUT, drain).await.is_err() {
                debug!("Timed out waiting for the server to acknowledge close");
            }

            state.set_closed(Some("Closed by client".to_string()));
            info!(url = %url, "WebSocket connection closed");
        }
    }
}

/// Resolves once a close has been requested or the transport was dropped
async fn wait_for_close(close_rx: &mut watch::Receiver<bool>) {
    loop {
        let requested = *close_rx.borrow_and_update();
        if requested {
            return;
        }
        if close_rx.changed().await.is_err() {
            return;
        }
    }
}
