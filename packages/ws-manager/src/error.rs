//! Error types for opening and driving a connection.

use std::time::Duration;
use thiserror::Error;

/// Errors produced while opening or running a transport connection.
///
/// Only [`ConnectionError::NoRuntime`] is returned to callers. Handshake
/// failures happen on the background reader task and are logged there.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The connector was called outside of a tokio runtime
    #[error("no tokio runtime available to drive the connection")]
    NoRuntime,

    /// The WebSocket handshake was rejected or the socket could not be reached
    #[error("WebSocket handshake failed: {0}")]
    Handshake(#[from] tokio_tungstenite::tungstenite::Error),

    /// The handshake did not finish within the configured connect timeout
    #[error("WebSocket handshake timed out after {0:?}")]
    Timeout(Duration),
}
