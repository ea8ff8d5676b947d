//! In-memory Transport
//!
//! A transport with no socket behind it. Inbound messages are injected with
//! [`MemoryTransport::deliver`] and close requests are counted, which makes
//! it the transport of choice for exercising code built on a
//! [`ConnectionHandle`](crate::ConnectionHandle).

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::connection::payload::Payload;
use crate::connection::state::ReadyStateTracker;
use crate::error::ConnectionError;
use crate::transport::adapter::{Connector, Listener, Listeners, Transport};

struct MemoryInner {
    url: String,
    listeners: Listeners,
    state: ReadyStateTracker,
    close_requests: AtomicUsize,
}

/// Transport whose traffic is simulated in-process
#[derive(Clone)]
pub struct MemoryTransport {
    inner: Arc<MemoryInner>,
}

impl MemoryTransport {
    /// Create a transport that is already open
    pub fn new(url: &str) -> Self {
        let state = ReadyStateTracker::new();
        state.set_open();

        Self {
            inner: Arc::new(MemoryInner {
                url: url.to_string(),
                listeners: Listeners::new(),
                state,
                close_requests: AtomicUsize::new(0),
            }),
        }
    }

    /// URL this transport was opened with
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Simulate an inbound message. Returns false if the transport is not open.
    pub fn deliver(&self, payload: impl Into<Payload>) -> bool {
        if !self.inner.state.is_open() {
            debug!(url = %self.inner.url, "Dropping message delivered to a closed transport");
            return false;
        }
        self.inner.listeners.dispatch(payload.into());
        true
    }

    /// Number of times `close` has been called
    pub fn close_requests(&self) -> usize {
        self.inner.close_requests.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

impl Transport for MemoryTransport {
    fn add_listener(&self, listener: Listener) {
        self.inner.listeners.push(listener);
    }

    fn close(&self) {
        self.inner.close_requests.fetch_add(1, Ordering::SeqCst);
        self.inner.state.set_closing(Some("Close requested".to_string()));
        self.inner.state.set_closed(None);
    }

    fn state(&self) -> &ReadyStateTracker {
        &self.inner.state
    }
}

/// Connector handing out [`MemoryTransport`]s and remembering each one
#[derive(Clone, Default)]
pub struct MemoryConnector {
    opened: Arc<Mutex<Vec<MemoryTransport>>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs passed to `open`, in call order
    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.lock().iter().map(|t| t.url().to_string()).collect()
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    /// The most recently opened transport
    pub fn last_opened(&self) -> Option<MemoryTransport> {
        self.opened.lock().last().cloned()
    }
}

impl Connector for MemoryConnector {
    type Transport = MemoryTransport;

    fn open(&self, url: &str) -> Result<MemoryTransport, ConnectionError> {
        let transport = MemoryTransport::new(url);
        self.opened.lock().push(transport.clone());
        Ok(transport)
    }
}
