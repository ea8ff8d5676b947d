//! Transport Adapter Traits
//!
//! Defines the interface a connection handle uses to talk to the socket
//! underneath it, and the listener list every transport shares.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::connection::payload::Payload;
use crate::connection::state::{ReadyState, ReadyStateTracker};
use crate::error::ConnectionError;

/// Callback invoked with every inbound payload
pub type Listener = Arc<dyn Fn(Payload) + Send + Sync>;

/// An open (or opening) transport connection
pub trait Transport: Send + Sync + 'static {
    /// Subscribe to inbound messages. Listeners accumulate; none are replaced.
    fn add_listener(&self, listener: Listener);

    /// Request termination of the connection
    fn close(&self);

    /// Lifecycle tracker shared with whatever drives the connection
    fn state(&self) -> &ReadyStateTracker;

    /// Current lifecycle state
    fn ready_state(&self) -> ReadyState {
        self.state().current()
    }
}

/// Opens transports to a URL
pub trait Connector: Send + Sync {
    type Transport: Transport;

    /// Start opening a connection. Returns as soon as the transport exists;
    /// the handshake itself may still be in progress.
    fn open(&self, url: &str) -> Result<Self::Transport, ConnectionError>;
}

/// Ordered, shared list of listeners
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Arc<RwLock<Vec<Listener>>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, listener: Listener) {
        self.inner.write().push(listener);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Call every listener with the payload, in registration order.
    ///
    /// The lock is released before any listener runs, so a listener may
    /// register further listeners. Those only see later payloads.
    pub fn dispatch(&self, payload: Payload) {
        let snapshot: Vec<Listener> = self.inner.read().clone();

        if let Some((last, rest)) = snapshot.split_last() {
            for listener in rest {
                listener(payload.clone());
            }
            last(payload);
        }
    }
}
