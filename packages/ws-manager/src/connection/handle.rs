//! Connection Handle
//!
//! Wraps one live transport connection. A handle is opened by a
//! [`ConnectionRegistry`](super::registry::ConnectionRegistry) and shared by
//! reference from then on.

use std::sync::Arc;
use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::connection::payload::Payload;
use crate::connection::state::ReadyState;
use crate::error::ConnectionError;
use crate::transport::adapter::{Connector, Transport};

/// The object wrapping the live transport session
pub struct ConnectionHandle<T: Transport> {
    id: Uuid,
    url: String,
    transport: T,
}

impl<T: Transport> ConnectionHandle<T> {
    /// Open a transport to `url` and wrap it
    pub(crate) fn open<C>(connector: &C, url: &str) -> Result<Self, ConnectionError>
    where
        C: Connector<Transport = T>,
    {
        let id = Uuid::new_v4();
        let span = info_span!("connection", connection_id = %id);

        let transport = span.in_scope(|| {
            info!(url = %url, "Opening connection");
            connector.open(url)
        })?;

        Ok(Self {
            id,
            url: url.to_string(),
            transport,
        })
    }

    /// Endpoint this handle was opened with
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn ready_state(&self) -> ReadyState {
        self.transport.ready_state()
    }

    /// Reason the connection gave up before ever opening, if it did
    pub fn connect_failure(&self) -> Option<String> {
        self.transport.state().connect_failure()
    }

    /// Register a callback for every inbound message.
    ///
    /// Callbacks accumulate: each registration adds a listener and every
    /// listener sees every later message, in registration order. Messages
    /// received before registration are not replayed.
    pub fn on_message<F>(&self, callback: F)
    where
        F: Fn(Payload) + Send + Sync + 'static,
    {
        self.transport.add_listener(Arc::new(callback));
        debug!(connection_id = %self.id, "Message listener registered");
    }

    /// Request termination of the underlying connection
    pub fn close(&self) {
        info!(connection_id = %self.id, url = %self.url, "Closing connection");
        self.transport.close();
    }
}

impl<T: Transport> std::fmt::Debug for ConnectionHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("ready_state", &self.ready_state())
            .finish()
    }
}
