//! Connection Registry
//!
//! Process-scoped owner of the single [`ConnectionHandle`]. Create one
//! registry at startup and pass it by reference to everything that needs the
//! connection.
//!
//! There is no way to reset the registry: once a handle is closed, later
//! calls keep returning that closed handle.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::connection::handle::ConnectionHandle;
use crate::error::ConnectionError;
use crate::transport::adapter::Connector;

/// Hands out at most one connection handle for its whole lifetime
pub struct ConnectionRegistry<C: Connector> {
    connector: C,
    handle: Mutex<Option<Arc<ConnectionHandle<C::Transport>>>>,
}

impl<C: Connector> ConnectionRegistry<C> {
    /// Create an empty registry. No connection is opened until the first
    /// call to [`get_or_create`](Self::get_or_create).
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            handle: Mutex::new(None),
        }
    }

    /// Return the registry's handle, opening it to `url` on first use.
    ///
    /// Once a handle exists, `url` is ignored and the existing handle is
    /// returned, even if it was opened to a different endpoint. An error is
    /// only possible on first use; nothing is stored in that case.
    pub fn get_or_create(
        &self,
        url: &str,
    ) -> Result<Arc<ConnectionHandle<C::Transport>>, ConnectionError> {
        let mut slot = self.handle.lock();

        if let Some(handle) = slot.as_ref() {
            if handle.url() != url {
                warn!(
                    connection_id = %handle.id(),
                    existing_url = %handle.url(),
                    requested_url = %url,
                    "Connection already exists; ignoring requested URL"
                );
            } else {
                debug!(connection_id = %handle.id(), "Reusing existing connection");
            }
            return Ok(Arc::clone(handle));
        }

        let handle = Arc::new(ConnectionHandle::open(&self.connector, url)?);
        *slot = Some(Arc::clone(&handle));
        Ok(handle)
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::state::ReadyState;
    use crate::transport::memory::{MemoryConnector, MemoryTransport};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_every_call_returns_same_instance() {
        let registry = ConnectionRegistry::new(MemoryConnector::new());

        let first = registry.get_or_create("wss://a").unwrap();
        for _ in 0..5 {
            let again = registry.get_or_create("wss://a").unwrap();
            assert!(Arc::ptr_eq(&first, &again));
        }
        assert_eq!(registry.connector().open_count(), 1);
    }

    #[test]
    fn test_later_url_is_ignored() {
        let registry = ConnectionRegistry::new(MemoryConnector::new());

        let a = registry.get_or_create("wss://a").unwrap();
        let b = registry.get_or_create("wss://b").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.url(), "wss://a");
        assert_eq!(registry.connector().opened_urls(), vec!["wss://a"]);
    }

    #[test]
    fn test_racing_first_callers_share_one_handle() {
        let registry = Arc::new(ConnectionRegistry::new(MemoryConnector::new()));

        let threads: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    registry
                        .get_or_create(&format!("wss://host-{}", i))
                        .unwrap()
                })
            })
            .collect();

        let handles: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();

        assert_eq!(registry.connector().open_count(), 1);
        for handle in &handles[1..] {
            assert!(Arc::ptr_eq(&handles[0], handle));
        }
    }

    #[test]
    fn test_closed_handle_is_not_replaced() {
        let registry = ConnectionRegistry::new(MemoryConnector::new());

        let handle = registry.get_or_create("wss://a").unwrap();
        handle.close();

        let again = registry.get_or_create("wss://a").unwrap();
        assert!(Arc::ptr_eq(&handle, &again));
        assert_eq!(again.ready_state(), ReadyState::Closed);
        assert_eq!(registry.connector().open_count(), 1);
    }

    /// Connector that fails the first open and succeeds afterwards
    struct FlakyConnector {
        attempts: AtomicUsize,
        inner: MemoryConnector,
    }

    impl Connector for FlakyConnector {
        type Transport = MemoryTransport;

        fn open(&self, url: &str) -> Result<Self::Transport, ConnectionError> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(ConnectionError::NoRuntime);
            }
            self.inner.open(url)
        }
    }

    #[test]
    fn test_failed_open_is_not_stored() {
        let registry = ConnectionRegistry::new(FlakyConnector {
            attempts: AtomicUsize::new(0),
            inner: MemoryConnector::new(),
        });

        assert!(matches!(
            registry.get_or_create("wss://a"),
            Err(ConnectionError::NoRuntime)
        ));
        assert_eq!(registry.connector().inner.open_count(), 0);

        let handle = registry.get_or_create("wss://b").unwrap();
        assert_eq!(handle.url(), "wss://b");
        assert_eq!(registry.connector().inner.open_count(), 1);
    }
}
