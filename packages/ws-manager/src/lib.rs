//! ws-manager
//!
//! A single WebSocket connection per process: open it once through a
//! [`ConnectionRegistry`], register message listeners on the returned
//! [`ConnectionHandle`], and close it when done.

pub mod cli;
pub mod connection;
pub mod error;
pub mod transport;

// Re-exports for convenience
pub use cli::config::Config;
pub use connection::handle::ConnectionHandle;
pub use connection::payload::Payload;
pub use connection::registry::ConnectionRegistry;
pub use connection::state::{ReadyState, ReadyStateTracker};
pub use error::ConnectionError;
pub use transport::adapter::{Connector, Listener, Transport};
pub use transport::memory::{MemoryConnector, MemoryTransport};
pub use transport::tungstenite::adapter::{TungsteniteConnector, TungsteniteTransport};
