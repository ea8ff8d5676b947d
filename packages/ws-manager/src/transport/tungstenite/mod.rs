//! tokio-tungstenite transport
//!
//! WebSocket client transport for connecting to real endpoints.

pub mod adapter;
