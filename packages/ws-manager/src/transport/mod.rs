//! Transport module
//!
//! This module provides abstraction over the socket underneath a connection
//! handle through the common `Transport` and `Connector` traits.

pub mod adapter;
pub mod memory;
pub mod tungstenite;
