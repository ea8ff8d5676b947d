//! Connection module
//!
//! This module owns the single connection handle, the registry that hands it
//! out, and the types describing inbound messages and connection state.

pub mod handle;
pub mod payload;
pub mod registry;
pub mod state;
