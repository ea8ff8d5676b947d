//! Command line support: configuration loading and payload display.

pub mod config;
pub mod feed;
