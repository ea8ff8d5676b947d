//! Payload summaries for the `watch` command
//!
//! The connection handle never looks inside a payload. The command line tool
//! does, only to print something readable: balance updates pushed by the
//! feed server are summarised, everything else is shown as received.

use serde::Deserialize;

use crate::connection::payload::Payload;

/// Balance update pushed by the feed server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BalanceUpdate {
    pub balance: i64,
    pub just_earned: i64,
}

impl BalanceUpdate {
    pub fn from_payload(payload: &Payload) -> Option<Self> {
        payload
            .as_text()
            .and_then(|text| serde_json::from_str(text).ok())
    }
}

/// One-line, human readable description of a payload
pub fn describe(payload: &Payload) -> String {
    if payload.is_empty() {
        return "<empty>".to_string();
    }

    if let Some(update) = BalanceUpdate::from_payload(payload) {
        return format!("balance {} (+{})", update.balance, update.just_earned);
    }

    match payload {
        Payload::Text(text) => text.clone(),
        Payload::Binary(data) => format!("<{} bytes>", data.len()),
    }
}
