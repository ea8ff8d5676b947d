//! Connection Ready State
//!
//! Tracks where a transport connection is in its lifecycle, mirroring the
//! ready states a browser socket exposes.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

/// Maximum number of transitions kept in the history
const MAX_TRANSITIONS: usize = 100;

/// Lifecycle states of a transport connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Handshake in progress
    Connecting,
    /// Handshake finished, messages are being delivered
    Open,
    /// Close requested, waiting for the socket to shut down
    Closing,
    /// Connection is gone; terminal
    Closed,
}

impl std::fmt::Display for ReadyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadyState::Connecting => write!(f, "Connecting"),
            ReadyState::Open => write!(f, "Open"),
            ReadyState::Closing => write!(f, "Closing"),
            ReadyState::Closed => write!(f, "Closed"),
        }
    }
}

/// State transition information
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: ReadyState,
    pub to: ReadyState,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

struct ReadyStateInner {
    current: ReadyState,
    opened_at: Option<DateTime<Utc>>,
    transitions: Vec<StateTransition>,
}

/// Thread-safe ready state shared between a transport and its reader task
#[derive(Clone)]
pub struct ReadyStateTracker {
    inner: Arc<RwLock<ReadyStateInner>>,
}

impl ReadyStateTracker {
    /// Create a tracker starting in Connecting state
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ReadyStateInner {
                current: ReadyState::Connecting,
                opened_at: None,
                transitions: Vec::new(),
            })),
        }
    }

    /// Get the current state
    pub fn current(&self) -> ReadyState {
        self.inner.read().current
    }

    /// When the handshake finished, if it ever did
    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().opened_at
    }

    /// Transition to a new state. Returns false if the transition is not allowed.
    pub fn transition_to(&self, new_state: ReadyState, reason: Option<String>) -> bool {
        let mut inner = self.inner.write();

        if inner.current == new_state {
            return true;
        }

        if !is_valid_transition(inner.current, new_state) {
            tracing::debug!(
                from = %inner.current,
                to = %new_state,
                "Rejected ready state transition"
            );
            return false;
        }

        let old_state = inner.current;
        inner.current = new_state;

        if new_state == ReadyState::Open {
            inner.opened_at = Some(Utc::now());
        }

        inner.transitions.push(StateTransition {
            from: old_state,
            to: new_state,
            timestamp: Utc::now(),
            reason,
        });

        if inner.transitions.len() > MAX_TRANSITIONS {
            inner.transitions.remove(0);
        }

        tracing::info!(from = %old_state, to = %new_state, "Ready state transition");

        true
    }

    pub fn set_open(&self) -> bool {
        self.transition_to(ReadyState::Open, Some("Handshake complete".to_string()))
    }

    pub fn set_closing(&self, reason: Option<String>) -> bool {
        self.transition_to(ReadyState::Closing, reason)
    }

    pub fn set_closed(&self, reason: Option<String>) -> bool {
        self.transition_to(ReadyState::Closed, reason)
    }

    /// Why the connection never opened, once it has given up.
    ///
    /// `None` while still connecting, and for connections that were open at
    /// some point before closing.
    pub fn connect_failure(&self) -> Option<String> {
        let inner = self.inner.read();
        if inner.current != ReadyState::Closed || inner.opened_at.is_some() {
            return None;
        }
        let reason = inner
            .transitions
            .last()
            .and_then(|t| t.reason.clone())
            .unwrap_or_else(|| "connection closed before opening".to_string());
        Some(reason)
    }

    /// Most recent transitions, newest first
    pub fn recent_transitions(&self, count: usize) -> Vec<StateTransition> {
        let inner = self.inner.read();
        inner.transitions.iter().rev().take(count).cloned().collect()
    }

    pub fn is_open(&self) -> bool {
        self.current() == ReadyState::Open
    }

    /// Closing or already closed
    pub fn is_shutting_down(&self) -> bool {
        matches!(self.current(), ReadyState::Closing | ReadyState::Closed)
    }
}

impl Default for ReadyStateTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn is_valid_transition(from: ReadyState, to: ReadyState) -> bool {
    matches!(
        (from, to),
        (ReadyState::Connecting, ReadyState::Open) |
        (ReadyState::Connecting, ReadyState::Closing) |
        (ReadyState::Connecting, ReadyState::Closed) |
        (ReadyState::Open, ReadyState::Closing) |
        (ReadyState::Open, ReadyState::Closed) |
        (ReadyState::Closing, ReadyState::Closed)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let tracker = ReadyStateTracker::new();
        assert_eq!(tracker.current(), ReadyState::Connecting);
        assert!(tracker.opened_at().is_none());
    }

    #[test]
    fn test_lifecycle() {
        let tracker = ReadyStateTracker::new();

        assert!(tracker.set_open());
        assert!(tracker.is_open());
        assert!(tracker.opened_at().is_some());

        assert!(tracker.set_closing(None));
        assert!(tracker.is_shutting_down());

        assert!(tracker.set_closed(Some("done".to_string())));
        assert_eq!(tracker.current(), ReadyState::Closed);

        let history = tracker.recent_transitions(10);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].to, ReadyState::Closed);
        assert_eq!(history[0].reason.as_deref(), Some("done"));
    }

    #[test]
    fn test_closed_is_terminal() {
        let tracker = ReadyStateTracker::new();
        tracker.set_closed(None);

        assert!(!tracker.set_open());
        assert!(!tracker.transition_to(ReadyState::Connecting, None));
        assert_eq!(tracker.current(), ReadyState::Closed);
    }

    #[test]
    fn test_connect_failure_only_for_never_opened() {
        let failed = ReadyStateTracker::new();
        assert!(failed.connect_failure().is_none());
        failed.set_closed(Some("connection refused".to_string()));
        assert_eq!(failed.connect_failure().as_deref(), Some("connection refused"));

        let opened = ReadyStateTracker::new();
        opened.set_open();
        opened.set_closed(Some("Stream ended".to_string()));
        assert!(opened.connect_failure().is_none());
    }

    #[test]
    fn test_self_transition_is_not_recorded() {
        let tracker = ReadyStateTracker::new();
        assert!(tracker.transition_to(ReadyState::Connecting, None));
        assert!(tracker.recent_transitions(10).is_empty());
    }

    #[test]
    fn test_history_is_bounded() {
        let tracker = ReadyStateTracker::new();
        {
            let mut inner = tracker.inner.write();
            for _ in 0..MAX_TRANSITIONS {
                inner.transitions.push(StateTransition {
                    from: ReadyState::Connecting,
                    to: ReadyState::Connecting,
                    timestamp: Utc::now(),
                    reason: None,
                });
            }
        }

        tracker.set_open();
        let history = tracker.recent_transitions(usize::MAX);
        assert_eq!(history.len(), MAX_TRANSITIONS);
        assert_eq!(history[0].to, ReadyState::Open);
    }
}
