//! In-process bus implementations.

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use super::{BusMessage, EventBus};

/// Broadcast-channel bus for in-process consumers (control plane, tests).
///
/// Publishing when no subscriber is listening, or when a subscriber has
/// lagged past the channel capacity, silently drops the message: the bus is
/// best-effort by contract.
#[derive(Debug, Clone)]
pub struct InProcessBus {
    tx: broadcast::Sender<BusMessage>,
}

impl InProcessBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to every message published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.tx.subscribe()
    }
}

impl Default for InProcessBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus for InProcessBus {
    fn publish(&self, subject: &str, payload: Value) {
        // A send error only means no receiver is currently subscribed.
        let _ = self.tx.send(BusMessage {
            subject: subject.to_string(),
            payload,
        });
    }
}

/// A bus that discards everything. For tests and detached tooling.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBus;

impl EventBus for NullBus {
    fn publish(&self, _subject: &str, _payload: Value) {}
}

/// A bus that logs each publish at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBus;

impl EventBus for LogBus {
    fn publish(&self, subject: &str, payload: Value) {
        debug!(subject, %payload, "bus publish");
    }
}
