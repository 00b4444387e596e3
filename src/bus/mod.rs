//! Fire-and-forget event bus.
//!
//! Publication carries no delivery acknowledgment and never blocks or
//! retries: ingestion is the source of truth and the bus is best-effort
//! telemetry. Subjects are hierarchical, dot-separated names under a
//! configurable root.

pub mod control;
pub mod memory;
pub mod publisher;

use serde_json::Value;

use crate::domain::VenueId;

pub use control::ControlCommand;
pub use memory::{InProcessBus, LogBus, NullBus};
pub use publisher::TradePublisher;

/// A published message: subject plus JSON payload.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub subject: String,
    pub payload: Value,
}

/// Subject names for one deployment, rooted at a configurable segment.
#[derive(Debug, Clone)]
pub struct Subjects {
    root: String,
}

impl Subjects {
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Every normalized trade.
    #[must_use]
    pub fn trade_executed(&self, venue: &VenueId) -> String {
        format!("{}.{}.tradeExecuted", self.root, venue)
    }

    /// Whale-threshold-crossing trades.
    #[must_use]
    pub fn message_created(&self, venue: &VenueId) -> String {
        format!("{}.{}.messageCreated", self.root, venue)
    }

    /// Emitted by the reconnect scheduler on each retry.
    #[must_use]
    pub fn reconnecting(&self, venue: &VenueId) -> String {
        format!("{}.{}.reconnecting", self.root, venue)
    }

    /// Emitted once when retries are exhausted and the venue is marked
    /// not-running.
    #[must_use]
    pub fn module_dead(&self, venue: &VenueId) -> String {
        format!("{}.module.dead.{}", self.root, venue)
    }

    /// Inbound operator command: force an immediate reconnect.
    #[must_use]
    pub fn control_reconnect(&self, venue: &VenueId) -> String {
        format!("{}.control.reconnect.{}", self.root, venue)
    }

    /// Inbound operator command: administratively disable a venue.
    #[must_use]
    pub fn control_disable(&self, venue: &VenueId) -> String {
        format!("{}.control.disable.{}", self.root, venue)
    }

    /// Inbound operator command: re-enable a venue.
    #[must_use]
    pub fn control_enable(&self, venue: &VenueId) -> String {
        format!("{}.control.enable.{}", self.root, venue)
    }
}

/// Publish-side of the bus. Implementations must be safe for concurrent
/// use by every pipeline and must never block the caller.
pub trait EventBus: Send + Sync {
    /// Publish a payload on a subject. Failures are swallowed by the
    /// implementation; the signature is deliberately infallible.
    fn publish(&self, subject: &str, payload: Value);
}
