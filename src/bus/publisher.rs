//! Outbound event publication for one venue pipeline.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;

use super::{EventBus, Subjects};
use crate::domain::{Trade, VenueId};

/// Publishes trade and lifecycle events for the ingestion pipelines.
///
/// All publishes are fire-and-forget; a bus outage must never stall
/// ingestion, so nothing here returns a result.
#[derive(Clone)]
pub struct TradePublisher {
    bus: Arc<dyn EventBus>,
    subjects: Arc<Subjects>,
}

impl TradePublisher {
    #[must_use]
    pub fn new(bus: Arc<dyn EventBus>, subjects: Arc<Subjects>) -> Self {
        Self { bus, subjects }
    }

    /// Publish a normalized trade, plus a message event when its notional
    /// meets or exceeds the venue's whale threshold.
    pub fn publish_trade(&self, trade: &Trade, whale_threshold: Decimal) {
        let envelope = json!({
            "event_id": uuid::Uuid::new_v4(),
            "published_at": Utc::now().to_rfc3339(),
            "trade": trade,
        });
        self.bus
            .publish(&self.subjects.trade_executed(&trade.venue), envelope);

        if trade.is_whale(whale_threshold) {
            let summary = format!(
                "{} {} {} {} @ {} ({} notional)",
                trade.venue, trade.side, trade.size, trade.symbol, trade.price, trade.notional
            );
            let message = json!({
                "event_id": uuid::Uuid::new_v4(),
                "published_at": Utc::now().to_rfc3339(),
                "summary": summary,
                "tags": {
                    "symbol": trade.symbol,
                    "side": trade.side,
                    "notional": trade.notional,
                    "trade_id": trade.id,
                },
            });
            self.bus
                .publish(&self.subjects.message_created(&trade.venue), message);
        }
    }

    /// Lifecycle event: a retry has been scheduled.
    pub fn publish_reconnecting(&self, venue: &VenueId, attempt: u32, delay_ms: u64) {
        self.bus.publish(
            &self.subjects.reconnecting(venue),
            json!({
                "module": venue,
                "attempt": attempt,
                "delay": delay_ms,
            }),
        );
    }

    /// Lifecycle event: retries exhausted, venue marked not-running.
    pub fn publish_module_dead(&self, venue: &VenueId, attempts: u32) {
        self.bus.publish(
            &self.subjects.module_dead(venue),
            json!({
                "module": venue,
                "attempts": attempts,
                "at": Utc::now().to_rfc3339(),
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InProcessBus;
    use crate::domain::Side;
    use rust_decimal_macros::dec;

    fn trade(price: Decimal, size: Decimal) -> Trade {
        Trade::new(
            VenueId::new("binance"),
            "BTCUSDT",
            price,
            size,
            Side::Buy,
            Utc::now(),
            "t-1",
        )
    }

    fn publisher(bus: &InProcessBus) -> TradePublisher {
        TradePublisher::new(Arc::new(bus.clone()), Arc::new(Subjects::new("market")))
    }

    #[tokio::test]
    async fn every_trade_is_published() {
        let bus = InProcessBus::new(16);
        let mut rx = bus.subscribe();
        publisher(&bus).publish_trade(&trade(dec!(10), dec!(1)), dec!(1000));

        let message = rx.recv().await.unwrap();
        assert_eq!(message.subject, "market.binance.tradeExecuted");
        assert_eq!(message.payload["trade"]["symbol"], "BTCUSDT");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn whale_trade_also_creates_message() {
        let bus = InProcessBus::new(16);
        let mut rx = bus.subscribe();
        // notional == threshold: inclusive.
        publisher(&bus).publish_trade(&trade(dec!(100), dec!(10)), dec!(1000));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.subject, "market.binance.tradeExecuted");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.subject, "market.binance.messageCreated");
        assert_eq!(second.payload["tags"]["symbol"], "BTCUSDT");
        assert!(second.payload["summary"].as_str().unwrap().contains("BTCUSDT"));
    }

    #[tokio::test]
    async fn below_threshold_publishes_only_the_trade() {
        let bus = InProcessBus::new(16);
        let mut rx = bus.subscribe();
        publisher(&bus).publish_trade(&trade(dec!(100), dec!(10)), dec!(1000.01));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.subject, "market.binance.tradeExecuted");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn lifecycle_events_carry_module_and_attempt() {
        let bus = InProcessBus::new(16);
        let mut rx = bus.subscribe();
        let venue = VenueId::new("binance");
        let publisher = publisher(&bus);

        publisher.publish_reconnecting(&venue, 3, 4000);
        let message = rx.recv().await.unwrap();
        assert_eq!(message.subject, "market.binance.reconnecting");
        assert_eq!(message.payload["attempt"], 3);
        assert_eq!(message.payload["delay"], 4000);

        publisher.publish_module_dead(&venue, 10);
        let message = rx.recv().await.unwrap();
        assert_eq!(message.subject, "market.module.dead.binance");
        assert_eq!(message.payload["attempts"], 10);
    }
}
