//! Canonical trade record, independent of venue wire format.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{TradeId, VenueId};

/// Trade side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Lowercase wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized trade: immutable fact, written once.
///
/// `notional` is always `price * size`; `id` is deterministic over
/// (venue, symbol, venue-native id) so repeated deliveries are idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub venue: VenueId,
    pub symbol: String,
    pub price: Decimal,
    pub size: Decimal,
    pub side: Side,
    pub notional: Decimal,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    /// Build a trade, deriving the id and computing the notional.
    #[must_use]
    pub fn new(
        venue: VenueId,
        symbol: impl Into<String>,
        price: Decimal,
        size: Decimal,
        side: Side,
        executed_at: DateTime<Utc>,
        native_id: &str,
    ) -> Self {
        let symbol = symbol.into();
        let id = TradeId::derive(&venue, &symbol, native_id);
        Self {
            id,
            venue,
            symbol,
            price,
            size,
            side,
            notional: price * size,
            executed_at,
        }
    }

    /// True when this trade's notional meets or exceeds `threshold`.
    #[must_use]
    pub fn is_whale(&self, threshold: Decimal) -> bool {
        self.notional >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn notional_is_price_times_size() {
        let t = trade(dec!(50000), dec!(0.5));
        assert_eq!(t.notional, dec!(25000));
    }

    #[test]
    fn whale_threshold_is_inclusive() {
        let t = trade(dec!(100), dec!(10));
        assert!(t.is_whale(dec!(1000)));
        assert!(t.is_whale(dec!(999.99)));
        assert!(!t.is_whale(dec!(1000.01)));
    }

    #[test]
    fn same_native_id_yields_same_trade_id() {
        let a = trade(dec!(1), dec!(1));
        let b = trade(dec!(2), dec!(2));
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"buy\"");
        assert_eq!(Side::Sell.as_str(), "sell");
    }
}
