//! Fixed-interval OHLCV aggregates.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::VenueId;
use super::trade::Trade;

/// Floor a timestamp to the start of its bucket for the given interval.
#[must_use]
pub fn bucket_start(at: DateTime<Utc>, interval_secs: u64) -> DateTime<Utc> {
    let interval_ms = interval_secs as i64 * 1000;
    let ms = at.timestamp_millis();
    let floored = ms.div_euclid(interval_ms) * interval_ms;
    Utc.timestamp_millis_opt(floored).single().unwrap_or(at)
}

/// Mutable OHLCV aggregate keyed by (venue, symbol, bucket start).
///
/// Invariants: `low <= open, close <= high`, `volume >= 0`,
/// `trade_count >= 1` — every candle is seeded from at least one trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub venue: VenueId,
    pub symbol: String,
    pub interval_secs: u64,
    pub start: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub trade_count: u64,
}

impl Candle {
    /// Open a new candle seeded from a trade.
    #[must_use]
    pub fn open_from(trade: &Trade, interval_secs: u64) -> Self {
        Self {
            venue: trade.venue.clone(),
            symbol: trade.symbol.clone(),
            interval_secs,
            start: bucket_start(trade.executed_at, interval_secs),
            open: trade.price,
            high: trade.price,
            low: trade.price,
            close: trade.price,
            volume: trade.size,
            trade_count: 1,
        }
    }

    /// Fold another trade from the same bucket into this candle.
    pub fn apply(&mut self, trade: &Trade) {
        self.high = self.high.max(trade.price);
        self.low = self.low.min(trade.price);
        self.close = trade.price;
        self.volume += trade.size;
        self.trade_count += 1;
    }

    /// Monotonic merge used by the persistence upsert.
    ///
    /// `other` is the newer in-memory aggregate for the same bucket: highs
    /// and lows widen, close/volume/trade_count come from the newer side.
    /// A resumed flush after a crash converges instead of double-counting.
    pub fn merge(&mut self, other: &Candle) {
        self.high = self.high.max(other.high);
        self.low = self.low.min(other.low);
        self.close = other.close;
        self.volume = other.volume;
        self.trade_count = other.trade_count;
    }

    /// Deterministic persistence key.
    #[must_use]
    pub fn id(&self) -> String {
        format!(
            "{}:{}:{}",
            self.venue,
            self.symbol,
            self.start.timestamp_millis()
        )
    }

    /// True when `trade` belongs to this candle's bucket.
    #[must_use]
    pub fn covers(&self, trade: &Trade) -> bool {
        bucket_start(trade.executed_at, self.interval_secs) == self.start
    }
}
