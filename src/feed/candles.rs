//! Trade-to-candle accumulation for one venue.

use std::collections::HashMap;

use crate::domain::{Candle, Trade};

/// Accumulates trades into fixed-width buckets per symbol.
///
/// A bucket is flushed when a trade for the same symbol lands in a later
/// bucket; everything still open is flushed on pipeline shutdown.
#[derive(Debug)]
pub struct CandleAggregator {
    interval_secs: u64,
    open: HashMap<String, Candle>,
}

impl CandleAggregator {
    #[must_use]
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval_secs,
            open: HashMap::new(),
        }
    }

    /// Fold a trade in. Returns the previously open candle when this trade
    /// crossed its bucket boundary.
    pub fn on_trade(&mut self, trade: &Trade) -> Option<Candle> {
        match self.open.get_mut(&trade.symbol) {
            Some(candle) if candle.covers(trade) => {
                candle.apply(trade);
                None
            }
            Some(_) => {
                let flushed = self
                    .open
                    .insert(trade.symbol.clone(), Candle::open_from(trade, self.interval_secs));
                flushed
            }
            None => {
                self.open
                    .insert(trade.symbol.clone(), Candle::open_from(trade, self.interval_secs));
                None
            }
        }
    }

    /// Drain every open candle, regardless of boundary.
    pub fn flush_all(&mut self) -> Vec<Candle> {
        let mut candles: Vec<Candle> = self.open.drain().map(|(_, candle)| candle).collect();
        candles.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.start.cmp(&b.start)));
        candles
    }

    /// Number of currently open candles.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}
