//! In-memory store implementation for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{CandleStore, TradeStore};
use crate::domain::{Candle, Trade, TradeId, VenueId};
use crate::error::Result;

/// In-memory store for testing purposes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    trades: RwLock<HashMap<TradeId, Trade>>,
    candles: RwLock<HashMap<String, Candle>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored trades.
    #[must_use]
    pub fn trade_count(&self) -> usize {
        self.trades.read().len()
    }

    /// Trades for one venue, sorted by execution time.
    #[must_use]
    pub fn trades_for(&self, venue: &VenueId) -> Vec<Trade> {
        let mut trades: Vec<Trade> = self
            .trades
            .read()
            .values()
            .filter(|t| &t.venue == venue)
            .cloned()
            .collect();
        trades.sort_by_key(|t| t.executed_at);
        trades
    }

    /// All stored candles, sorted by bucket start.
    #[must_use]
    pub fn all_candles(&self) -> Vec<Candle> {
        let mut candles: Vec<Candle> = self.candles.read().values().cloned().collect();
        candles.sort_by_key(|c| c.start);
        candles
    }
}

#[async_trait]
impl TradeStore for MemoryStore {
    async fn insert_trade(&self, trade: &Trade, _is_whale: bool) -> Result<bool> {
        let mut trades = self.trades.write();
        if trades.contains_key(&trade.id) {
            return Ok(false);
        }
        trades.insert(trade.id.clone(), trade.clone());
        Ok(true)
    }

    async fn get_trade(&self, id: &TradeId) -> Result<Option<Trade>> {
        Ok(self.trades.read().get(id).cloned())
    }
}

#[async_trait]
impl CandleStore for MemoryStore {
    async fn upsert_candle(&self, candle: &Candle) -> Result<()> {
        let mut candles = self.candles.write();
        match candles.get_mut(&candle.id()) {
            Some(existing) => existing.merge(candle),
            None => {
                candles.insert(candle.id(), candle.clone());
            }
        }
        Ok(())
    }

    async fn get_candle(&self, id: &str) -> Result<Option<Candle>> {
        Ok(self.candles.read().get(id).cloned())
    }
}
