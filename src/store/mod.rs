//! Persistence ports for trades and candles.
//!
//! Both stores must be safe for concurrent use by every venue pipeline;
//! implementations are shared via `Arc` and never serialize one venue's
//! writes behind another's.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::domain::{Candle, Trade, TradeId};
use crate::error::Result;

pub use memory::MemoryStore;
pub use sqlite::SqliteMarketStore;

/// Storage operations for trades.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Idempotent insert: a trade whose id already exists is a no-op, not
    /// an error. Returns `true` when a new row was written.
    async fn insert_trade(&self, trade: &Trade, is_whale: bool) -> Result<bool>;

    /// Fetch a trade by id.
    async fn get_trade(&self, id: &TradeId) -> Result<Option<Trade>>;
}

/// Storage operations for candles.
#[async_trait]
pub trait CandleStore: Send + Sync {
    /// Monotonic-merge upsert keyed by the candle id: highs widen, lows
    /// widen, close/volume/trade_count come from the newer aggregate, so a
    /// re-flush after a crash converges instead of double-counting.
    async fn upsert_candle(&self, candle: &Candle) -> Result<()>;

    /// Fetch a candle by its deterministic id.
    async fn get_candle(&self, id: &str) -> Result<Option<Candle>>;
}

/// Convenience bound for a combined market store.
pub trait MarketStore: TradeStore + CandleStore {}

impl<T: TradeStore + CandleStore> MarketStore for T {}
