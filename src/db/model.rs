//! Database model types for Diesel ORM.
//!
//! Decimal columns are stored as text to avoid float drift in money values.

use diesel::prelude::*;

use super::schema::{candles, trades};

/// Database row for a trade.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = trades)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TradeRow {
    pub id: String,
    pub venue: String,
    pub symbol: String,
    pub price: String,
    pub size: String,
    pub side: String,
    pub notional: String,
    pub is_whale: i32,
    pub executed_at: String,
    pub created_at: String,
}

/// Database row for a candle.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = candles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CandleRow {
    pub id: String,
    pub venue: String,
    pub symbol: String,
    pub interval_secs: i32,
    pub start_time: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
    pub trade_count: i32,
}
