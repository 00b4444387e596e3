//! SQLite store implementation using Diesel.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use super::{CandleStore, TradeStore};
use crate::db::model::{CandleRow, TradeRow};
use crate::db::schema::{candles, trades};
use crate::db::DbPool;
use crate::domain::{Candle, Side, Trade, TradeId, VenueId};
use crate::error::{Error, Result};

/// SQLite-backed trade and candle store.
pub struct SqliteMarketStore {
    pool: DbPool,
}

impl SqliteMarketStore {
    /// Create a new SQLite market store.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<SqliteConnection>>> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }

    fn trade_to_row(trade: &Trade, is_whale: bool) -> TradeRow {
        TradeRow {
            id: trade.id.to_string(),
            venue: trade.venue.to_string(),
            symbol: trade.symbol.clone(),
            price: trade.price.to_string(),
            size: trade.size.to_string(),
            side: trade.side.as_str().to_string(),
            notional: trade.notional.to_string(),
            is_whale: i32::from(is_whale),
            executed_at: trade.executed_at.to_rfc3339(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    fn trade_from_row(row: TradeRow) -> Result<Trade> {
        let side = match row.side.as_str() {
            "buy" => Side::Buy,
            "sell" => Side::Sell,
            other => return Err(Error::Database(format!("corrupt side '{other}'"))),
        };
        Ok(Trade {
            id: TradeId::from(row.id),
            venue: VenueId::new(row.venue),
            symbol: row.symbol,
            price: parse_decimal(&row.price)?,
            size: parse_decimal(&row.size)?,
            side,
            notional: parse_decimal(&row.notional)?,
            executed_at: parse_instant(&row.executed_at)?,
        })
    }

    fn candle_to_row(candle: &Candle) -> CandleRow {
        CandleRow {
            id: candle.id(),
            venue: candle.venue.to_string(),
            symbol: candle.symbol.clone(),
            interval_secs: candle.interval_secs as i32,
            start_time: candle.start.to_rfc3339(),
            open: candle.open.to_string(),
            high: candle.high.to_string(),
            low: candle.low.to_string(),
            close: candle.close.to_string(),
            volume: candle.volume.to_string(),
            trade_count: candle.trade_count as i32,
        }
    }

    fn candle_from_row(row: CandleRow) -> Result<Candle> {
        Ok(Candle {
            venue: VenueId::new(row.venue),
            symbol: row.symbol,
            interval_secs: row.interval_secs.max(0) as u64,
            start: parse_instant(&row.start_time)?,
            open: parse_decimal(&row.open)?,
            high: parse_decimal(&row.high)?,
            low: parse_decimal(&row.low)?,
            close: parse_decimal(&row.close)?,
            volume: parse_decimal(&row.volume)?,
            trade_count: row.trade_count.max(0) as u64,
        })
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| Error::Database(format!("corrupt decimal '{raw}': {e}")))
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("corrupt timestamp '{raw}': {e}")))
}

#[async_trait]
impl TradeStore for SqliteMarketStore {
    async fn insert_trade(&self, trade: &Trade, is_whale: bool) -> Result<bool> {
        let row = Self::trade_to_row(trade, is_whale);
        let mut conn = self.conn()?;

        let inserted = diesel::insert_or_ignore_into(trades::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(inserted > 0)
    }

    async fn get_trade(&self, id: &TradeId) -> Result<Option<Trade>> {
        let mut conn = self.conn()?;

        let row: Option<TradeRow> = trades::table
            .find(id.to_string())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(Self::trade_from_row).transpose()
    }
}

#[async_trait]
impl CandleStore for SqliteMarketStore {
    async fn upsert_candle(&self, candle: &Candle) -> Result<()> {
        let mut conn = self.conn()?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let existing: Option<CandleRow> = candles::table
                .find(candle.id())
                .first(conn)
                .optional()?;

            let row = match existing {
                Some(row) => {
                    // Merge in Rust so highs/lows stay monotonic.
                    let mut merged = match Self::candle_from_row(row) {
                        Ok(candle) => candle,
                        Err(_) => return Err(diesel::result::Error::RollbackTransaction),
                    };
                    merged.merge(candle);
                    Self::candle_to_row(&merged)
                }
                None => Self::candle_to_row(candle),
            };

            diesel::replace_into(candles::table)
                .values(&row)
                .execute(conn)?;
            Ok(())
        })
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn get_candle(&self, id: &str) -> Result<Option<Candle>> {
        let mut conn = self.conn()?;

        let row: Option<CandleRow> = candles::table
            .find(id)
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(Self::candle_from_row).transpose()
    }
}
