//! Pure normalization of venue-native trade records.

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use super::adapter::{RawTrade, RawTimestamp};
use crate::domain::{Side, Trade, VenueId};
use crate::error::ParseError;

/// Convert a raw venue record into a canonical trade.
///
/// Total over well-formed input; malformed input is rejected with a typed
/// [`ParseError`] so the caller can drop the single record without
/// affecting the connection.
pub fn normalize(raw: RawTrade, venue: &VenueId) -> Result<Trade, ParseError> {
    if raw.symbol.trim().is_empty() {
        return Err(ParseError::MissingField { field: "symbol" });
    }
    if raw.native_id.trim().is_empty() {
        return Err(ParseError::MissingField { field: "trade_id" });
    }

    let price = Decimal::from_str(raw.price.trim()).map_err(|_| ParseError::Price {
        value: raw.price.clone(),
    })?;
    if price <= Decimal::ZERO {
        return Err(ParseError::Price { value: raw.price });
    }

    let signed_size = Decimal::from_str(raw.size.trim()).map_err(|_| ParseError::Size {
        value: raw.size.clone(),
    })?;

    let side = match &raw.side {
        Some(word) => parse_side(word)?,
        // AMM-style venues encode the side in the sign of the amount.
        None => {
            if signed_size > Decimal::ZERO {
                Side::Buy
            } else if signed_size < Decimal::ZERO {
                Side::Sell
            } else {
                return Err(ParseError::Size { value: raw.size });
            }
        }
    };

    let size = signed_size.abs();
    if size == Decimal::ZERO {
        return Err(ParseError::Size { value: raw.size });
    }

    let executed_at = parse_timestamp(&raw.timestamp)?;

    Ok(Trade::new(
        venue.clone(),
        raw.symbol,
        price,
        size,
        side,
        executed_at,
        &raw.native_id,
    ))
}

fn parse_side(word: &str) -> Result<Side, ParseError> {
    match word.to_ascii_lowercase().as_str() {
        "buy" | "b" | "bid" => Ok(Side::Buy),
        "sell" | "s" | "ask" => Ok(Side::Sell),
        _ => Err(ParseError::Side {
            value: word.to_string(),
        }),
    }
}

fn parse_timestamp(raw: &RawTimestamp) -> Result<DateTime<Utc>, ParseError> {
    let millis = match raw {
        RawTimestamp::Millis(ms) => *ms,
        RawTimestamp::Text(text) => {
            text.trim().parse::<i64>().map_err(|_| ParseError::Timestamp {
                value: text.clone(),
            })?
        }
    };
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| ParseError::Timestamp {
            value: millis.to_string(),
        })
}
