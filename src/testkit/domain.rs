//! Builders for domain primitives used across tests.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{Side, Trade, Venue, VenueId, VenueKind};
use crate::feed::adapter::{RawTimestamp, RawTrade};

/// A CEX venue with a small whale threshold and a 60s candle interval.
#[must_use]
pub fn venue(name: &str) -> Venue {
    Venue {
        id: VenueId::new(name),
        kind: VenueKind::Cex,
        enabled: true,
        whale_threshold: dec!(100000),
        symbols: vec!["BTCUSDT".into()],
        candle_interval_secs: 60,
        feed_urls: vec!["wss://example.test/ws".into()],
    }
}

/// A buy trade at the given epoch-second timestamp.
#[must_use]
pub fn trade_at(venue_name: &str, secs: i64, price: Decimal, size: Decimal) -> Trade {
    Trade::new(
        VenueId::new(venue_name),
        "BTCUSDT",
        price,
        size,
        Side::Buy,
        Utc.timestamp_opt(secs, 0).unwrap(),
        &format!("t-{secs}-{price}"),
    )
}

/// A well-formed raw CEX trade record.
#[must_use]
pub fn raw_trade(native_id: &str) -> RawTrade {
    RawTrade {
        symbol: "BTCUSDT".into(),
        price: "50000".into(),
        size: "0.5".into(),
        side: Some("buy".into()),
        timestamp: RawTimestamp::Millis(1_700_000_000_000),
        native_id: native_id.into(),
    }
}

/// A CEX wire frame carrying one trade, as the adapter expects it.
#[must_use]
pub fn cex_trade_frame(symbol: &str, price: &str, qty: &str, trade_id: u64, at_ms: i64) -> String {
    format!(
        r#"{{"e":"trade","s":"{symbol}","p":"{price}","q":"{qty}","m":false,"t":{trade_id},"T":{at_ms}}}"#
    )
}
