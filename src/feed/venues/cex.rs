//! Centralized-exchange adapter.
//!
//! Speaks the common CEX trade-stream dialect: a `SUBSCRIBE` control frame
//! with per-symbol channels, and single-trade event frames with
//! numeric-as-string fields and an explicit taker-side flag.

use serde::Deserialize;
use serde_json::json;

use crate::domain::VenueKind;
use crate::error::Result;
use crate::feed::adapter::{RawTimestamp, RawTrade, VenueAdapter};

pub struct CexAdapter;

/// Inbound trade event frame.
///
/// Non-trade frames (subscription acks, listing updates) either lack the
/// `e` tag or carry a different one and are ignored.
#[derive(Debug, Deserialize)]
struct TradeEvent {
    #[serde(rename = "e")]
    event: Option<String>,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "p")]
    price: String,
    #[serde(rename = "q")]
    quantity: String,
    /// True when the buyer is the maker, i.e. the taker sold.
    #[serde(rename = "m")]
    buyer_is_maker: bool,
    #[serde(rename = "t")]
    trade_id: u64,
    #[serde(rename = "T")]
    trade_time: i64,
}

impl VenueAdapter for CexAdapter {
    fn kind(&self) -> VenueKind {
        VenueKind::Cex
    }

    fn default_symbols(&self) -> &'static [&'static str] {
        &["BTCUSDT", "ETHUSDT", "SOLUSDT"]
    }

    fn subscribe_frame(&self, symbols: &[String]) -> String {
        let params: Vec<String> = symbols
            .iter()
            .map(|s| format!("{}@trade", s.to_lowercase()))
            .collect();
        json!({
            "method": "SUBSCRIBE",
            "params": params,
            "id": 1,
        })
        .to_string()
    }

    fn extract(&self, payload: &str) -> Result<Vec<RawTrade>> {
        let value: serde_json::Value = serde_json::from_str(payload)?;
        // Subscription acks come back as {"result":null,"id":1}.
        if value.get("result").is_some() || value.get("e").is_none() {
            return Ok(Vec::new());
        }
        let event: TradeEvent = serde_json::from_value(value)?;
        if event.event.as_deref() != Some("trade") {
            return Ok(Vec::new());
        }
        Ok(vec![RawTrade {
            symbol: event.symbol,
            price: event.price,
            size: event.quantity,
            side: Some(if event.buyer_is_maker { "sell" } else { "buy" }.to_string()),
            timestamp: RawTimestamp::Millis(event.trade_time),
            native_id: event.trade_id.to_string(),
        }])
    }
}
