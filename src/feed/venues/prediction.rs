//! Prediction-market fill-feed adapter.
//!
//! Fill feeds quote outcome shares priced 0..1, use bid/ask side
//! vocabulary and send epoch-millisecond timestamps as strings.

use serde::Deserialize;
use serde_json::json;

use crate::domain::VenueKind;
use crate::error::Result;
use crate::feed::adapter::{RawTimestamp, RawTrade, VenueAdapter};

pub struct PredictionAdapter;

#[derive(Debug, Deserialize)]
struct FillEvent {
    #[serde(rename = "type")]
    kind: String,
    market: String,
    price: String,
    size: String,
    side: String,
    trade_id: String,
    time: String,
}

impl VenueAdapter for PredictionAdapter {
    fn kind(&self) -> VenueKind {
        VenueKind::Prediction
    }

    fn default_symbols(&self) -> &'static [&'static str] {
        &["FED-CUT-SEP", "BTC-100K-EOY"]
    }

    fn subscribe_frame(&self, symbols: &[String]) -> String {
        json!({
            "type": "subscribe",
            "channels": ["fills"],
            "markets": symbols,
        })
        .to_string()
    }

    fn extract(&self, payload: &str) -> Result<Vec<RawTrade>> {
        let value: serde_json::Value = serde_json::from_str(payload)?;
        if value.get("type").and_then(|t| t.as_str()) != Some("fill") {
            return Ok(Vec::new());
        }
        let event: FillEvent = serde_json::from_value(value)?;
        debug_assert_eq!(event.kind, "fill");
        Ok(vec![RawTrade {
            symbol: event.market,
            price: event.price,
            size: event.size,
            side: Some(event.side),
            timestamp: RawTimestamp::Text(event.time),
            native_id: event.trade_id,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_frame_targets_fill_channel() {
        let frame = PredictionAdapter.subscribe_frame(&["FED-CUT-SEP".into()]);
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "subscribe");
        assert_eq!(value["channels"][0], "fills");
        assert_eq!(value["markets"][0], "FED-CUT-SEP");
    }

    #[test]
    fn extracts_a_fill() {
        let payload = r#"{
            "type":"fill","market":"FED-CUT-SEP","price":"0.64","size":"150",
            "side":"ask","trade_id":"f-123","time":"1700000000000"
        }"#;
        let raws = PredictionAdapter.extract(payload).unwrap();
        assert_eq!(raws.len(), 1);
        assert_eq!(raws[0].symbol, "FED-CUT-SEP");
        assert_eq!(raws[0].side.as_deref(), Some("ask"));
        assert_eq!(
            raws[0].timestamp,
            RawTimestamp::Text("1700000000000".into())
        );
    }

    #[test]
    fn non_fill_messages_yield_nothing() {
        let payload = r#"{"type":"subscribed","channels":["fills"]}"#;
        assert!(PredictionAdapter.extract(payload).unwrap().is_empty());
    }
}
