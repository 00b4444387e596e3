//! DEX / AMM swap-feed adapter.
//!
//! Swap indexers batch fills per frame and have no side field: the sign of
//! the base amount encodes the direction, so `side` is left empty for the
//! normalizer to infer.

use serde::Deserialize;
use serde_json::json;

use crate::domain::VenueKind;
use crate::error::Result;
use crate::feed::adapter::{RawTimestamp, RawTrade, VenueAdapter};

pub struct DexAdapter;

#[derive(Debug, Deserialize)]
struct SwapFrame {
    channel: Option<String>,
    #[serde(default)]
    data: Vec<Swap>,
}

#[derive(Debug, Deserialize)]
struct Swap {
    pair: String,
    price: String,
    /// Signed base amount; negative means the pool sold the base asset.
    amount: String,
    tx: String,
    ts: i64,
}

impl VenueAdapter for DexAdapter {
    fn kind(&self) -> VenueKind {
        VenueKind::Dex
    }

    fn default_symbols(&self) -> &'static [&'static str] {
        &["WETH-USDC", "WBTC-USDC"]
    }

    fn subscribe_frame(&self, symbols: &[String]) -> String {
        json!({
            "op": "subscribe",
            "channel": "swaps",
            "pairs": symbols,
        })
        .to_string()
    }

    fn extract(&self, payload: &str) -> Result<Vec<RawTrade>> {
        let frame: SwapFrame = serde_json::from_str(payload)?;
        if frame.channel.as_deref() != Some("swaps") {
            return Ok(Vec::new());
        }
        Ok(frame
            .data
            .into_iter()
            .map(|swap| RawTrade {
                symbol: swap.pair,
                price: swap.price,
                size: swap.amount,
                side: None,
                timestamp: RawTimestamp::Millis(swap.ts),
                native_id: swap.tx,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_frame_carries_pairs() {
        let frame = DexAdapter.subscribe_frame(&["WETH-USDC".into()]);
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["op"], "subscribe");
        assert_eq!(value["pairs"][0], "WETH-USDC");
    }

    #[test]
    fn extracts_batched_swaps_without_side() {
        let payload = r#"{
            "channel": "swaps",
            "data": [
                {"pair":"WETH-USDC","price":"3000.5","amount":"-1.2","tx":"0xabc","ts":1700000000000},
                {"pair":"WETH-USDC","price":"3001.0","amount":"0.7","tx":"0xdef","ts":1700000001000}
            ]
        }"#;
        let raws = DexAdapter.extract(payload).unwrap();
        assert_eq!(raws.len(), 2);
        assert_eq!(raws[0].side, None);
        assert_eq!(raws[0].size, "-1.2");
        assert_eq!(raws[1].native_id, "0xdef");
    }

    #[test]
    fn other_channels_yield_nothing() {
        let payload = r#"{"channel":"blocks","data":[]}"#;
        assert!(DexAdapter.extract(payload).unwrap().is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(DexAdapter.extract("{").is_err());
    }
}
