//! Venue adapter seam.
//!
//! One generic ingestion engine handles every venue; the differences that
//! actually vary between venues (wire format, field names, side semantics,
//! default watchlist) live behind this small trait.

use crate::domain::VenueKind;
use crate::error::Result;

/// A venue-native trade record with field names already mapped, but values
/// still in wire shape. The normalizer turns this into a canonical
/// [`crate::domain::Trade`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTrade {
    pub symbol: String,
    /// Numeric-as-string price, as venues send it.
    pub price: String,
    /// Numeric-as-string size. May be signed for AMM-style venues where
    /// the sign encodes the side.
    pub size: String,
    /// Venue-native side vocabulary, absent when the sign of `size` is the
    /// only side signal.
    pub side: Option<String>,
    pub timestamp: RawTimestamp,
    /// Venue-native trade id, input to the deterministic id hash.
    pub native_id: String,
}

/// Venue timestamp representations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTimestamp {
    /// Epoch milliseconds as an integer.
    Millis(i64),
    /// Epoch milliseconds as a string.
    Text(String),
}

/// Venue-specific wire handling injected into the shared engine.
pub trait VenueAdapter: Send + Sync {
    /// Venue category this adapter speaks for.
    fn kind(&self) -> VenueKind;

    /// Fallback watchlist when the configured symbols are absent or
    /// unparsable.
    fn default_symbols(&self) -> &'static [&'static str];

    /// Render the subscribe control frame for a symbol set.
    fn subscribe_frame(&self, symbols: &[String]) -> String;

    /// Route one inbound text frame, extracting zero or more raw trades.
    /// Frames that are not trade payloads (acks, heartbeats, snapshots)
    /// yield an empty vec; a malformed frame is an error so the caller can
    /// log and drop it.
    fn extract(&self, payload: &str) -> Result<Vec<RawTrade>>;
}
