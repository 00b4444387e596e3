//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Venue identifier - newtype for type safety.
///
/// The inner String is private to ensure all construction goes through
/// the defined constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VenueId(String);

impl VenueId {
    /// Create a new `VenueId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the venue ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VenueId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for VenueId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Deterministic trade identifier.
///
/// Derived from (venue, symbol, venue-native trade id) so that duplicate
/// deliveries after a reconnect hash to the same id and the persistence
/// upsert collapses them into a single row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeId(String);

impl TradeId {
    /// Derive a trade id from the venue, symbol and the venue-native id.
    #[must_use]
    pub fn derive(venue: &VenueId, symbol: &str, native_id: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(venue.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(symbol.as_bytes());
        hasher.update(b":");
        hasher.update(native_id.as_bytes());
        let digest = hasher.finalize();
        // 16 bytes of the digest is plenty for a primary key.
        Self(hex::encode(&digest[..16]))
    }

    /// Get the trade ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TradeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TradeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
