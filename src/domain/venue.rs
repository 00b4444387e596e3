//! Venue identity and the registry of enabled/disabled venues.

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::VenueId;

/// Venue category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueKind {
    /// Centralized exchange.
    Cex,
    /// On-chain AMM / DEX feed.
    Dex,
    /// Prediction market.
    Prediction,
}

impl VenueKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cex => "cex",
            Self::Dex => "dex",
            Self::Prediction => "prediction",
        }
    }
}

/// A venue known to the process: identity plus the settings snapshot the
/// pipeline was started with. Created from configuration at startup and
/// never destroyed while the process runs; only `enabled` is mutated.
#[derive(Debug, Clone)]
pub struct Venue {
    pub id: VenueId,
    pub kind: VenueKind,
    pub enabled: bool,
    pub whale_threshold: Decimal,
    pub symbols: Vec<String>,
    pub candle_interval_secs: u64,
    pub feed_urls: Vec<String>,
}

/// Registry of venues, shared between the pipelines (writers of their own
/// entry) and the health aggregator (reader of the disabled set).
#[derive(Debug, Default)]
pub struct VenueRegistry {
    venues: DashMap<VenueId, Venue>,
}

impl VenueRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, venue: Venue) {
        self.venues.insert(venue.id.clone(), venue);
    }

    #[must_use]
    pub fn get(&self, id: &VenueId) -> Option<Venue> {
        self.venues.get(id).map(|v| v.clone())
    }

    /// Mark a venue administratively disabled. No-op for unknown venues.
    pub fn disable(&self, id: &VenueId) {
        if let Some(mut venue) = self.venues.get_mut(id) {
            venue.enabled = false;
        }
    }

    /// Re-enable a venue. No-op for unknown venues.
    pub fn enable(&self, id: &VenueId) {
        if let Some(mut venue) = self.venues.get_mut(id) {
            venue.enabled = true;
        }
    }

    #[must_use]
    pub fn is_disabled(&self, id: &VenueId) -> bool {
        self.venues.get(id).is_some_and(|v| !v.enabled)
    }

    /// Snapshot of all currently disabled venue ids.
    #[must_use]
    pub fn disabled(&self) -> Vec<VenueId> {
        self.venues
            .iter()
            .filter(|entry| !entry.enabled)
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Snapshot of all registered venue ids.
    #[must_use]
    pub fn venue_ids(&self) -> Vec<VenueId> {
        self.venues.iter().map(|entry| entry.key().clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.venues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }
}
