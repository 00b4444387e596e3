//! Per-venue last-seen-activity tracking.

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;

use crate::domain::VenueId;

/// Default staleness threshold: one minute without a trade.
pub const DEFAULT_STALENESS_THRESHOLD_MS: i64 = 60_000;

/// Per-venue staleness verdict.
#[derive(Debug, Clone, Serialize)]
pub struct StalenessEntry {
    pub venue: VenueId,
    pub last_seen_ms: i64,
    pub age_ms: i64,
    pub stale: bool,
}

/// Records the last observed activity per venue.
///
/// Each entry is written only by that venue's own pipeline and read by the
/// health aggregator, so a per-entry lock is all the synchronization needed.
#[derive(Debug)]
pub struct StalenessTracker {
    last_seen: DashMap<VenueId, i64>,
    threshold_ms: i64,
}

impl StalenessTracker {
    #[must_use]
    pub fn new(threshold_ms: i64) -> Self {
        Self {
            last_seen: DashMap::new(),
            threshold_ms,
        }
    }

    #[must_use]
    pub fn threshold_ms(&self) -> i64 {
        self.threshold_ms
    }

    /// Record activity for a venue at the current wall clock.
    pub fn record_seen(&self, venue: &VenueId) {
        self.record_seen_at(venue, Utc::now().timestamp_millis());
    }

    /// Record activity for a venue at an explicit instant.
    pub fn record_seen_at(&self, venue: &VenueId, at_ms: i64) {
        self.last_seen.insert(venue.clone(), at_ms);
    }

    /// Milliseconds since the venue was last seen, `None` if never seen.
    #[must_use]
    pub fn age_at(&self, venue: &VenueId, now_ms: i64) -> Option<i64> {
        self.last_seen
            .get(venue)
            .map(|seen| (now_ms - *seen).max(0))
    }

    /// Staleness verdict for one venue. A venue that has never produced a
    /// trade is stale by definition.
    #[must_use]
    pub fn is_stale_at(&self, venue: &VenueId, now_ms: i64) -> bool {
        match self.age_at(venue, now_ms) {
            Some(age) => age > self.threshold_ms,
            None => true,
        }
    }

    /// Full per-venue summary over all venues that have reported at least
    /// once.
    #[must_use]
    pub fn summary_at(&self, now_ms: i64) -> Vec<StalenessEntry> {
        let mut entries: Vec<StalenessEntry> = self
            .last_seen
            .iter()
            .map(|entry| {
                let age = (now_ms - *entry.value()).max(0);
                StalenessEntry {
                    venue: entry.key().clone(),
                    last_seen_ms: *entry.value(),
                    age_ms: age,
                    stale: age > self.threshold_ms,
                }
            })
            .collect();
        entries.sort_by(|a, b| a.venue.as_str().cmp(b.venue.as_str()));
        entries
    }

    #[must_use]
    pub fn has_seen(&self, venue: &VenueId) -> bool {
        self.last_seen.contains_key(venue)
    }
}

impl Default for StalenessTracker {
    fn default() -> Self {
        Self::new(DEFAULT_STALENESS_THRESHOLD_MS)
    }
}
