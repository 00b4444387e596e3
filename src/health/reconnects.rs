//! Rolling-window reconnect accounting.

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;

use crate::domain::VenueId;

/// The trailing window used by alerts and scoring: one hour.
pub const RECONNECT_WINDOW_MS: i64 = 3_600_000;

/// Per-venue reconnect summary over the trailing window.
#[derive(Debug, Clone, Serialize)]
pub struct ReconnectEntry {
    pub venue: VenueId,
    pub count_last_hour: usize,
    pub last_reconnect_ms: Option<i64>,
}

/// Append-only record of reconnection events per venue.
///
/// Entries older than the window are excluded from every query; they are not
/// physically deleted mid-process, which keeps the writer a plain push.
#[derive(Debug, Default)]
pub struct ReconnectTracker {
    events: DashMap<VenueId, Vec<i64>>,
}

impl ReconnectTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reconnect at the current wall clock.
    pub fn record(&self, venue: &VenueId) {
        self.record_at(venue, Utc::now().timestamp_millis());
    }

    /// Record a reconnect at an explicit instant.
    pub fn record_at(&self, venue: &VenueId, at_ms: i64) {
        self.events.entry(venue.clone()).or_default().push(at_ms);
    }

    /// Reconnects within the trailing hour ending at `now_ms`.
    #[must_use]
    pub fn count_within_hour(&self, venue: &VenueId, now_ms: i64) -> usize {
        self.count_within(venue, RECONNECT_WINDOW_MS, now_ms)
    }

    /// Reconnects within an arbitrary trailing window.
    #[must_use]
    pub fn count_within(&self, venue: &VenueId, window_ms: i64, now_ms: i64) -> usize {
        let cutoff = now_ms - window_ms;
        self.events
            .get(venue)
            .map(|events| events.iter().filter(|&&at| at > cutoff && at <= now_ms).count())
            .unwrap_or(0)
    }

    /// Most recent reconnect timestamp, regardless of window.
    #[must_use]
    pub fn last_at(&self, venue: &VenueId) -> Option<i64> {
        self.events
            .get(venue)
            .and_then(|events| events.last().copied())
    }

    /// Summary over all venues with at least one recorded reconnect.
    #[must_use]
    pub fn summary_at(&self, now_ms: i64) -> Vec<ReconnectEntry> {
        let mut entries: Vec<ReconnectEntry> = self
            .events
            .iter()
            .map(|entry| {
                let cutoff = now_ms - RECONNECT_WINDOW_MS;
                let count = entry
                    .value()
                    .iter()
                    .filter(|&&at| at > cutoff && at <= now_ms)
                    .count();
                ReconnectEntry {
                    venue: entry.key().clone(),
                    count_last_hour: count,
                    last_reconnect_ms: entry.value().last().copied(),
                }
            })
            .collect();
        entries.sort_by(|a, b| a.venue.as_str().cmp(b.venue.as_str()));
        entries
    }
}
