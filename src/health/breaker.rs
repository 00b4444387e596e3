//! Per-venue circuit breaker store.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::domain::VenueId;

/// Breaker states. Transitions happen only through explicit calls; a
/// breaker never decays on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// A configured breaker for one venue.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreaker {
    pub venue: VenueId,
    pub state: BreakerState,
    pub trip_count: u64,
    pub last_tripped_at: Option<DateTime<Utc>>,
    pub last_recovered_at: Option<DateTime<Utc>>,
    pub failure_threshold: u32,
    pub recovery_timeout_secs: u64,
}

/// Store of per-venue circuit breakers.
///
/// Operations on an unconfigured venue are silent no-ops: the pipeline may
/// trip a venue before an operator has configured breaker thresholds for
/// it, and report paths rely on `get` returning `None` rather than erroring.
#[derive(Debug, Default)]
pub struct CircuitBreakerStore {
    breakers: DashMap<VenueId, CircuitBreaker>,
}

impl CircuitBreakerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the breaker in `closed` state if absent. Re-configuring an
    /// existing breaker resets the thresholds but leaves current state,
    /// trip count and timestamps untouched.
    pub fn configure(&self, venue: &VenueId, failure_threshold: u32, recovery_timeout_secs: u64) {
        self.breakers
            .entry(venue.clone())
            .and_modify(|breaker| {
                breaker.failure_threshold = failure_threshold;
                breaker.recovery_timeout_secs = recovery_timeout_secs;
            })
            .or_insert_with(|| CircuitBreaker {
                venue: venue.clone(),
                state: BreakerState::Closed,
                trip_count: 0,
                last_tripped_at: None,
                last_recovered_at: None,
                failure_threshold,
                recovery_timeout_secs,
            });
    }

    /// Configure with the default thresholds.
    pub fn configure_default(&self, venue: &VenueId) {
        self.configure(venue, 5, 30);
    }

    /// `closed|half-open -> open`. Increments the trip count.
    pub fn trip(&self, venue: &VenueId, at: DateTime<Utc>) {
        if let Some(mut breaker) = self.breakers.get_mut(venue) {
            breaker.state = BreakerState::Open;
            breaker.trip_count += 1;
            breaker.last_tripped_at = Some(at);
        }
    }

    /// `open -> half-open`; operator- or scheduler-driven probe.
    pub fn half_open(&self, venue: &VenueId) {
        if let Some(mut breaker) = self.breakers.get_mut(venue) {
            if breaker.state == BreakerState::Open {
                breaker.state = BreakerState::HalfOpen;
            }
        }
    }

    /// `* -> closed`. Records the recovery instant.
    pub fn recover(&self, venue: &VenueId, at: DateTime<Utc>) {
        if let Some(mut breaker) = self.breakers.get_mut(venue) {
            breaker.state = BreakerState::Closed;
            breaker.last_recovered_at = Some(at);
        }
    }

    #[must_use]
    pub fn get(&self, venue: &VenueId) -> Option<CircuitBreaker> {
        self.breakers.get(venue).map(|b| b.clone())
    }

    /// Venues currently in the `open` state.
    #[must_use]
    pub fn open_venues(&self) -> Vec<VenueId> {
        self.breakers
            .iter()
            .filter(|entry| entry.state == BreakerState::Open)
            .map(|entry| entry.key().clone())
            .collect()
    }
}
