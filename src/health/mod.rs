//! Fleet health: per-venue trackers and the aggregated read side.
//!
//! The trackers are constructed once at process start and passed by
//! reference to both the ingestion pipelines (writers) and the
//! [`report::HealthAggregator`] (reader), keeping ownership and testability
//! explicit.

pub mod breaker;
pub mod reconnects;
pub mod report;
pub mod staleness;

pub use breaker::{BreakerState, CircuitBreaker, CircuitBreakerStore};
pub use reconnects::{ReconnectEntry, ReconnectTracker, RECONNECT_WINDOW_MS};
pub use report::{
    grade, Alert, AlertKind, AlertReport, HealthAggregator, QualityReport, Severity, VenueQuality,
};
pub use staleness::{StalenessEntry, StalenessTracker, DEFAULT_STALENESS_THRESHOLD_MS};

/// The shared tracker bundle written by pipelines and read by the
/// aggregator.
#[derive(Debug, Default)]
pub struct HealthState {
    pub staleness: StalenessTracker,
    pub reconnects: ReconnectTracker,
    pub breakers: CircuitBreakerStore,
}

impl HealthState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build with a non-default staleness threshold (milliseconds).
    #[must_use]
    pub fn with_staleness_threshold(threshold_ms: i64) -> Self {
        Self {
            staleness: StalenessTracker::new(threshold_ms),
            reconnects: ReconnectTracker::new(),
            breakers: CircuitBreakerStore::new(),
        }
    }
}
