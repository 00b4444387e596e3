//! Fleet health aggregation: alerts and data-quality scores.
//!
//! Everything here is recomputed per request from the live trackers, so a
//! report can never drift from its inputs.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use super::breaker::BreakerState;
use super::HealthState;
use crate::domain::{VenueId, VenueRegistry};

/// Age beyond which a stale venue escalates from warning to critical.
const CRITICAL_STALENESS_MS: i64 = 300_000;

/// Reconnects-per-hour level that escalates to critical.
const CRITICAL_RECONNECTS_PER_HOUR: usize = 5;

/// Alert severity, ordered most severe first for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// What an alert is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Stale,
    Disconnected,
    Disabled,
    Error,
}

/// A derived alert. Never stored; always recomputed.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub module: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub since: Option<DateTime<Utc>>,
    pub age_seconds: Option<i64>,
}

/// Fleet-wide alert listing with tallies.
#[derive(Debug, Clone, Serialize)]
pub struct AlertReport {
    pub alerts: Vec<Alert>,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub total: usize,
}

/// Per-venue quality score with its components.
#[derive(Debug, Clone, Serialize)]
pub struct VenueQuality {
    pub venue: VenueId,
    pub freshness: u32,
    pub error_score: u32,
    pub rate_score: u32,
    pub score: u32,
    pub grade: char,
    pub disabled: bool,
}

/// Fleet-wide quality report.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub venues: Vec<VenueQuality>,
    pub system_score: u32,
    pub system_grade: char,
}

/// Letter grade for a 0-100 score.
#[must_use]
pub fn grade(score: u32) -> char {
    if score >= 90 {
        'A'
    } else if score >= 80 {
        'B'
    } else if score >= 70 {
        'C'
    } else if score >= 60 {
        'D'
    } else {
        'F'
    }
}

/// Read-side aggregator over the shared health trackers and venue registry.
#[derive(Clone)]
pub struct HealthAggregator {
    state: Arc<HealthState>,
    registry: Arc<VenueRegistry>,
}

impl HealthAggregator {
    #[must_use]
    pub fn new(state: Arc<HealthState>, registry: Arc<VenueRegistry>) -> Self {
        Self { state, registry }
    }

    /// Fleet-wide alert listing at the current wall clock.
    #[must_use]
    pub fn alerts(&self) -> AlertReport {
        self.alerts_at(Utc::now().timestamp_millis())
    }

    /// Fleet-wide alert listing at an explicit instant.
    #[must_use]
    pub fn alerts_at(&self, now_ms: i64) -> AlertReport {
        let mut alerts = Vec::new();
        let mut venues = self.registry.venue_ids();
        venues.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        for venue in &venues {
            // The fleet-wide listing reports disabled venues at info; the
            // per-venue listing uses warning. Both severities are live call
            // sites upstream, so both are kept (see DESIGN.md).
            alerts.extend(self.venue_alerts_inner(venue, now_ms, Severity::Info));
        }

        alerts.sort_by_key(|alert| alert.severity);
        let critical = alerts.iter().filter(|a| a.severity == Severity::Critical).count();
        let warning = alerts.iter().filter(|a| a.severity == Severity::Warning).count();
        let info = alerts.iter().filter(|a| a.severity == Severity::Info).count();
        AlertReport {
            total: critical + warning + info,
            alerts,
            critical,
            warning,
            info,
        }
    }

    /// Alerts for a single venue at the current wall clock.
    #[must_use]
    pub fn venue_alerts(&self, venue: &VenueId) -> Vec<Alert> {
        self.venue_alerts_at(venue, Utc::now().timestamp_millis())
    }

    /// Alerts for a single venue at an explicit instant.
    #[must_use]
    pub fn venue_alerts_at(&self, venue: &VenueId, now_ms: i64) -> Vec<Alert> {
        let mut alerts = self.venue_alerts_inner(venue, now_ms, Severity::Warning);
        alerts.sort_by_key(|alert| alert.severity);
        alerts
    }

    fn venue_alerts_inner(
        &self,
        venue: &VenueId,
        now_ms: i64,
        disabled_severity: Severity,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();

        if self.registry.is_disabled(venue) {
            alerts.push(Alert {
                module: venue.to_string(),
                kind: AlertKind::Disabled,
                severity: disabled_severity,
                message: format!("{venue} is administratively disabled"),
                since: None,
                age_seconds: None,
            });
        }

        if let Some(age_ms) = self.state.staleness.age_at(venue, now_ms) {
            if age_ms > self.state.staleness.threshold_ms() {
                let severity = if age_ms > CRITICAL_STALENESS_MS {
                    Severity::Critical
                } else {
                    Severity::Warning
                };
                alerts.push(Alert {
                    module: venue.to_string(),
                    kind: AlertKind::Stale,
                    severity,
                    message: format!("no trades from {venue} for {}s", age_ms / 1000),
                    since: Utc.timestamp_millis_opt(now_ms - age_ms).single(),
                    age_seconds: Some(age_ms / 1000),
                });
            }
        }

        let reconnects = self.state.reconnects.count_within_hour(venue, now_ms);
        if reconnects >= 1 {
            let severity = if reconnects >= CRITICAL_RECONNECTS_PER_HOUR {
                Severity::Critical
            } else {
                Severity::Warning
            };
            let since = self
                .state
                .reconnects
                .last_at(venue)
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
            alerts.push(Alert {
                module: venue.to_string(),
                kind: AlertKind::Disconnected,
                severity,
                message: format!("{reconnects} reconnect(s) in the last hour"),
                since,
                age_seconds: since.map(|at| (now_ms - at.timestamp_millis()) / 1000),
            });
        }

        if let Some(breaker) = self.state.breakers.get(venue) {
            if breaker.state == BreakerState::Open {
                alerts.push(Alert {
                    module: venue.to_string(),
                    kind: AlertKind::Error,
                    severity: Severity::Critical,
                    message: format!(
                        "circuit breaker open ({} trip(s) total)",
                        breaker.trip_count
                    ),
                    since: breaker.last_tripped_at,
                    age_seconds: breaker
                        .last_tripped_at
                        .map(|at| (now_ms - at.timestamp_millis()) / 1000),
                });
            }
        }

        alerts
    }

    /// Per-venue staleness summary at the current wall clock.
    #[must_use]
    pub fn staleness_summary(&self) -> Vec<super::StalenessEntry> {
        self.state
            .staleness
            .summary_at(Utc::now().timestamp_millis())
    }

    /// Per-venue reconnect summary over the trailing hour.
    #[must_use]
    pub fn reconnect_summary(&self) -> Vec<super::ReconnectEntry> {
        self.state
            .reconnects
            .summary_at(Utc::now().timestamp_millis())
    }

    /// Circuit breaker for one venue, `None` if never configured.
    #[must_use]
    pub fn circuit_breaker(&self, venue: &VenueId) -> Option<super::CircuitBreaker> {
        self.state.breakers.get(venue)
    }

    /// Quality scores at the current wall clock.
    #[must_use]
    pub fn quality_scores(&self) -> QualityReport {
        self.quality_scores_at(Utc::now().timestamp_millis())
    }

    /// Quality scores at an explicit instant.
    #[must_use]
    pub fn quality_scores_at(&self, now_ms: i64) -> QualityReport {
        let mut venues = self.registry.venue_ids();
        venues.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        let scores: Vec<VenueQuality> = venues
            .iter()
            .map(|venue| self.venue_quality_at(venue, now_ms))
            .collect();

        let system_score = if scores.is_empty() {
            0
        } else {
            let sum: u32 = scores.iter().map(|s| s.score).sum();
            ((f64::from(sum)) / scores.len() as f64).round() as u32
        };

        QualityReport {
            venues: scores,
            system_score,
            system_grade: grade(system_score),
        }
    }

    /// Score one venue. Disabled venues are forced to zero regardless of
    /// the component scores.
    #[must_use]
    pub fn venue_quality_at(&self, venue: &VenueId, now_ms: i64) -> VenueQuality {
        let seen = self.state.staleness.has_seen(venue);
        let stale = self.state.staleness.is_stale_at(venue, now_ms);
        let age = self.state.staleness.age_at(venue, now_ms);
        let reconnects = self.state.reconnects.count_within_hour(venue, now_ms);
        let disabled = self.registry.is_disabled(venue);

        let freshness: u32 = if !seen {
            0
        } else if !stale {
            100
        } else if age.is_some_and(|a| a > CRITICAL_STALENESS_MS) {
            10
        } else {
            50
        };

        let error_score: u32 = match reconnects {
            0 => 100,
            1..=2 => 80,
            3..=4 => 60,
            5..=9 => 30,
            _ => 0,
        };

        let rate_score: u32 = if !seen {
            0
        } else if stale {
            25
        } else {
            100
        };

        let score = if disabled {
            0
        } else {
            (0.4 * f64::from(freshness) + 0.3 * f64::from(error_score) + 0.3 * f64::from(rate_score))
                .round() as u32
        };

        VenueQuality {
            venue: venue.clone(),
            freshness,
            error_score,
            rate_score,
            score,
            grade: grade(score),
            disabled,
        }
    }
}
