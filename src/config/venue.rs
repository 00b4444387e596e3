//! Per-venue feed settings.

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use crate::domain::{Venue, VenueId, VenueKind};
use crate::error::ConfigError;

/// Watched symbols, either as a plain list or as the JSON-array string the
/// settings service hands out. A malformed JSON string falls back to the
/// venue's default list instead of failing the whole venue.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SymbolsField {
    List(Vec<String>),
    Json(String),
}

impl Default for SymbolsField {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl SymbolsField {
    /// Resolve to a concrete symbol list, using `fallback` when empty or
    /// unparsable.
    #[must_use]
    pub fn resolve(&self, venue: &str, fallback: &[&str]) -> Vec<String> {
        let resolved = match self {
            Self::List(list) => list.clone(),
            Self::Json(raw) => match serde_json::from_str::<Vec<String>>(raw) {
                Ok(list) => list,
                Err(error) => {
                    warn!(venue, %error, "invalid watched-symbols JSON, using defaults");
                    Vec::new()
                }
            },
        };
        if resolved.is_empty() {
            fallback.iter().map(|s| (*s).to_string()).collect()
        } else {
            resolved
        }
    }
}

/// Configuration for a single venue feed.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    pub name: String,
    pub kind: VenueKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub whale_threshold: Decimal,
    #[serde(default)]
    pub symbols: SymbolsField,
    #[serde(default = "default_candle_interval_secs")]
    pub candle_interval_secs: u64,
    pub feed_urls: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_candle_interval_secs() -> u64 {
    60
}

impl VenueConfig {
    /// Validate operator-supplied settings before any connection is
    /// attempted. Misconfiguration is an operator mistake, not a runtime
    /// condition, so it fails fast.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "venue.name" });
        }
        if self.whale_threshold <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "venue.whale_threshold",
                reason: format!("{}: must be positive, got {}", self.name, self.whale_threshold),
            });
        }
        if self.candle_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "venue.candle_interval_secs",
                reason: format!("{}: must be positive", self.name),
            });
        }
        if self.feed_urls.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "venue.feed_urls",
                reason: format!("{}: at least one feed URL is required", self.name),
            });
        }
        for raw in &self.feed_urls {
            let parsed = url::Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
                field: "venue.feed_urls",
                reason: format!("{}: {raw}: {e}", self.name),
            })?;
            if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
                return Err(ConfigError::InvalidValue {
                    field: "venue.feed_urls",
                    reason: format!("{}: {raw}: scheme must be ws or wss", self.name),
                });
            }
        }
        Ok(())
    }

    /// Materialize the registry entry for this venue.
    #[must_use]
    pub fn to_venue(&self, default_symbols: &[&str]) -> Venue {
        Venue {
            id: VenueId::new(&self.name),
            kind: self.kind,
            enabled: self.enabled,
            whale_threshold: self.whale_threshold,
            symbols: self.symbols.resolve(&self.name, default_symbols),
            candle_interval_secs: self.candle_interval_secs,
            feed_urls: self.feed_urls.clone(),
        }
    }
}
