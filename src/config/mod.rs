//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file; `load` reads and validates in
//! one step so a misconfigured venue fails fast before any connection is
//! attempted.

pub mod logging;
pub mod reconnect;
pub mod venue;

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, Result};
pub use logging::LoggingConfig;
pub use reconnect::ReconnectionConfig;
pub use venue::{SymbolsField, VenueConfig};

fn default_database_path() -> String {
    "tapewire.db".into()
}

fn default_bus_root() -> String {
    "market".into()
}

fn default_staleness_threshold_secs() -> u64 {
    60
}

/// Event bus settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BusConfig {
    /// Root segment for every published subject.
    #[serde(default = "default_bus_root")]
    pub root: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            root: default_bus_root(),
        }
    }
}

/// Fleet health thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// Age after which a venue with no activity is considered stale.
    #[serde(default = "default_staleness_threshold_secs")]
    pub staleness_threshold_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            staleness_threshold_secs: default_staleness_threshold_secs(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database: String,

    #[serde(default)]
    pub bus: BusConfig,

    #[serde(default)]
    pub health: HealthConfig,

    /// WebSocket reconnection settings shared by all venue pipelines.
    #[serde(default)]
    pub reconnection: ReconnectionConfig,

    /// The venue fleet.
    #[serde(default)]
    pub venues: Vec<VenueConfig>,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string and validate it.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }
        if self.bus.root.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "bus.root" }.into());
        }
        for venue in &self.venues {
            venue.validate()?;
        }
        let mut names: Vec<&str> = self.venues.iter().map(|v| v.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.venues.len() {
            return Err(ConfigError::InvalidValue {
                field: "venues",
                reason: "duplicate venue names".into(),
            }
            .into());
        }
        Ok(())
    }

    /// Initialize logging from the embedded logging section.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
