//! Reconnection and keepalive tuning.

use serde::Deserialize;

/// WebSocket reconnection settings, shared by every venue pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectionConfig {
    /// First retry delay in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Ceiling for the doubling backoff delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Consecutive failures tolerated before the venue is tripped dead.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Keepalive ping cadence, independent of feed traffic.
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    10
}

fn default_ping_interval_secs() -> u64 {
    30
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
            ping_interval_secs: default_ping_interval_secs(),
        }
    }
}
