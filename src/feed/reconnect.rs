//! Reconnect backoff state machine.

use crate::config::ReconnectionConfig;

/// What the pipeline should do after a connection failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Schedule a retry after `delay_ms`. `attempt` is 1-based.
    Retry { attempt: u32, delay_ms: u64 },
    /// The attempt ceiling is reached: mark the venue dead.
    Trip { attempts: u32 },
}

/// Purely local per-venue backoff state. No coordination across venues.
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectionConfig,
    attempts: u32,
    delay_ms: u64,
}

impl ReconnectPolicy {
    #[must_use]
    pub fn new(config: ReconnectionConfig) -> Self {
        let delay_ms = config.base_delay_ms;
        Self {
            config,
            attempts: 0,
            delay_ms,
        }
    }

    /// Register a failure. Returns the retry to schedule, or `Trip` once
    /// the attempt counter reaches the ceiling. The delay doubles after
    /// each retry up to the configured cap.
    pub fn on_failure(&mut self) -> Decision {
        self.attempts += 1;
        if self.attempts >= self.config.max_attempts {
            return Decision::Trip {
                attempts: self.attempts,
            };
        }
        let decision = Decision::Retry {
            attempt: self.attempts,
            delay_ms: self.delay_ms,
        };
        self.delay_ms = (self.delay_ms * 2).min(self.config.max_delay_ms);
        decision
    }

    /// A reconnect succeeded: reset to the base state.
    pub fn on_success(&mut self) {
        self.attempts = 0;
        self.delay_ms = self.config.base_delay_ms;
    }

    /// Operator restart after a trip: same reset as a success.
    pub fn reset(&mut self) {
        self.on_success();
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
