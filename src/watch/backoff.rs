//! Exponential backoff with jitter for resubscription.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Largest accepted `max_delay_ms` (one hour).
pub const MAX_DELAY_LIMIT_MS: u64 = 3_600_000;

/// Resubscribe and read-retry delay settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay before the first retry in milliseconds.
    pub base_delay_ms: u64,

    /// Ceiling for the exponential delay in milliseconds.
    pub max_delay_ms: u64,

    /// Extra random delay as a fraction of the computed delay, in [0, 1].
    pub jitter_ratio: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 100,
            max_delay_ms: 5_000,
            jitter_ratio: 0.1,
        }
    }
}

impl BackoffConfig {
    /// Delay before resubscribe attempt `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }

        let exponential_base = 2u64.saturating_pow(attempt - 1);
        let delay_ms = self.base_delay_ms.saturating_mul(exponential_base);
        let capped_delay = delay_ms.min(self.max_delay_ms);

        let jitter_range = (capped_delay as f64 * self.jitter_ratio.clamp(0.0, 1.0)) as u64;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped_delay.saturating_add(jitter))
    }

    /// Largest delay this config can produce.
    pub fn ceiling(&self) -> Duration {
        let cap = self.max_delay_ms;
        let jitter = (cap as f64 * self.jitter_ratio.clamp(0.0, 1.0)) as u64;
        Duration::from_millis(cap.saturating_add(jitter))
    }
}
