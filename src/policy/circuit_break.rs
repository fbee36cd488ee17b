//! Circuit breaker policy.

use serde::{Deserialize, Serialize};

fn enabled() -> bool {
    true
}

fn default_error_rate() -> f64 {
    0.5
}

fn default_min_sample() -> u64 {
    200
}

/// Parameters for the circuit-breaker engine.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CircuitBreakPolicy {
    #[serde(default = "enabled")]
    pub enabled: bool,

    /// Error ratio in [0, 1] above which the circuit opens.
    #[serde(default = "default_error_rate")]
    pub error_rate: f64,

    /// Minimum requests in the window before the ratio is evaluated.
    #[serde(default = "default_min_sample")]
    pub min_sample: u64,
}

impl Default for CircuitBreakPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            error_rate: default_error_rate(),
            min_sample: default_min_sample(),
        }
    }
}

impl CircuitBreakPolicy {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if !self.error_rate.is_finite() || !(0.0..=1.0).contains(&self.error_rate) {
            return Err(format!("error_rate must be within [0, 1], got {}", self.error_rate));
        }
        if self.min_sample < 1 {
            return Err("min_sample must be >= 1".into());
        }
        Ok(())
    }
}
