//! Retry policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Failure classes a retry engine may retry on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryCondition {
    Timeout,
    Connection,
    Overloaded,
    Unavailable,
}

fn default_retry_on() -> Vec<RetryCondition> {
    vec![RetryCondition::Timeout, RetryCondition::Connection]
}

/// Parameters for the retry engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetryPolicy {
    /// Total attempts including the first call.
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds.
    #[serde(default)]
    pub backoff_ms: u64,

    /// Upper bound on the delay (0 = no cap).
    #[serde(default)]
    pub max_backoff_ms: u64,

    /// Conditions considered retryable.
    #[serde(default = "default_retry_on")]
    pub retry_on: Vec<RetryCondition>,

    /// Explicit "retry disabled" marker.
    #[serde(default)]
    pub disabled: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 0,
            max_backoff_ms: 0,
            retry_on: Vec::new(),
            disabled: true,
        }
    }
}

impl RetryPolicy {
    pub fn is_enabled(&self) -> bool {
        !self.disabled && self.max_attempts > 1
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn max_backoff(&self) -> Option<Duration> {
        (self.max_backoff_ms > 0).then(|| Duration::from_millis(self.max_backoff_ms))
    }

    pub fn retries_on(&self, condition: RetryCondition) -> bool {
        !self.disabled && self.retry_on.contains(&condition)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.disabled {
            return Ok(());
        }
        if self.max_attempts < 1 {
            return Err(format!("max_attempts must be >= 1, got {}", self.max_attempts));
        }
        if self.retry_on.is_empty() {
            return Err("retry_on must name at least one condition unless disabled".into());
        }
        if self.max_backoff_ms != 0 && self.max_backoff_ms < self.backoff_ms {
            return Err(format!(
                "max_backoff_ms ({}) is below backoff_ms ({})",
                self.max_backoff_ms, self.backoff_ms
            ));
        }
        Ok(())
    }
}
