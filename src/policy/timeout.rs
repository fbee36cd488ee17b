//! RPC timeout policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeoutPolicy {
    pub rpc_timeout_ms: u64,

    #[serde(default)]
    pub conn_timeout_ms: u64,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            rpc_timeout_ms: 1000,
            conn_timeout_ms: 50,
        }
    }
}

impl TimeoutPolicy {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    /// Connect timeout, or `None` to leave the transport default.
    pub fn conn_timeout(&self) -> Option<Duration> {
        (self.conn_timeout_ms > 0).then(|| Duration::from_millis(self.conn_timeout_ms))
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.rpc_timeout_ms < 1 {
            return Err("rpc_timeout_ms must be >= 1".into());
        }
        Ok(())
    }
}
