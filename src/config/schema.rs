//! Settings schema definitions.

use serde::{Deserialize, Serialize};

use crate::policy::ZeroLimit;
use crate::store::StoreConfig;
use crate::template::ConfigParamConfig;
use crate::watch::BackoffConfig;

/// Root settings for a process running config suites.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Coordination-store connection.
    pub store: StoreConfig,

    /// Node prefix and path templates.
    pub paths: ConfigParamConfig,

    /// Backoff between resubscribe attempts.
    pub resubscribe: BackoffConfig,

    /// Limiter document interpretation.
    pub limiter: LimiterConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Limiter document interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LimiterConfig {
    /// How a zero cap is read when the document does not say.
    pub zero: ZeroLimit,
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
