//! Settings validation.
//!
//! # Responsibilities
//! - Validate value ranges (timeouts > 0, delays ordered, ratios in [0, 1])
//! - Compile both path templates
//! - Check addresses and log level
//!
//! Returns all validation errors, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::Settings;
use crate::template::{PathTemplate, TemplateError};
use crate::watch::backoff::MAX_DELAY_LIMIT_MS;

/// A single semantic problem in the settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("store.endpoints must not be empty")]
    NoEndpoints,

    #[error("store.session_timeout_ms must be > 0")]
    ZeroSessionTimeout,

    #[error("paths.{field}: {source}")]
    Template {
        field: &'static str,
        #[source]
        source: TemplateError,
    },

    #[error("resubscribe.base_delay_ms must be > 0")]
    ZeroBaseDelay,

    #[error("resubscribe.max_delay_ms ({max}) is below base_delay_ms ({base})")]
    DelayOrder { base: u64, max: u64 },

    #[error("resubscribe.max_delay_ms ({0}) exceeds the one hour limit")]
    DelayTooLarge(u64),

    #[error("resubscribe.jitter_ratio must be within [0, 1], got {0}")]
    JitterRange(f64),

    #[error("observability.log_level '{0}' is not a known level")]
    LogLevel(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate `settings`, collecting every problem.
pub fn validate_settings(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.store.endpoints.is_empty() {
        errors.push(ValidationError::NoEndpoints);
    }
    if settings.store.session_timeout_ms == 0 {
        errors.push(ValidationError::ZeroSessionTimeout);
    }

    for (field, source) in [
        ("client_template", &settings.paths.client_template),
        ("server_template", &settings.paths.server_template),
    ] {
        if let Err(source) = PathTemplate::parse(source) {
            errors.push(ValidationError::Template { field, source });
        }
    }

    let backoff = &settings.resubscribe;
    if backoff.base_delay_ms == 0 {
        errors.push(ValidationError::ZeroBaseDelay);
    }
    if backoff.max_delay_ms < backoff.base_delay_ms {
        errors.push(ValidationError::DelayOrder {
            base: backoff.base_delay_ms,
            max: backoff.max_delay_ms,
        });
    }
    if backoff.max_delay_ms > MAX_DELAY_LIMIT_MS {
        errors.push(ValidationError::DelayTooLarge(backoff.max_delay_ms));
    }
    if !(0.0..=1.0).contains(&backoff.jitter_ratio) {
        errors.push(ValidationError::JitterRange(backoff.jitter_ratio));
    }

    let observability = &settings.observability;
    if !matches!(
        observability.log_level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ValidationError::LogLevel(observability.log_level.clone()));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
