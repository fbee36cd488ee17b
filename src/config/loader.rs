//! Settings loading from disk.

use std::path::Path;

use thiserror::Error;

use crate::config::schema::Settings;
use crate::config::validation::{validate_settings, ValidationError};

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Parse and validate settings from TOML text.
pub fn parse_settings(content: &str) -> Result<Settings, ConfigError> {
    let settings: Settings = toml::from_str(content)?;
    validate_settings(&settings).map_err(ConfigError::Validation)?;
    Ok(settings)
}

/// Load and validate settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_settings(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ZeroLimit;

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.paths.prefix, "/KitexConfig");
    }

    #[test]
    fn test_full_file() {
        let settings = parse_settings(
            r#"
            [store]
            endpoints = ["memory://"]
            session_timeout_ms = 2500

            [paths]
            prefix = "/ops"
            server_template = "{{.ServerServiceName}}/policies/{{.Category}}"

            [resubscribe]
            base_delay_ms = 50
            max_delay_ms = 800

            [limiter]
            zero = "unlimited"

            [observability]
            json_logs = true
            "#,
        )
        .unwrap();
        assert_eq!(settings.store.endpoints, vec!["memory://".to_string()]);
        assert_eq!(settings.store.session_timeout_ms, 2500);
        assert_eq!(settings.paths.prefix, "/ops");
        assert_eq!(settings.paths.client_template, crate::template::DEFAULT_CLIENT_TEMPLATE);
        assert_eq!(settings.resubscribe.max_delay_ms, 800);
        assert_eq!(settings.resubscribe.jitter_ratio, 0.1);
        assert_eq!(settings.limiter.zero, ZeroLimit::Unlimited);
        assert!(settings.observability.json_logs);
    }

    #[test]
    fn test_validation_errors_are_collected() {
        let err = parse_settings(
            r#"
            [paths]
            client_template = "{{.Nope}}"
            [resubscribe]
            base_delay_ms = 0
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[limiter]\nzero = \"reject_all\"\n").unwrap();
        assert_eq!(load_settings(&path).unwrap().limiter.zero, ZeroLimit::RejectAll);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(load_settings(&missing), Err(ConfigError::Io { .. })));
    }
}
