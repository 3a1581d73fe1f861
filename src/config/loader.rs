//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::IntakeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<IntakeConfig, ConfigError> {
    let config: IntakeConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<IntakeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::FailMode;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [rate_limit]
            on_store_error = "closed"

            [rate_limit.strict]
            max_requests = 2
            window_secs = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.rate_limit.on_store_error, FailMode::Closed);
        assert_eq!(config.rate_limit.strict.max_requests, 2);
        assert_eq!(config.rate_limit.default.max_requests, 10);
        assert_eq!(config.forms.private_event_max_guests, 500);
    }

    #[test]
    fn test_semantic_errors_are_reported() {
        let err = parse_config(
            r#"
            [forms]
            private_event_min_guests = 10
            private_event_max_guests = 5
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("forms.private_event_guests"));
    }

    #[test]
    fn test_syntax_errors_are_parse_errors() {
        let err = parse_config("[listener\nbind_address = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_example_config_is_valid() {
        let config = parse_config(include_str!("../../config/intake.example.toml")).unwrap();
        assert!(config.admin.enabled);
        assert_eq!(config.cors.allowed_origins, ["https://amante.example"]);
        assert_eq!(config.events.seed_file.as_deref(), Some("data/events.sample.json"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/form-intake.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
