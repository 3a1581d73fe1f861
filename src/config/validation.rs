//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows > 0, min <= max, sizes consistent)
//! - Check that enabled features have what they need (admin users, mail key)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: IntakeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{IntakeConfig, NotificationProvider, RatePolicyConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn check_policy(name: &str, policy: &RatePolicyConfig, errors: &mut Vec<ValidationError>) {
    if policy.max_requests == 0 {
        errors.push(ValidationError::new(
            format!("rate_limit.{name}.max_requests"),
            "must be at least 1",
        ));
    }
    if policy.window_secs == 0 {
        errors.push(ValidationError::new(
            format!("rate_limit.{name}.window_secs"),
            "must be at least 1",
        ));
    }
}

fn check_range(field: &str, min: i64, max: i64, errors: &mut Vec<ValidationError>) {
    if min > max {
        errors.push(ValidationError::new(
            field,
            format!("minimum {min} exceeds maximum {max}"),
        ));
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &IntakeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            "must be a socket address such as 0.0.0.0:8080",
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be at least 1"));
    }

    check_policy("default", &config.rate_limit.default, &mut errors);
    check_policy("strict", &config.rate_limit.strict, &mut errors);
    if config.rate_limit.sweep_secs == 0 {
        errors.push(ValidationError::new("rate_limit.sweep_secs", "must be at least 1"));
    }
    if config.rate_limit.strict.max_requests > config.rate_limit.default.max_requests {
        tracing::warn!(
            strict = config.rate_limit.strict.max_requests,
            default = config.rate_limit.default.max_requests,
            "Strict rate policy allows more requests than the default policy"
        );
    }

    if config.cors.allowed_origins.is_empty() {
        errors.push(ValidationError::new(
            "cors.allowed_origins",
            "must list at least one origin (use \"*\" for any)",
        ));
    }
    for origin in &config.cors.allowed_origins {
        if origin != "*" && axum::http::HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                format!("{origin:?} is not a valid origin"),
            ));
        }
    }

    let forms = &config.forms;
    if forms.reservation_max_party < 1 {
        errors.push(ValidationError::new("forms.reservation_max_party", "must be at least 1"));
    }
    check_range(
        "forms.private_event_guests",
        forms.private_event_min_guests,
        forms.private_event_max_guests,
        &mut errors,
    );
    check_range(
        "forms.banquet_guests",
        forms.banquet_min_guests,
        forms.banquet_max_guests,
        &mut errors,
    );
    check_range(
        "forms.contact_message",
        forms.contact_message_min as i64,
        forms.contact_message_max as i64,
        &mut errors,
    );

    if config.uploads.max_resume_bytes == 0 {
        errors.push(ValidationError::new("uploads.max_resume_bytes", "must be positive"));
    }
    if config.uploads.allowed_mime_types.is_empty() {
        errors.push(ValidationError::new(
            "uploads.allowed_mime_types",
            "must list at least one type",
        ));
    }
    if config.security.max_body_size < config.uploads.max_resume_bytes {
        errors.push(ValidationError::new(
            "security.max_body_size",
            "must be at least uploads.max_resume_bytes",
        ));
    }

    if config.notifications.provider == NotificationProvider::Http {
        if config.notifications.api_key.is_empty() {
            errors.push(ValidationError::new(
                "notifications.api_key",
                "required when provider is \"http\"",
            ));
        }
        if url::Url::parse(&config.notifications.api_url).is_err() {
            errors.push(ValidationError::new("notifications.api_url", "must be a URL"));
        }
    }

    if config.admin.enabled {
        if config.admin.users.is_empty() {
            errors.push(ValidationError::new(
                "admin.users",
                "at least one user is required when admin is enabled",
            ));
        }
        for (i, user) in config.admin.users.iter().enumerate() {
            if user.token.len() < 16 {
                errors.push(ValidationError::new(
                    format!("admin.users[{i}].token"),
                    "must be at least 16 characters",
                ));
            }
        }
    }

    if config.events.max_limit == 0 || config.events.default_limit > config.events.max_limit {
        errors.push(ValidationError::new(
            "events.default_limit",
            "must be between 1 and events.max_limit",
        ));
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            "must be \"pretty\" or \"json\"",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
