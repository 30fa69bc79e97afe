//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and the database URL
//! - Validate value ranges (limits and timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("database.url: {0}")]
    InvalidDatabaseUrl(String),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("observability.log_level: unknown level '{0}'")]
    UnknownLogLevel(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(
        &mut errors,
        "listener.bind_address",
        &config.listener.bind_address,
    );
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    match url::Url::parse(&config.database.url) {
        Ok(parsed) if matches!(parsed.scheme(), "postgres" | "postgresql") => {}
        Ok(parsed) => errors.push(ValidationError::InvalidDatabaseUrl(format!(
            "unsupported scheme '{}'",
            parsed.scheme()
        ))),
        Err(e) => errors.push(ValidationError::InvalidDatabaseUrl(e.to_string())),
    }

    let positives = [
        ("listener.max_connections", config.listener.max_connections as u64),
        ("listener.max_body_bytes", config.listener.max_body_bytes as u64),
        ("database.max_connections", u64::from(config.database.max_connections)),
        ("database.connect_timeout_secs", config.database.connect_timeout_secs),
        ("database.probe_timeout_secs", config.database.probe_timeout_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.shutdown_secs", config.timeouts.shutdown_secs),
        ("timeouts.store_close_secs", config.timeouts.store_close_secs),
    ];
    for (field, value) in positives {
        if value == 0 {
            errors.push(ValidationError::NotPositive(field));
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
