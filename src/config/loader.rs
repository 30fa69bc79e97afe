//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `database.url`.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
/// Environment variable overriding the port of `listener.bind_address`.
pub const ENV_PORT: &str = "PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {name}: '{value}'")]
    Env { name: &'static str, value: String },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply process environment
/// overrides and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            parse_config(&content)?
        }
        None => AppConfig::default(),
    };

    let config = apply_env_overrides(config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse a TOML document; missing sections and fields take their defaults.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Apply `DATABASE_URL` and `PORT` overrides read through `lookup`.
pub fn apply_env_overrides<F>(mut config: AppConfig, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_DATABASE_URL).filter(|v| !v.is_empty()) {
        config.database.url = url;
    }

    if let Some(port) = lookup(ENV_PORT).filter(|v| !v.is_empty()) {
        let port: u16 = port.parse().map_err(|_| ConfigError::Env {
            name: ENV_PORT,
            value: port.clone(),
        })?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{host}:{port}");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;

    #[test]
    fn partial_document_keeps_defaults() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.listener.max_connections, 1_024);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.timeouts.shutdown_secs, 15);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = parse_config("[listener\nbind_address = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_database_url_and_port() {
        let config = apply_env_overrides(AppConfig::default(), |name| match name {
            ENV_DATABASE_URL => Some("postgres://db:5432/other".to_string()),
            ENV_PORT => Some("3000".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.database.url, "postgres://db:5432/other");
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let err = apply_env_overrides(AppConfig::default(), |name| {
            (name == ENV_PORT).then(|| "http".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Env { name: ENV_PORT, .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config(Some(Path::new("/nonexistent/loyalty.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
