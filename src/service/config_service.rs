//! Configuration entry service: request validation and error translation.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn, Instrument, Span};

use crate::store::{ConfigEntry, ConfigEntryDraft, ConfigEntryId, ConfigRepository, RepositoryError};

/// Transport-shaped payload for create and update.
///
/// Every field is optional at this level so missing values surface as
/// [`ServiceError::Validation`] rather than as a body-parsing failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigEntryRequest {
    pub config_name: Option<String>,
    pub status: Option<String>,
    pub value: Option<String>,
    pub description: Option<String>,
}

/// Service-level errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input was rejected before touching storage.
    #[error("{0}")]
    Validation(String),

    /// No live entry has the given identifier.
    #[error("server config {0} not found")]
    NotFound(ConfigEntryId),

    /// The store failed or rejected the operation.
    #[error("internal error: {0}")]
    Internal(#[source] RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::NotFound(id),
            other => Self::Internal(other),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Stateless facade over a [`ConfigRepository`].
///
/// Each operation validates its input and issues at most one repository call.
#[derive(Clone)]
pub struct ConfigService {
    repository: Arc<dyn ConfigRepository>,
    span: Span,
}

impl ConfigService {
    /// Creates a service logging under `span`.
    pub fn new(repository: Arc<dyn ConfigRepository>, span: Span) -> Self {
        Self { repository, span }
    }

    pub async fn create(&self, request: ConfigEntryRequest) -> ServiceResult<ConfigEntry> {
        let span = tracing::info_span!(parent: &self.span, "create_config");
        async {
            let draft = validate_request(request)?;
            let entry = self.repository.create(draft).await.inspect_err(log_failure)?;
            info!(id = %entry.id, name = %entry.name, "Server config created");
            Ok::<_, ServiceError>(entry)
        }
        .instrument(span)
        .await
    }

    pub async fn get(&self, id: &str) -> ServiceResult<ConfigEntry> {
        let span = tracing::debug_span!(parent: &self.span, "get_config", id = %id);
        async {
            let id = parse_id(id)?;
            let entry = self.repository.get_by_id(id).await.inspect_err(log_failure)?;
            debug!("Server config retrieved");
            Ok::<_, ServiceError>(entry)
        }
        .instrument(span)
        .await
    }

    pub async fn update(&self, id: &str, request: ConfigEntryRequest) -> ServiceResult<ConfigEntry> {
        let span = tracing::info_span!(parent: &self.span, "update_config", id = %id);
        async {
            let id = parse_id(id)?;
            let draft = validate_request(request)?;
            let entry = self
                .repository
                .update(id, draft)
                .await
                .inspect_err(log_failure)?;
            info!(updated_at = %entry.updated_at, "Server config updated");
            Ok::<_, ServiceError>(entry)
        }
        .instrument(span)
        .await
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let span = tracing::info_span!(parent: &self.span, "delete_config", id = %id);
        async {
            let id = parse_id(id)?;
            self.repository.delete(id).await.inspect_err(log_failure)?;
            info!("Server config deleted");
            Ok::<_, ServiceError>(())
        }
        .instrument(span)
        .await
    }

    pub async fn list(&self) -> ServiceResult<Vec<ConfigEntry>> {
        let span = tracing::debug_span!(parent: &self.span, "list_configs");
        async {
            let entries = self.repository.list().await.inspect_err(log_failure)?;
            debug!(count = entries.len(), "Server configs listed");
            Ok::<_, ServiceError>(entries)
        }
        .instrument(span)
        .await
    }
}

fn log_failure(err: &RepositoryError) {
    match err {
        RepositoryError::NotFound(_) => debug!(error = %err, "Server config not found"),
        _ => warn!(error = %err, "Repository operation failed"),
    }
}

fn parse_id(raw: &str) -> ServiceResult<ConfigEntryId> {
    raw.trim()
        .parse()
        .map_err(|_| ServiceError::Validation("invalid ID format".to_string()))
}

fn validate_request(request: ConfigEntryRequest) -> ServiceResult<ConfigEntryDraft> {
    let name = required_text(request.config_name, "config_name")?;
    let status = required_text(request.status, "status")?;
    let value = request
        .value
        .ok_or_else(|| ServiceError::Validation("value is required".to_string()))?;

    Ok(ConfigEntryDraft {
        name,
        status,
        value,
        description: request.description,
    })
}

fn required_text(field: Option<String>, name: &str) -> ServiceResult<String> {
    match field {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err(ServiceError::Validation(format!("{name} must not be blank"))),
        None => Err(ServiceError::Validation(format!("{name} is required"))),
    }
}
