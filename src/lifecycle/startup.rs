//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the configuration store through a [`StoreConnector`]
//! - Wire the service, health reporter and router on top of it
//!
//! # Design Decisions
//! - Fail fast: a store that cannot be opened is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener is bound by the controller only after the store is ready

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tracing::{error, info, info_span, Span};

use crate::config::{AppConfig, DatabaseConfig};
use crate::health::HealthReporter;
use crate::http::{build_router, AppState, RequestTracker};
use crate::service::ConfigService;
use crate::store::{ConfigRepository, RepositoryResult, StoreConnector};

/// Open the configuration store.
pub async fn open_store(
    connector: &dyn StoreConnector,
    config: &DatabaseConfig,
) -> RepositoryResult<Arc<dyn ConfigRepository>> {
    info!(url = %config.redacted_url(), "Opening configuration store");

    match connector.connect(config).await {
        Ok(repository) => {
            info!("Configuration store ready");
            Ok(repository)
        }
        Err(err) => {
            error!(url = %config.redacted_url(), error = %err, "Configuration store unreachable");
            Err(err)
        }
    }
}

/// Build the service layer and HTTP router over an open store.
pub fn build_app_router(
    config: &AppConfig,
    repository: Arc<dyn ConfigRepository>,
    parent: &Span,
    tracker: RequestTracker,
) -> Router {
    let service = ConfigService::new(
        Arc::clone(&repository),
        info_span!(parent: parent, "config_service"),
    );
    let health = HealthReporter::new(
        repository,
        Duration::from_secs(config.database.probe_timeout_secs),
    );

    build_router(config, AppState::new(service, health), tracker)
}
