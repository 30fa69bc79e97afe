//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::Span;

use loyalty::config::{AppConfig, DatabaseConfig};
use loyalty::lifecycle::{App, LifecycleError, LifecycleState};
use loyalty::store::{
    ConfigEntry, ConfigEntryDraft, ConfigEntryId, ConfigRepository, InMemoryConfigRepository,
    RepositoryError, RepositoryResult, StoreConnector,
};

/// Config bound to an ephemeral loopback port.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.timeouts.store_close_secs = 1;
    config
}

/// Connector that always hands out the same repository.
pub struct FixedConnector(pub Arc<dyn ConfigRepository>);

#[async_trait]
impl StoreConnector for FixedConnector {
    async fn connect(&self, _config: &DatabaseConfig) -> RepositoryResult<Arc<dyn ConfigRepository>> {
        Ok(Arc::clone(&self.0))
    }
}

/// Connector simulating an unreachable database.
pub struct UnreachableConnector;

#[async_trait]
impl StoreConnector for UnreachableConnector {
    async fn connect(&self, _config: &DatabaseConfig) -> RepositoryResult<Arc<dyn ConfigRepository>> {
        Err(RepositoryError::Closed)
    }
}

/// Connector that takes `delay` to open the store.
pub struct SlowConnector {
    pub repository: Arc<InMemoryConfigRepository>,
    pub delay: Duration,
}

#[async_trait]
impl StoreConnector for SlowConnector {
    async fn connect(&self, _config: &DatabaseConfig) -> RepositoryResult<Arc<dyn ConfigRepository>> {
        tokio::time::sleep(self.delay).await;
        let repository: Arc<dyn ConfigRepository> = self.repository.clone();
        Ok(repository)
    }
}

/// In-memory repository whose reads take `delay` to answer.
pub struct SlowRepository {
    pub inner: Arc<InMemoryConfigRepository>,
    pub delay: Duration,
}

#[async_trait]
impl ConfigRepository for SlowRepository {
    async fn create(&self, draft: ConfigEntryDraft) -> RepositoryResult<ConfigEntry> {
        self.inner.create(draft).await
    }

    async fn get_by_id(&self, id: ConfigEntryId) -> RepositoryResult<ConfigEntry> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_by_id(id).await
    }

    async fn update(&self, id: ConfigEntryId, draft: ConfigEntryDraft) -> RepositoryResult<ConfigEntry> {
        self.inner.update(id, draft).await
    }

    async fn delete(&self, id: ConfigEntryId) -> RepositoryResult<()> {
        self.inner.delete(id).await
    }

    async fn list(&self) -> RepositoryResult<Vec<ConfigEntry>> {
        tokio::time::sleep(self.delay).await;
        self.inner.list().await
    }

    async fn ping(&self) -> RepositoryResult<()> {
        self.inner.ping().await
    }

    async fn close(&self) {
        self.inner.close().await
    }
}

/// A running [`App`] plus the task driving `run`.
pub struct TestApp {
    pub app: Arc<App>,
    pub base_url: String,
    pub runner: JoinHandle<Result<(), LifecycleError>>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Start an app over `repository` and wait until it is accepting connections.
pub async fn spawn_app(repository: Arc<dyn ConfigRepository>) -> TestApp {
    let app = Arc::new(App::new(
        test_config(),
        Arc::new(FixedConnector(repository)),
        Span::none(),
    ));

    let runner = tokio::spawn({
        let app = Arc::clone(&app);
        async move { app.run().await }
    });

    let state = tokio::time::timeout(Duration::from_secs(5), app.wait_until_running())
        .await
        .expect("app did not start in time");
    assert_eq!(state, LifecycleState::Running);

    let addr = app.local_addr().expect("running app has an address");
    TestApp {
        app,
        base_url: format!("http://{addr}"),
        runner,
    }
}

pub fn sample_entry() -> serde_json::Value {
    serde_json::json!({
        "config_name": "Testing",
        "status": "active",
        "value": "TestingValue",
        "description": "Description"
    })
}
