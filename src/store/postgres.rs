//! PostgreSQL configuration entry repository.
//!
//! Expects the `server_configs` table described in
//! `schema/server_configs.sql`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::store::{
    ConfigEntry, ConfigEntryDraft, ConfigEntryId, ConfigRepository, RepositoryError,
    RepositoryResult, StoreConnector,
};

const COLUMNS: &str =
    "id, config_name, status, value, description, created_at, updated_at, deleted_at";

#[derive(Debug, FromRow)]
struct ConfigEntryRow {
    id: Uuid,
    config_name: String,
    status: String,
    value: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ConfigEntryRow> for ConfigEntry {
    fn from(row: ConfigEntryRow) -> Self {
        Self {
            id: ConfigEntryId::from_uuid(row.id),
            name: row.config_name,
            status: row.status,
            value: row.value,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// PostgreSQL implementation of [`ConfigRepository`].
pub struct PostgresConfigRepository {
    pool: PgPool,
}

impl PostgresConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the pool reference
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ConfigRepository for PostgresConfigRepository {
    async fn create(&self, draft: ConfigEntryDraft) -> RepositoryResult<ConfigEntry> {
        // One statement, so CURRENT_TIMESTAMP is identical for both columns.
        let query = format!(
            "INSERT INTO server_configs (config_name, status, value, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP) \
             RETURNING {COLUMNS}"
        );

        let row: ConfigEntryRow = sqlx::query_as(&query)
            .bind(&draft.name)
            .bind(&draft.status)
            .bind(&draft.value)
            .bind(&draft.description)
            .fetch_one(&self.pool)
            .await?;

        debug!(id = %row.id, "Inserted config entry");
        Ok(row.into())
    }

    async fn get_by_id(&self, id: ConfigEntryId) -> RepositoryResult<ConfigEntry> {
        let query =
            format!("SELECT {COLUMNS} FROM server_configs WHERE id = $1 AND deleted_at IS NULL");

        let row: Option<ConfigEntryRow> = sqlx::query_as(&query)
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound(id))
    }

    async fn update(
        &self,
        id: ConfigEntryId,
        draft: ConfigEntryDraft,
    ) -> RepositoryResult<ConfigEntry> {
        let query = format!(
            "UPDATE server_configs \
             SET config_name = $2, status = $3, value = $4, description = $5, \
                 updated_at = GREATEST(CURRENT_TIMESTAMP, updated_at) \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );

        let row: Option<ConfigEntryRow> = sqlx::query_as(&query)
            .bind(id.into_inner())
            .bind(&draft.name)
            .bind(&draft.status)
            .bind(&draft.value)
            .bind(&draft.description)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound(id))
    }

    async fn delete(&self, id: ConfigEntryId) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE server_configs SET deleted_at = GREATEST(CURRENT_TIMESTAMP, updated_at) \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.into_inner())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    async fn list(&self) -> RepositoryResult<Vec<ConfigEntry>> {
        let query = format!(
            "SELECT {COLUMNS} FROM server_configs WHERE deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC"
        );

        let rows: Vec<ConfigEntryRow> = sqlx::query_as(&query).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }
}

/// Opens a [`PostgresConfigRepository`] backed by a connection pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresConnector;

#[async_trait]
impl StoreConnector for PostgresConnector {
    async fn connect(&self, config: &DatabaseConfig) -> RepositoryResult<Arc<dyn ConfigRepository>> {
        // `connect` (not `connect_lazy`) so an unreachable database fails startup.
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await?;

        info!(
            url = %config.redacted_url(),
            max_connections = config.max_connections,
            "PostgreSQL pool connected"
        );

        let repository: Arc<dyn ConfigRepository> = Arc::new(PostgresConfigRepository::new(pool));
        Ok(repository)
    }
}
