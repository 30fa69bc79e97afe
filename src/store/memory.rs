//! In-memory configuration entry repository.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::config::DatabaseConfig;
use crate::store::{
    ConfigEntry, ConfigEntryDraft, ConfigEntryId, ConfigRepository, RepositoryError,
    RepositoryResult, StoreConnector,
};

#[derive(Debug, Clone)]
struct StoredEntry {
    entry: ConfigEntry,
    /// Insertion sequence; breaks ties between equal `created_at` values.
    seq: u64,
}

/// Thread-safe in-memory repository with the same live/soft-delete
/// semantics as the PostgreSQL one.
#[derive(Debug, Default)]
pub struct InMemoryConfigRepository {
    entries: DashMap<ConfigEntryId, StoredEntry>,
    next_seq: AtomicU64,
    closed: AtomicBool,
}

impl InMemoryConfigRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [`ConfigRepository::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of stored rows, soft-deleted ones included.
    pub fn row_count(&self) -> usize {
        self.entries.len()
    }

    fn ensure_open(&self) -> RepositoryResult<()> {
        if self.is_closed() {
            Err(RepositoryError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConfigRepository for InMemoryConfigRepository {
    async fn create(&self, draft: ConfigEntryDraft) -> RepositoryResult<ConfigEntry> {
        self.ensure_open()?;

        let now = Utc::now();
        let entry = ConfigEntry {
            id: ConfigEntryId::new(),
            name: draft.name,
            status: draft.status,
            value: draft.value,
            description: draft.description,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.entries.insert(
            entry.id,
            StoredEntry {
                entry: entry.clone(),
                seq,
            },
        );
        Ok(entry)
    }

    async fn get_by_id(&self, id: ConfigEntryId) -> RepositoryResult<ConfigEntry> {
        self.ensure_open()?;

        self.entries
            .get(&id)
            .map(|stored| stored.entry.clone())
            .filter(ConfigEntry::is_live)
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn update(
        &self,
        id: ConfigEntryId,
        draft: ConfigEntryDraft,
    ) -> RepositoryResult<ConfigEntry> {
        self.ensure_open()?;

        let mut stored = self
            .entries
            .get_mut(&id)
            .filter(|stored| stored.entry.is_live())
            .ok_or(RepositoryError::NotFound(id))?;

        let entry = &mut stored.entry;
        entry.apply(draft);
        entry.updated_at = Utc::now().max(entry.updated_at);
        Ok(entry.clone())
    }

    async fn delete(&self, id: ConfigEntryId) -> RepositoryResult<()> {
        self.ensure_open()?;

        let mut stored = self
            .entries
            .get_mut(&id)
            .filter(|stored| stored.entry.is_live())
            .ok_or(RepositoryError::NotFound(id))?;

        let entry = &mut stored.entry;
        entry.deleted_at = Some(Utc::now().max(entry.updated_at));
        Ok(())
    }

    async fn list(&self) -> RepositoryResult<Vec<ConfigEntry>> {
        self.ensure_open()?;

        let mut live: Vec<StoredEntry> = self
            .entries
            .iter()
            .filter(|stored| stored.entry.is_live())
            .map(|stored| stored.value().clone())
            .collect();
        live.sort_by(|a, b| {
            b.entry
                .created_at
                .cmp(&a.entry.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(live.into_iter().map(|stored| stored.entry).collect())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        self.ensure_open()
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Connector handing out a shared in-memory repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnector {
    repository: Arc<InMemoryConfigRepository>,
}

impl InMemoryConnector {
    pub fn new(repository: Arc<InMemoryConfigRepository>) -> Self {
        Self { repository }
    }

    /// The repository every `connect` call returns.
    pub fn repository(&self) -> Arc<InMemoryConfigRepository> {
        Arc::clone(&self.repository)
    }
}

#[async_trait]
impl StoreConnector for InMemoryConnector {
    async fn connect(&self, _config: &DatabaseConfig) -> RepositoryResult<Arc<dyn ConfigRepository>> {
        self.repository.ensure_open()?;
        let repository: Arc<dyn ConfigRepository> = self.repository.clone();
        Ok(repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> ConfigEntryDraft {
        ConfigEntryDraft {
            name: name.to_string(),
            status: "active".to_string(),
            value: format!("{name}Value"),
            description: Some("Description".to_string()),
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let repo = InMemoryConfigRepository::new();
        let created = repo.create(draft("Testing")).await.unwrap();

        assert_eq!(created.created_at, created.updated_at);
        assert!(created.is_live());

        let fetched = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Testing");
        assert_eq!(fetched.value, "TestingValue");
        assert_eq!(fetched.description.as_deref(), Some("Description"));
    }

    #[tokio::test]
    async fn update_preserves_identity_and_advances_updated_at() {
        let repo = InMemoryConfigRepository::new();
        let created = repo.create(draft("first")).await.unwrap();

        let updated = repo
            .update(
                created.id,
                ConfigEntryDraft {
                    status: "inactive".to_string(),
                    description: None,
                    ..draft("second")
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.name, "second");
        assert_eq!(updated.status, "inactive");
        assert_eq!(updated.description, None);
        assert_eq!(repo.get_by_id(created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn soft_delete_is_final() {
        let repo = InMemoryConfigRepository::new();
        let created = repo.create(draft("doomed")).await.unwrap();

        repo.delete(created.id).await.unwrap();

        assert!(matches!(
            repo.get_by_id(created.id).await,
            Err(RepositoryError::NotFound(id)) if id == created.id
        ));
        assert!(matches!(
            repo.delete(created.id).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(
            repo.update(created.id, draft("revived")).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(repo.list().await.unwrap().is_empty());
        assert_eq!(repo.row_count(), 1, "rows are never physically removed");
    }

    #[tokio::test]
    async fn deleted_at_is_not_before_updated_at() {
        let repo = InMemoryConfigRepository::new();
        let created = repo.create(draft("stamped")).await.unwrap();
        repo.delete(created.id).await.unwrap();

        let stored = repo.entries.get(&created.id).unwrap().entry.clone();
        let deleted_at = stored.deleted_at.unwrap();
        assert!(deleted_at >= stored.updated_at);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_live_only() {
        let repo = InMemoryConfigRepository::new();
        let a = repo.create(draft("a")).await.unwrap();
        let b = repo.create(draft("b")).await.unwrap();
        let c = repo.create(draft("c")).await.unwrap();
        repo.delete(b.id).await.unwrap();

        let listed = repo.list().await.unwrap();
        let ids: Vec<_> = listed.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![c.id, a.id]);
        assert!(listed
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[tokio::test]
    async fn list_on_empty_store_is_empty() {
        let repo = InMemoryConfigRepository::new();
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let repo = InMemoryConfigRepository::new();
        let id = ConfigEntryId::new();

        assert!(matches!(repo.get_by_id(id).await, Err(RepositoryError::NotFound(_))));
        assert!(matches!(repo.update(id, draft("x")).await, Err(RepositoryError::NotFound(_))));
        assert!(matches!(repo.delete(id).await, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn closed_store_rejects_everything() {
        let repo = InMemoryConfigRepository::new();
        repo.close().await;

        assert!(repo.is_closed());
        assert!(matches!(repo.ping().await, Err(RepositoryError::Closed)));
        assert!(matches!(repo.create(draft("late")).await, Err(RepositoryError::Closed)));
        assert!(matches!(repo.list().await, Err(RepositoryError::Closed)));
    }

    #[tokio::test]
    async fn connector_shares_one_repository() {
        let connector = InMemoryConnector::default();
        let repo = connector.connect(&DatabaseConfig::default()).await.unwrap();
        repo.create(draft("shared")).await.unwrap();

        assert_eq!(connector.repository().row_count(), 1);
    }
}
