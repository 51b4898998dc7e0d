//! Record persistence boundary.
//!
//! The ORM layer of a host application is represented by the
//! [`MediaRepository`] trait; this crate only calls it and does not define
//! durability or transaction semantics. [`InMemoryRepository`] is the
//! bundled implementation for tests and embedded use.
//!
//! Cascade-on-record-delete is modeled with an explicit observer rather
//! than framework event magic: a repository configured with a
//! [`RecordRemovalObserver`] invokes it for every removed record, which is
//! where stored files get cleaned up.

use crate::MediaRecord;
use medialib_error::{MedialibResult, RepositoryError, RepositoryErrorKind};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Record persistence collaborator.
#[async_trait::async_trait]
pub trait MediaRepository: Send + Sync {
    /// Persist a new record.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if a record with the same id already exists.
    async fn create(&self, record: MediaRecord) -> MedialibResult<MediaRecord>;

    /// Look up a record by id.
    async fn find(&self, id: &Uuid) -> MedialibResult<Option<MediaRecord>>;

    /// Remove a record.
    ///
    /// Removing an absent record is success, so retried removals converge.
    async fn delete(&self, id: &Uuid) -> MedialibResult<()>;

    /// All stored records, in arbitrary order.
    async fn all(&self) -> MedialibResult<Vec<MediaRecord>>;
}

/// Observer invoked when a record is removed from a repository.
#[async_trait::async_trait]
pub trait RecordRemovalObserver: Send + Sync {
    /// Called with every removed record.
    async fn on_record_removed(&self, record: &MediaRecord) -> MedialibResult<()>;
}

/// In-memory record repository.
#[derive(Default)]
pub struct InMemoryRepository {
    records: RwLock<HashMap<Uuid, MediaRecord>>,
    observer: Option<Arc<dyn RecordRemovalObserver>>,
}

impl InMemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty repository that notifies `observer` on removals.
    pub fn with_observer(observer: Arc<dyn RecordRemovalObserver>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            observer: Some(observer),
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the repository holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl MediaRepository for InMemoryRepository {
    async fn create(&self, record: MediaRecord) -> MedialibResult<MediaRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(RepositoryError::new(RepositoryErrorKind::Conflict(
                record.id.to_string(),
            ))
            .into());
        }
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find(&self, id: &Uuid) -> MedialibResult<Option<MediaRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &Uuid) -> MedialibResult<()> {
        let removed = self.records.write().await.remove(id);
        if let (Some(record), Some(observer)) = (removed, self.observer.as_ref()) {
            observer.on_record_removed(&record).await?;
        }
        Ok(())
    }

    async fn all(&self) -> MedialibResult<Vec<MediaRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}

impl std::fmt::Debug for InMemoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}
