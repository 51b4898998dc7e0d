//! In-memory storage backend.
//!
//! Keeps objects in a map guarded by an async lock. Useful as a test double
//! for the disk and object-store backends, and for ephemeral media that
//! never needs to survive a restart.

use crate::{StorageBackend, StorageResult, validate_object_path};
use medialib_error::{StorageError, StorageErrorKind};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory storage backend.
pub struct MemoryBackend {
    name: String,
    base_url: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the backend holds no objects.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        validate_object_path(path)?;
        self.objects
            .write()
            .await
            .insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn get(&self, path: &str) -> StorageResult<Vec<u8>> {
        validate_object_path(path)?;
        self.objects
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotFound(path.to_string())))
    }

    async fn has(&self, path: &str) -> StorageResult<bool> {
        validate_object_path(path)?;
        Ok(self.objects.read().await.contains_key(path))
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        validate_object_path(path)?;
        self.objects.write().await.remove(path);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> StorageResult<()> {
        validate_object_path(prefix)?;
        let prefix = format!("{}/", prefix.trim_end_matches('/'));
        self.objects
            .write()
            .await
            .retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
