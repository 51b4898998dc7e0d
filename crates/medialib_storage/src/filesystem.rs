//! Filesystem storage backend.
//!
//! Stores objects as files under a configured root directory, mirroring the
//! object path as a relative file path. Writes are atomic (temp file +
//! rename) so a concurrent reader never observes a half-written object.

use crate::{StorageBackend, StorageResult, validate_object_path};
use medialib_error::{StorageError, StorageErrorKind};
use std::path::PathBuf;

/// Local filesystem storage backend.
///
/// Object path `{id}/test.jpg` maps to `{root}/{id}/test.jpg` on disk.
/// Public URLs are rendered from a configured base URL, e.g. the route a
/// web server exposes the root directory under.
pub struct FilesystemBackend {
    name: String,
    root: PathBuf,
    base_url: String,
}

impl FilesystemBackend {
    /// Create a new filesystem backend rooted at `root`.
    ///
    /// Creates the root directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or accessed.
    #[tracing::instrument(skip_all)]
    pub fn new(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        base_url: impl Into<String>,
    ) -> StorageResult<Self> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;

        tracing::info!(path = %root.display(), "Created filesystem backend");
        Ok(Self {
            name: name.into(),
            root,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Resolve an object path to its on-disk location.
    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        validate_object_path(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait::async_trait]
impl StorageBackend for FilesystemBackend {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(skip(self, data), fields(backend = %self.name, size = data.len()))]
    async fn put(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let target = self.resolve(path)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        // Write to temp file first, then rename for atomicity
        let temp = target.with_extension("tmp");
        tokio::fs::write(&temp, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::Write(format!("{}: {}", temp.display(), e)))
        })?;

        tokio::fs::rename(&temp, &target).await.map_err(|e| {
            StorageError::new(StorageErrorKind::Write(format!(
                "rename {} to {}: {}",
                temp.display(),
                target.display(),
                e
            )))
        })?;

        tracing::debug!(path = %target.display(), size = data.len(), "Stored object");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(backend = %self.name))]
    async fn get(&self, path: &str) -> StorageResult<Vec<u8>> {
        let target = self.resolve(path)?;

        tokio::fs::read(&target).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(path.to_string()))
            } else {
                StorageError::new(StorageErrorKind::Read(format!(
                    "{}: {}",
                    target.display(),
                    e
                )))
            }
        })
    }

    async fn has(&self, path: &str) -> StorageResult<bool> {
        let target = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&target).await.unwrap_or(false))
    }

    #[tracing::instrument(skip(self), fields(backend = %self.name))]
    async fn delete(&self, path: &str) -> StorageResult<()> {
        let target = self.resolve(path)?;

        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                tracing::debug!(path = %target.display(), "Deleted object");
                Ok(())
            }
            // Absent object: the end state already holds
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::new(StorageErrorKind::Delete(format!(
                "{}: {}",
                target.display(),
                e
            )))),
        }
    }

    #[tracing::instrument(skip(self), fields(backend = %self.name))]
    async fn delete_prefix(&self, prefix: &str) -> StorageResult<()> {
        let target = self.resolve(prefix)?;

        match tokio::fs::remove_dir_all(&target).await {
            Ok(()) => {
                tracing::debug!(path = %target.display(), "Deleted object directory");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::new(StorageErrorKind::Delete(format!(
                "{}: {}",
                target.display(),
                e
            )))),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl std::fmt::Debug for FilesystemBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesystemBackend")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("base_url", &self.base_url)
            .finish()
    }
}
