//! Media lifecycle orchestration.
//!
//! [`MediaManager`] ties the path resolver, conversion registry, backend
//! registry, and record repository together, and owns the lifecycle
//! invariant: a media record exists exactly when all of its files are
//! stored. Creation is all-or-nothing: a failed conversion rolls back
//! everything written for the record before the error surfaces.
//! Deletion removes every file before the record goes away.

use crate::{
    ConversionRegistry, MediaConversion, MediaRecord, MediaRepository, PathResolver,
    RecordRemovalObserver,
};
use chrono::Utc;
use medialib_error::{
    ConversionError, ConversionErrorKind, ManagerError, ManagerErrorKind, MedialibResult,
    StorageError, StorageErrorKind,
};
use medialib_storage::{BackendRegistry, StorageBackend};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Fallback extension for originals without one.
const DEFAULT_EXTENSION: &str = "bin";

/// Options for [`MediaManager::add_media`].
#[derive(Debug, Clone, Default)]
pub struct AddMediaOptions {
    /// Keep the source file when adding from a path. By default the
    /// source is consumed: removed after a successful import.
    pub preserve_original: bool,
    /// MIME type recorded on the media record, if known.
    pub mime_type: Option<String>,
}

impl AddMediaOptions {
    /// Options with defaults: source consumed, no MIME type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the source file after a successful import.
    pub fn preserving_original(mut self) -> Self {
        self.preserve_original = true;
        self
    }

    /// Record a MIME type on the created record.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Coordinates storage backends, conversions, and record persistence.
pub struct MediaManager {
    backends: Arc<BackendRegistry>,
    conversions: Arc<ConversionRegistry>,
    repository: Arc<dyn MediaRepository>,
}

impl MediaManager {
    /// Create a manager over the given collaborators.
    pub fn new(
        backends: Arc<BackendRegistry>,
        conversions: Arc<ConversionRegistry>,
        repository: Arc<dyn MediaRepository>,
    ) -> Self {
        Self {
            backends,
            conversions,
            repository,
        }
    }

    /// The record repository this manager persists to.
    pub fn repository(&self) -> &Arc<dyn MediaRepository> {
        &self.repository
    }

    fn backend(&self, name: &str) -> MedialibResult<Arc<dyn StorageBackend>> {
        self.backends.get(name).ok_or_else(|| {
            ManagerError::new(ManagerErrorKind::UnknownBackend(name.to_string())).into()
        })
    }

    /// Add media from a byte slice.
    ///
    /// Writes the original, derives and writes every conversion registered
    /// for the collection, then persists a [`MediaRecord`]. On success all
    /// referenced files are durably present on the named backend.
    ///
    /// # Errors
    ///
    /// - A failed original write aborts immediately: no record, no
    ///   conversion attempted.
    /// - A failed derivation or conversion write rolls back everything
    ///   written under the record's prefix and surfaces `AddAborted`.
    /// - `UnknownBackend` if no backend is registered under the name.
    #[tracing::instrument(skip(self, data, options), fields(size = data.len()))]
    pub async fn add_media(
        &self,
        data: &[u8],
        file_name: &str,
        collection_name: &str,
        backend_name: &str,
        options: &AddMediaOptions,
    ) -> MedialibResult<MediaRecord> {
        let backend = self.backend(backend_name)?;
        let id = Uuid::new_v4();
        let original_path = PathResolver::original_path(&id, file_name);

        // Fail fast: no record and no conversions if the original write fails.
        backend.put(&original_path, data).await?;

        let default_extension =
            PathResolver::extension_of(file_name).unwrap_or(DEFAULT_EXTENSION);
        let mut stored = Vec::new();

        for conversion in self.conversions.conversions_for(collection_name) {
            let derived = match conversion.derive(data) {
                Ok(derived) => derived,
                Err(e) => return Err(self.abort_add(&backend, &id, e).await),
            };

            let extension = conversion.extension().unwrap_or(default_extension);
            let path = PathResolver::conversion_path(&id, conversion.name(), extension);
            if let Err(e) = backend.put(&path, &derived).await {
                return Err(self.abort_add(&backend, &id, e).await);
            }

            stored.push(MediaConversion {
                name: conversion.name().to_string(),
                extension: extension.to_string(),
            });
        }

        let record = MediaRecord {
            id,
            collection_name: collection_name.to_string(),
            file_name: file_name.to_string(),
            backend_name: backend_name.to_string(),
            conversions: stored,
            mime_type: options.mime_type.clone(),
            size_bytes: data.len() as i64,
            content_hash: hex::encode(Sha256::digest(data)),
            created_at: Utc::now(),
        };

        let record = self.repository.create(record).await?;
        debug!(id = %record.id, conversions = record.conversions.len(), "Added media");
        Ok(record)
    }

    /// Add media from a source file.
    ///
    /// The file's base name becomes the record's file name. Unless
    /// `options.preserve_original` is set, the source file is removed
    /// after a successful import.
    ///
    /// # Errors
    ///
    /// As [`add_media`](Self::add_media), plus a `Read` error if the
    /// source cannot be read.
    pub async fn add_media_from_file(
        &self,
        source: impl AsRef<Path>,
        collection_name: &str,
        backend_name: &str,
        options: &AddMediaOptions,
    ) -> MedialibResult<MediaRecord> {
        let source = source.as_ref();
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                StorageError::new(StorageErrorKind::InvalidPath(
                    source.display().to_string(),
                ))
            })?
            .to_string();

        let data = tokio::fs::read(source).await.map_err(|e| {
            StorageError::new(StorageErrorKind::Read(format!(
                "{}: {}",
                source.display(),
                e
            )))
        })?;

        let record = self
            .add_media(&data, &file_name, collection_name, backend_name, options)
            .await?;

        if !options.preserve_original {
            // The import succeeded; removing the consumed source is
            // best-effort cleanup.
            if let Err(e) = tokio::fs::remove_file(source).await {
                warn!(path = %source.display(), error = %e, "Failed to remove consumed source file");
            }
        }

        Ok(record)
    }

    /// Roll back a partially-written add and wrap the cause.
    async fn abort_add(
        &self,
        backend: &Arc<dyn StorageBackend>,
        id: &Uuid,
        cause: impl std::fmt::Display,
    ) -> medialib_error::MedialibError {
        if let Err(e) = backend.delete_prefix(&PathResolver::prefix(id)).await {
            warn!(id = %id, error = %e, "Rollback of aborted add left files behind");
        }
        ManagerError::new(ManagerErrorKind::AddAborted(cause.to_string())).into()
    }

    /// Delete a record's files and then the record itself.
    ///
    /// Idempotent: already-absent files count as deleted, so a retried or
    /// duplicated delete converges to the same end state.
    ///
    /// # Errors
    ///
    /// Returns `DeletionFailed` if any file delete fails; the record is
    /// not removed until every deletion is confirmed.
    #[tracing::instrument(skip(self, record), fields(id = %record.id, backend = %record.backend_name))]
    pub async fn delete(&self, record: &MediaRecord) -> MedialibResult<()> {
        let backend = self.backend(&record.backend_name)?;
        remove_record_files(backend.as_ref(), record).await?;
        self.repository.delete(&record.id).await?;
        debug!(id = %record.id, "Deleted media");
        Ok(())
    }

    /// Public URL of the original file.
    ///
    /// Pure URL construction; no I/O beyond registry lookup.
    pub fn get_url(&self, record: &MediaRecord) -> MedialibResult<String> {
        let backend = self.backend(&record.backend_name)?;
        Ok(backend.public_url(&record.original_path()))
    }

    /// Public URL of a materialized conversion.
    ///
    /// # Errors
    ///
    /// `UnknownConversion` if the name was not materialized for the record.
    pub fn get_url_for_conversion(
        &self,
        record: &MediaRecord,
        conversion_name: &str,
    ) -> MedialibResult<String> {
        let backend = self.backend(&record.backend_name)?;
        let path = record.conversion_path(conversion_name).ok_or_else(|| {
            ConversionError::new(ConversionErrorKind::UnknownConversion(
                conversion_name.to_string(),
            ))
        })?;
        Ok(backend.public_url(&path))
    }

    /// Read back the original's bytes, verifying them against the
    /// record's content hash.
    ///
    /// # Errors
    ///
    /// `Read` if the stored bytes no longer match the recorded hash.
    pub async fn get(&self, record: &MediaRecord) -> MedialibResult<Vec<u8>> {
        let backend = self.backend(&record.backend_name)?;
        let data = backend.get(&record.original_path()).await?;

        let actual = hex::encode(Sha256::digest(&data));
        if actual != record.content_hash {
            return Err(StorageError::new(StorageErrorKind::Read(format!(
                "content hash mismatch for {}: expected {}, got {}",
                record.original_path(),
                record.content_hash,
                actual
            )))
            .into());
        }
        Ok(data)
    }

    /// Read back a conversion's bytes.
    ///
    /// # Errors
    ///
    /// `UnknownConversion` if the name was not materialized for the record.
    pub async fn get_conversion(
        &self,
        record: &MediaRecord,
        conversion_name: &str,
    ) -> MedialibResult<Vec<u8>> {
        let backend = self.backend(&record.backend_name)?;
        let path = record.conversion_path(conversion_name).ok_or_else(|| {
            ConversionError::new(ConversionErrorKind::UnknownConversion(
                conversion_name.to_string(),
            ))
        })?;
        Ok(backend.get(&path).await?)
    }

    /// Whether every file the record references is present on its backend.
    pub async fn verify(&self, record: &MediaRecord) -> MedialibResult<bool> {
        let backend = self.backend(&record.backend_name)?;
        for path in record.all_paths() {
            if !backend.has(&path).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl std::fmt::Debug for MediaManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaManager")
            .field("backends", &self.backends)
            .finish_non_exhaustive()
    }
}

/// Delete every file a record references, then its `{id}/` prefix for
/// backends with directory semantics.
async fn remove_record_files(
    backend: &dyn StorageBackend,
    record: &MediaRecord,
) -> MedialibResult<()> {
    for path in record.all_paths() {
        backend.delete(&path).await.map_err(|e| {
            ManagerError::new(ManagerErrorKind::DeletionFailed(e.to_string()))
        })?;
    }
    backend
        .delete_prefix(&PathResolver::prefix(&record.id))
        .await
        .map_err(|e| ManagerError::new(ManagerErrorKind::DeletionFailed(e.to_string())))?;
    Ok(())
}

/// Observer that removes a record's stored files when the record is
/// removed through the repository, keeping record existence and file
/// existence in lockstep even when deletion originates at the ORM side.
pub struct FileCleanupObserver {
    backends: Arc<BackendRegistry>,
}

impl FileCleanupObserver {
    /// Create an observer resolving backends from the given registry.
    pub fn new(backends: Arc<BackendRegistry>) -> Self {
        Self { backends }
    }
}

#[async_trait::async_trait]
impl RecordRemovalObserver for FileCleanupObserver {
    async fn on_record_removed(&self, record: &MediaRecord) -> MedialibResult<()> {
        let backend = self.backends.get(&record.backend_name).ok_or_else(|| {
            ManagerError::new(ManagerErrorKind::UnknownBackend(
                record.backend_name.clone(),
            ))
        })?;
        remove_record_files(backend.as_ref(), record).await
    }
}

impl std::fmt::Debug for FileCleanupObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCleanupObserver")
            .field("backends", &self.backends)
            .finish()
    }
}
