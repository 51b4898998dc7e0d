//! Pluggable storage backends for medialib.
//!
//! This crate provides the [`StorageBackend`] trait and its implementations:
//! local filesystem, S3-compatible object storage, and an in-memory backend
//! for tests and ephemeral use. Backends are addressed by string object
//! paths chosen by the caller; a backend never invents paths of its own,
//! it only enforces safety (no absolute paths, no `..`, no empty segments).
//!
//! # Example
//!
//! ```rust
//! use medialib_storage::{MemoryBackend, StorageBackend};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = MemoryBackend::new("memory", "https://media.example.com");
//!
//! backend.put("abc/test.jpg", b"jpeg bytes").await?;
//! assert!(backend.has("abc/test.jpg").await?);
//! assert_eq!(
//!     backend.public_url("abc/test.jpg"),
//!     "https://media.example.com/abc/test.jpg"
//! );
//!
//! backend.delete("abc/test.jpg").await?;
//! assert!(!backend.has("abc/test.jpg").await?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod filesystem;
mod memory;
mod registry;
mod s3;

pub use config::{
    FilesystemConfig, FilesystemConfigBuilder, MedialibConfig, S3Config, S3ConfigBuilder,
    build_registry,
};
pub use filesystem::FilesystemBackend;
pub use medialib_error::{StorageError, StorageErrorKind, StorageResult};
pub use memory::MemoryBackend;
pub use registry::BackendRegistry;
pub use s3::S3Backend;

/// Trait for pluggable storage backends.
///
/// Implementations store, probe, and remove binary objects under caller-chosen
/// relative paths, and render public URLs for stored objects from their
/// configuration. All failure conditions surface as [`StorageError`]; a
/// delete of an already-absent object is success, so retried deletes
/// converge to the same end state.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Identifier this backend is registered under (e.g. "local", "s3").
    fn name(&self) -> &str;

    /// Store an object at the given path, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns a `Write` error if the backend refused or failed the put.
    async fn put(&self, path: &str, data: &[u8]) -> StorageResult<()>;

    /// Retrieve an object's bytes.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no object exists at the path, or a `Read`
    /// error for any other failure.
    async fn get(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Check whether an object exists at the given path.
    async fn has(&self, path: &str) -> StorageResult<bool>;

    /// Delete the object at the given path.
    ///
    /// Deleting an absent object is success.
    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Delete every object stored under the given prefix.
    ///
    /// Backends with directory semantics remove the directory tree;
    /// object stores enumerate and delete each object. An absent prefix
    /// is success.
    async fn delete_prefix(&self, prefix: &str) -> StorageResult<()>;

    /// Render the public URL for an object path.
    ///
    /// Pure computation over backend configuration; performs no I/O and
    /// does not check that the object exists.
    fn public_url(&self, path: &str) -> String;
}

/// Validate a caller-supplied object path.
///
/// Paths are relative, `/`-separated, with no empty segments and no `.` or
/// `..` components.
pub(crate) fn validate_object_path(path: &str) -> StorageResult<()> {
    if path.is_empty() || path.starts_with('/') {
        return Err(StorageError::new(StorageErrorKind::InvalidPath(
            path.to_string(),
        )));
    }
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(StorageError::new(StorageErrorKind::InvalidPath(
                path.to_string(),
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_object_path;

    #[test]
    fn accepts_relative_paths() {
        assert!(validate_object_path("abc/test.jpg").is_ok());
        assert!(validate_object_path("abc/conversions/thumb.jpg").is_ok());
    }

    #[test]
    fn rejects_unsafe_paths() {
        assert!(validate_object_path("").is_err());
        assert!(validate_object_path("/etc/passwd").is_err());
        assert!(validate_object_path("abc//test.jpg").is_err());
        assert!(validate_object_path("abc/../test.jpg").is_err());
        assert!(validate_object_path("./test.jpg").is_err());
    }
}
