//! Media attachments with conversions over pluggable storage backends.
//!
//! medialib stores an original file plus derived "conversions" (e.g.
//! thumbnails) for a media record, across storage backends with different
//! consistency and latency characteristics (local disk, S3-compatible
//! object storage, in-memory). It keeps the set of stored files consistent
//! with the set of records as media is added and deleted.
//!
//! Every file of a record lives under its id: the original at
//! `{id}/{file_name}`, each conversion at `{id}/conversions/{name}.{ext}`.
//!
//! # Quick Start
//!
//! ```rust
//! use medialib::{
//!     AddMediaOptions, Conversion, ConversionRegistry, InMemoryRepository, MediaManager,
//! };
//! use medialib_storage::{BackendRegistry, MemoryBackend};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut backends = BackendRegistry::new();
//! backends.insert(Arc::new(MemoryBackend::new("memory", "https://media.example.com")));
//!
//! let mut conversions = ConversionRegistry::new();
//! conversions.register(
//!     "default",
//!     Conversion::new("thumb", |bytes| Ok(bytes[..bytes.len().min(64)].to_vec())),
//! );
//!
//! let manager = MediaManager::new(
//!     Arc::new(backends),
//!     Arc::new(conversions),
//!     Arc::new(InMemoryRepository::new()),
//! );
//!
//! let record = manager
//!     .add_media(b"jpeg bytes", "test.jpg", "default", "memory", &AddMediaOptions::new())
//!     .await?;
//!
//! assert_eq!(
//!     manager.get_url(&record)?,
//!     format!("https://media.example.com/{}/test.jpg", record.id)
//! );
//!
//! manager.delete(&record).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! The workspace is organized as focused crates:
//!
//! - `medialib_error` - error types (kind + wrapper pattern)
//! - `medialib_storage` - the `StorageBackend` trait and its backends
//! - `medialib` - path resolution, conversions, records, and the manager

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod conversion;
mod manager;
mod path;
mod record;
mod repository;
pub mod telemetry;

pub use conversion::{Conversion, ConversionRegistry, DeriveFn};
pub use manager::{AddMediaOptions, FileCleanupObserver, MediaManager};
pub use medialib_error::{
    ConversionError, ConversionErrorKind, ManagerError, ManagerErrorKind, MedialibError,
    MedialibErrorKind, MedialibResult, RepositoryError, RepositoryErrorKind, StorageError,
    StorageErrorKind, StorageResult,
};
pub use medialib_storage::{
    BackendRegistry, FilesystemBackend, MedialibConfig, MemoryBackend, S3Backend, StorageBackend,
    build_registry,
};
pub use path::PathResolver;
pub use record::{MediaConversion, MediaRecord};
pub use repository::{InMemoryRepository, MediaRepository, RecordRemovalObserver};
