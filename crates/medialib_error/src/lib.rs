//! Error types for the medialib library.
//!
//! This crate provides the foundation error types used throughout the medialib workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use medialib_error::{MedialibResult, StorageError, StorageErrorKind};
//!
//! fn write_object() -> MedialibResult<()> {
//!     Err(StorageError::new(StorageErrorKind::Write("disk full".to_string())))?
//! }
//!
//! match write_object() {
//!     Ok(_) => println!("Stored"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod conversion;
mod error;
mod manager;
mod repository;
mod storage;

pub use config::ConfigError;
pub use conversion::{ConversionError, ConversionErrorKind};
pub use error::{MedialibError, MedialibErrorKind, MedialibResult};
pub use manager::{ManagerError, ManagerErrorKind};
pub use repository::{RepositoryError, RepositoryErrorKind};
pub use storage::{StorageError, StorageErrorKind, StorageResult};
