//! Storage backend error types.

/// Kinds of storage backend errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Backend refused or failed a put
    #[display("Failed to write object: {}", _0)]
    Write(String),
    /// Backend failed to read an object
    #[display("Failed to read object: {}", _0)]
    Read(String),
    /// Backend failed a delete for a reason other than already-absent
    #[display("Failed to delete object: {}", _0)]
    Delete(String),
    /// Object not found at the specified path
    #[display("Object not found: {}", _0)]
    NotFound(String),
    /// Failed to create a storage directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Invalid object path
    #[display("Invalid object path: {}", _0)]
    InvalidPath(String),
    /// Storage backend is unavailable
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
    /// Invalid backend configuration
    #[display("Invalid configuration: {}", _0)]
    InvalidConfig(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use medialib_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("abc/test.jpg".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether this error represents a missing object rather than a backend failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, StorageErrorKind::NotFound(_))
    }

    /// Whether the operation that produced this error is worth retrying.
    ///
    /// Transient conditions (backend unavailable) are retryable; path,
    /// configuration, and not-found errors are permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, StorageErrorKind::Unavailable(_))
    }
}

/// Result type for storage backend operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
