//! Media manager error types.

/// Kinds of manager errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ManagerErrorKind {
    /// No storage backend registered under the given name
    #[display("Unknown storage backend: {}", _0)]
    UnknownBackend(String),
    /// File deletion failed; the media record was left intact
    #[display("Deletion failed, record retained: {}", _0)]
    DeletionFailed(String),
    /// add_media aborted and rolled back already-written files
    #[display("Media add aborted and rolled back: {}", _0)]
    AddAborted(String),
}

/// Manager error with location tracking.
///
/// # Examples
///
/// ```
/// use medialib_error::{ManagerError, ManagerErrorKind};
///
/// let err = ManagerError::new(ManagerErrorKind::UnknownBackend("s3".to_string()));
/// assert!(format!("{}", err).contains("Unknown storage backend"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Manager Error: {} at line {} in {}", kind, line, file)]
pub struct ManagerError {
    /// The kind of error that occurred
    pub kind: ManagerErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ManagerError {
    /// Create a new manager error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ManagerErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
