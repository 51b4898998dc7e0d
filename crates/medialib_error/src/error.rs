//! Top-level error wrapper types.

use crate::{ConfigError, ConversionError, ManagerError, RepositoryError, StorageError};

/// This is the foundation error enum for the medialib workspace.
///
/// # Examples
///
/// ```
/// use medialib_error::{MedialibError, ConfigError};
///
/// let config_err = ConfigError::new("missing backend section");
/// let err: MedialibError = config_err.into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum MedialibErrorKind {
    /// Storage backend error
    #[from(StorageError)]
    Storage(StorageError),
    /// Conversion derivation error
    #[from(ConversionError)]
    Conversion(ConversionError),
    /// Media manager error
    #[from(ManagerError)]
    Manager(ManagerError),
    /// Record repository error
    #[from(RepositoryError)]
    Repository(RepositoryError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Medialib error with kind discrimination.
///
/// # Examples
///
/// ```
/// use medialib_error::{MedialibResult, ConfigError};
///
/// fn might_fail() -> MedialibResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Medialib Error: {}", _0)]
pub struct MedialibError(Box<MedialibErrorKind>);

impl MedialibError {
    /// Create a new error from a kind.
    pub fn new(kind: MedialibErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &MedialibErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to MedialibErrorKind
impl<T> From<T> for MedialibError
where
    T: Into<MedialibErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for medialib operations.
///
/// # Examples
///
/// ```
/// use medialib_error::{MedialibResult, StorageError, StorageErrorKind};
///
/// fn fetch_object() -> MedialibResult<Vec<u8>> {
///     Err(StorageError::new(StorageErrorKind::NotFound("id/test.jpg".into())))?
/// }
/// ```
pub type MedialibResult<T> = std::result::Result<T, MedialibError>;
