//! Top-level error wrapper types.

use crate::{BuilderError, ConfigError, ServerError, StorageError, StorageErrorKind};

/// Every error condition a Keepsake crate can surface.
///
/// # Examples
///
/// ```
/// use keepsake_error::{ConfigError, KeepsakeError};
///
/// let err: KeepsakeError = ConfigError::new("upload_dir is empty").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum KeepsakeErrorKind {
    /// Upload, staging or retrieval failure
    #[from(StorageError)]
    Storage(StorageError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// HTTP server error
    #[from(ServerError)]
    Server(ServerError),
}

/// Keepsake error with kind discrimination.
///
/// # Examples
///
/// ```
/// use keepsake_error::{KeepsakeResult, StorageError, StorageErrorKind};
///
/// fn might_fail() -> KeepsakeResult<()> {
///     Err(StorageError::new(StorageErrorKind::TooLarge { limit: 1024 }))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Keepsake Error: {}", _0)]
pub struct KeepsakeError(Box<KeepsakeErrorKind>);

impl KeepsakeError {
    /// Create a new error from a kind.
    pub fn new(kind: KeepsakeErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &KeepsakeErrorKind {
        &self.0
    }

    /// Get the storage error kind, if this is a storage error.
    pub fn storage_kind(&self) -> Option<&StorageErrorKind> {
        match self.kind() {
            KeepsakeErrorKind::Storage(err) => Some(&err.kind),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to KeepsakeErrorKind
impl<T> From<T> for KeepsakeError
where
    T: Into<KeepsakeErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Keepsake operations.
pub type KeepsakeResult<T> = std::result::Result<T, KeepsakeError>;
