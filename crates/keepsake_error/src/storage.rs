//! Storage error types.

/// Kinds of storage errors.
///
/// The first two are client rejections, `NotFound` and `TypeNotAllowed` are
/// retrieval outcomes, and the rest are server-side faults.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Detected content type is not in the allowed-type table
    #[display("Content rejected: detected type {}", _0)]
    ContentRejected(String),
    /// Streamed bytes exceeded the configured ceiling
    #[display("Upload exceeds limit of {} bytes", limit)]
    TooLarge {
        /// The configured maximum in bytes
        limit: u64,
    },
    /// Failed to read from the upload stream
    #[display("Failed to read upload stream: {}", _0)]
    StreamRead(String),
    /// Failed to create storage directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write file
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// Failed to move a staged file to its final name
    #[display("Failed to publish file: {}", _0)]
    Publish(String),
    /// Failed to read file
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// File absent, or resolved outside the store root
    #[display("File not found: {}", _0)]
    NotFound(String),
    /// File extension is not in the allowed-type table
    #[display("File type not allowed: {}", _0)]
    TypeNotAllowed(String),
    /// Invalid storage configuration
    #[display("Invalid configuration: {}", _0)]
    InvalidConfig(String),
}

impl StorageErrorKind {
    /// Whether the caller sent something we refuse to store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ContentRejected(_) | Self::TooLarge { .. } | Self::TypeNotAllowed(_)
        )
    }

    /// Whether this is a retrieval miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use keepsake_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("report.pdf".to_string()));
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(StorageErrorKind::ContentRejected("text/plain".into()).is_client_error());
        assert!(StorageErrorKind::TooLarge { limit: 10 }.is_client_error());
        assert!(!StorageErrorKind::Publish("rename".into()).is_client_error());
        assert!(!StorageErrorKind::NotFound("x".into()).is_client_error());
    }

    #[test]
    fn test_location_tracking() {
        let err = StorageError::new(StorageErrorKind::FileWrite("disk full".into()));
        assert!(err.file.ends_with("storage.rs"));
        assert!(err.line > 0);
    }
}
