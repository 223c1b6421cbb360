//! Per-store ingestion options.

use crate::{AllowedTypes, SNIFF_LEN};
use derive_getters::Getters;
use keepsake_error::{BuilderError, BuilderErrorKind, KeepsakeResult};

/// Default upload ceiling: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Default read/write chunk: 64 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Knobs for [`ingest`](crate::ingest).
///
/// # Example
///
/// ```
/// use keepsake_storage::IngestOptionsBuilder;
///
/// let options = IngestOptionsBuilder::default()
///     .max_size_bytes(1024 * 1024_u64)
///     .filename_prefix("avatar_")
///     .build()
///     .unwrap();
/// assert_eq!(*options.max_size_bytes(), 1024 * 1024);
/// assert!(*options.ensure_unique());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_builder::Builder)]
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct IngestOptions {
    /// Largest accepted upload in bytes.
    #[builder(default = "DEFAULT_MAX_UPLOAD_BYTES")]
    max_size_bytes: u64,

    /// Media types accepted, and the extension each is stored under.
    #[builder(default)]
    allowed_types: AllowedTypes,

    /// Prepended to every stored file name.
    #[builder(default)]
    filename_prefix: String,

    /// Append a random id to the stored name. Disable only when the caller
    /// guarantees `filename_prefix` is already unique.
    #[builder(default = "true")]
    ensure_unique: bool,

    /// Bytes moved per read/write step.
    #[builder(default = "DEFAULT_CHUNK_SIZE")]
    chunk_size: usize,

    /// Bytes sampled for classification.
    #[builder(default = "SNIFF_LEN")]
    sniff_len: usize,
}

impl IngestOptionsBuilder {
    /// Build the options.
    ///
    /// # Errors
    ///
    /// Returns a builder error if a size is zero or the prefix could smuggle a
    /// path component into the stored name.
    pub fn build(&self) -> KeepsakeResult<IngestOptions> {
        let options = self
            .build_internal()
            .map_err(|e| BuilderError::new(BuilderErrorKind::MissingField(e.to_string())))?;

        if options.chunk_size == 0 {
            return Err(invalid_field("chunk_size", "must be greater than zero"));
        }
        if options.sniff_len == 0 {
            return Err(invalid_field("sniff_len", "must be greater than zero"));
        }
        if options.max_size_bytes == 0 {
            return Err(invalid_field("max_size_bytes", "must be greater than zero"));
        }
        if options.filename_prefix.starts_with('.')
            || options
                .filename_prefix
                .chars()
                .any(|c| c == '/' || c == '\\' || c.is_control())
        {
            return Err(invalid_field(
                "filename_prefix",
                "must not start with '.' or contain separators",
            ));
        }
        if !options.ensure_unique && options.filename_prefix.is_empty() {
            return Err(BuilderError::from(
                "a filename_prefix is required when ensure_unique is off".to_string(),
            )
            .into());
        }

        Ok(options)
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_types: AllowedTypes::default(),
            filename_prefix: String::new(),
            ensure_unique: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            sniff_len: SNIFF_LEN,
        }
    }
}

#[track_caller]
fn invalid_field(field: &str, reason: &str) -> keepsake_error::KeepsakeError {
    BuilderError::new(BuilderErrorKind::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    })
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = IngestOptionsBuilder::default().build().unwrap();
        assert_eq!(options, IngestOptions::default());
        assert_eq!(*options.chunk_size(), 64 * 1024);
        assert_eq!(*options.sniff_len(), 2048);
    }

    #[test]
    fn test_rejects_zero_chunk() {
        assert!(IngestOptionsBuilder::default().chunk_size(0_usize).build().is_err());
    }

    #[test]
    fn test_rejects_path_in_prefix() {
        assert!(
            IngestOptionsBuilder::default()
                .filename_prefix("../up")
                .build()
                .is_err()
        );
        assert!(
            IngestOptionsBuilder::default()
                .filename_prefix(".hidden")
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_fixed_name_needs_prefix() {
        assert!(
            IngestOptionsBuilder::default()
                .ensure_unique(false)
                .build()
                .is_err()
        );
        let options = IngestOptionsBuilder::default()
            .ensure_unique(false)
            .filename_prefix("logo")
            .build()
            .unwrap();
        assert!(!options.ensure_unique());
    }
}
