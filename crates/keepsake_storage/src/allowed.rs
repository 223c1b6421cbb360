//! The allowed-type table.

use crate::UNKNOWN_MEDIA_TYPE;
use keepsake_error::{KeepsakeResult, StorageError, StorageErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the allowed-type table, as it appears in configuration.
///
/// ```toml
/// [[allowed_types]]
/// media_type = "image/png"
/// extension = ".png"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllowedType {
    /// Canonical media type (e.g., "image/png")
    pub media_type: String,
    /// Canonical extension including the leading dot (e.g., ".png")
    pub extension: String,
}

impl AllowedType {
    /// Create a new table row.
    pub fn new(media_type: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            extension: extension.into(),
        }
    }
}

/// Bidirectional mapping between accepted media types and their extensions.
///
/// Both columns are unique, so the table answers "which extension do I store
/// this type under" for ingestion and "may this extension be served" for
/// retrieval. Extensions are kept lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<AllowedType>", into = "Vec<AllowedType>")]
pub struct AllowedTypes {
    by_type: BTreeMap<String, String>,
    by_extension: BTreeMap<String, String>,
}

impl AllowedTypes {
    /// Build a table from rows.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a media type or extension appears twice, if an
    /// extension is not of the form `.ext`, or if a row names the classifier's
    /// unknown sentinel.
    pub fn new(rows: impl IntoIterator<Item = AllowedType>) -> KeepsakeResult<Self> {
        let mut by_type = BTreeMap::new();
        let mut by_extension = BTreeMap::new();

        for AllowedType {
            media_type,
            extension,
        } in rows
        {
            let media_type = media_type.trim().to_ascii_lowercase();
            let extension = extension.trim().to_ascii_lowercase();

            if media_type.is_empty() || media_type == UNKNOWN_MEDIA_TYPE {
                return Err(invalid(format!("media type '{}' cannot be allowed", media_type)));
            }
            if !is_valid_extension(&extension) {
                return Err(invalid(format!(
                    "extension '{}' for {} must look like '.ext'",
                    extension, media_type
                )));
            }
            if by_type.contains_key(&media_type) {
                return Err(invalid(format!("media type {} listed twice", media_type)));
            }
            if by_extension.contains_key(&extension) {
                return Err(invalid(format!("extension {} listed twice", extension)));
            }

            by_extension.insert(extension.clone(), media_type.clone());
            by_type.insert(media_type, extension);
        }

        Ok(Self {
            by_type,
            by_extension,
        })
    }

    /// Extension to store a detected media type under, if the type is allowed.
    pub fn extension_for(&self, media_type: &str) -> Option<&str> {
        self.by_type.get(media_type).map(String::as_str)
    }

    /// Media type served for an extension (with leading dot, any case).
    pub fn media_type_for(&self, extension: &str) -> Option<&str> {
        self.by_extension
            .get(&extension.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Allowed media types, sorted.
    pub fn media_types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }

    /// Allowed extensions, sorted.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.by_extension.keys().map(String::as_str)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    /// Whether the table allows nothing.
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

impl Default for AllowedTypes {
    /// PDF plus the common raster image formats.
    fn default() -> Self {
        let by_type: BTreeMap<String, String> = [
            ("application/pdf", ".pdf"),
            ("image/jpeg", ".jpg"),
            ("image/png", ".png"),
            ("image/gif", ".gif"),
            ("image/webp", ".webp"),
            ("image/tiff", ".tif"),
        ]
        .into_iter()
        .map(|(media_type, extension)| (media_type.to_string(), extension.to_string()))
        .collect();
        let by_extension = by_type
            .iter()
            .map(|(media_type, extension)| (extension.clone(), media_type.clone()))
            .collect();

        Self {
            by_type,
            by_extension,
        }
    }
}

impl TryFrom<Vec<AllowedType>> for AllowedTypes {
    type Error = StorageError;

    #[track_caller]
    fn try_from(rows: Vec<AllowedType>) -> Result<Self, Self::Error> {
        Self::new(rows).map_err(|err| match err.storage_kind() {
            Some(kind) => StorageError::new(kind.clone()),
            None => StorageError::new(StorageErrorKind::InvalidConfig(err.to_string())),
        })
    }
}

impl From<AllowedTypes> for Vec<AllowedType> {
    fn from(table: AllowedTypes) -> Self {
        table
            .by_type
            .into_iter()
            .map(|(media_type, extension)| AllowedType {
                media_type,
                extension,
            })
            .collect()
    }
}

fn is_valid_extension(extension: &str) -> bool {
    match extension.strip_prefix('.') {
        Some(rest) => {
            !rest.is_empty()
                && rest
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        None => false,
    }
}

#[track_caller]
fn invalid(message: String) -> keepsake_error::KeepsakeError {
    StorageError::new(StorageErrorKind::InvalidConfig(message)).into()
}
