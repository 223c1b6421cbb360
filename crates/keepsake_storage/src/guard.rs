//! Traversal-safe lookup of stored files.

use crate::AllowedTypes;
use keepsake_error::{KeepsakeResult, StorageError, StorageErrorKind};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs::File;

/// An opened, validated stored file ready to stream back.
#[derive(Debug)]
pub struct RetrievedFile {
    /// Canonical path of the file
    pub path: PathBuf,
    /// Open read handle
    pub file: File,
    /// Media type registered for the file's extension
    pub media_type: String,
    /// Size in bytes
    pub len: u64,
}

/// Resolves client-supplied names against a store root.
///
/// Any name that resolves outside the root, whether through `..` segments,
/// an absolute path or a symlink, is reported as not found, exactly like a
/// missing file. Only regular, non-hidden files whose extension appears in
/// the allowed-type table are handed out.
#[derive(Debug, Clone)]
pub struct RetrievalGuard {
    root: PathBuf,
    allowed_types: AllowedTypes,
}

impl RetrievalGuard {
    /// Create a guard over an existing store directory.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the root cannot be canonicalized.
    pub fn new(root: impl AsRef<Path>, allowed_types: AllowedTypes) -> KeepsakeResult<Self> {
        let root = root.as_ref();
        let root = std::fs::canonicalize(root).map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidConfig(format!(
                "store root {}: {}",
                root.display(),
                e
            )))
        })?;
        Ok(Self {
            root,
            allowed_types,
        })
    }

    /// Canonical store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allowed-type table consulted for extensions.
    pub fn allowed_types(&self) -> &AllowedTypes {
        &self.allowed_types
    }

    /// Resolve `requested` to an open stored file.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the target is missing, outside the root, not a regular
    ///   file, or hidden
    /// - `TypeNotAllowed` if its extension is not in the table
    /// - `FileRead` if it exists but cannot be opened
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn resolve(&self, requested: &str) -> KeepsakeResult<RetrievedFile> {
        let joined = self.root.join(requested);

        let resolved = match tokio::fs::canonicalize(&joined).await {
            Ok(path) => path,
            Err(e) => {
                if normalize(&joined).starts_with(&self.root) {
                    tracing::info!(error = %e, "File requested but not found");
                } else {
                    tracing::error!("SECURITY: path traversal attempt detected");
                }
                return Err(not_found(requested));
            }
        };

        if !resolved.starts_with(&self.root) {
            tracing::error!(
                resolved = %resolved.display(),
                "SECURITY: path traversal attempt detected"
            );
            return Err(not_found(requested));
        }

        let metadata = tokio::fs::metadata(&resolved)
            .await
            .map_err(|_| not_found(requested))?;
        if !metadata.is_file() {
            tracing::info!(resolved = %resolved.display(), "Requested path is not a file");
            return Err(not_found(requested));
        }

        let hidden = resolved
            .file_name()
            .and_then(|name| name.to_str())
            .is_none_or(|name| name.starts_with('.'));
        if hidden {
            tracing::warn!(resolved = %resolved.display(), "Refused to serve hidden file");
            return Err(not_found(requested));
        }

        let extension = resolved
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();
        let Some(media_type) = self.allowed_types.media_type_for(&extension) else {
            tracing::warn!(extension = %extension, "File requested with blocked extension");
            return Err(StorageError::new(StorageErrorKind::TypeNotAllowed(extension)).into());
        };

        let file = File::open(&resolved).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                not_found(requested)
            } else {
                tracing::error!(resolved = %resolved.display(), error = %e, "Could not open stored file");
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    resolved.display(),
                    e
                )))
                .into()
            }
        })?;

        tracing::debug!(resolved = %resolved.display(), media_type, "Resolved stored file");
        Ok(RetrievedFile {
            path: resolved,
            file,
            media_type: media_type.to_string(),
            len: metadata.len(),
        })
    }
}

/// Resolve `requested` against `store_root` in one call.
///
/// A store root that does not exist holds nothing, so it yields `NotFound`.
///
/// # Errors
///
/// Same as [`RetrievalGuard::resolve`].
pub async fn resolve(
    requested: &str,
    store_root: &Path,
    allowed_types: &AllowedTypes,
) -> KeepsakeResult<RetrievedFile> {
    let guard = match RetrievalGuard::new(store_root, allowed_types.clone()) {
        Ok(guard) => guard,
        Err(_) => {
            tracing::info!(root = %store_root.display(), "Store root missing");
            return Err(not_found(requested));
        }
    };
    guard.resolve(requested).await
}

#[track_caller]
fn not_found(requested: &str) -> keepsake_error::KeepsakeError {
    StorageError::new(StorageErrorKind::NotFound(requested.to_string())).into()
}

/// Lexically collapse `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize(Path::new("/srv/uploads/reports/../../secret.txt")),
            PathBuf::from("/srv/secret.txt")
        );
        assert_eq!(
            normalize(Path::new("/srv/uploads/./a.png")),
            PathBuf::from("/srv/uploads/a.png")
        );
        assert_eq!(normalize(Path::new("/../../etc")), PathBuf::from("/etc"));
    }
}
