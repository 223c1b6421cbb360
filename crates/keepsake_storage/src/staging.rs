//! Staging files and the guard that removes them.
//!
//! Bytes are accumulated in a dot-prefixed file next to their final
//! destination. The guard deletes that file when it goes out of scope unless
//! [`StagedFile::publish`] renamed it into place, so failures, early returns
//! and dropped futures all leave the store clean.

use keepsake_error::{KeepsakeResult, StorageError, StorageErrorKind};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

/// Leading marker of every staging file name.
pub const STAGING_MARKER: &str = ".tmp_";

/// 32 lowercase hex characters from a v4 UUID.
pub(crate) fn random_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Whether a file name belongs to an in-flight or abandoned staging file.
pub fn is_staging_name(name: &str) -> bool {
    name.starts_with(STAGING_MARKER)
}

/// A file being written that is not yet visible under its final name.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    file: Option<File>,
    published: bool,
}

impl StagedFile {
    /// Create a fresh staging file in `dir` for a file that will be published
    /// as `final_name`.
    ///
    /// # Errors
    ///
    /// Returns `FileWrite` if the file cannot be created.
    pub async fn create(dir: &Path, final_name: &str) -> KeepsakeResult<Self> {
        let path = dir.join(format!("{}{}_{}", STAGING_MARKER, random_id(), final_name));

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            })?;

        tracing::debug!(path = %path.display(), "Created staging file");
        Ok(Self {
            path,
            file: Some(file),
            published: false,
        })
    }

    /// Path of the staging file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy `reader` into the staging file, `chunk_size` bytes at a time.
    ///
    /// The running total is checked after every read, before the chunk is
    /// written, so at most `max_bytes` ever reach the disk.
    ///
    /// # Errors
    ///
    /// - `TooLarge` once more than `max_bytes` have been read
    /// - `StreamRead` if the reader fails
    /// - `FileWrite` if the staging file cannot be written
    pub async fn fill<R>(
        &mut self,
        reader: &mut R,
        max_bytes: u64,
        chunk_size: usize,
    ) -> KeepsakeResult<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let file = self.file.as_mut().ok_or_else(|| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: already closed",
                self.path.display()
            )))
        })?;

        let mut buf = vec![0u8; chunk_size];
        let mut total: u64 = 0;

        loop {
            let n = reader.read(&mut buf).await.map_err(|e| {
                StorageError::new(StorageErrorKind::StreamRead(e.to_string()))
            })?;
            if n == 0 {
                break;
            }

            total += n as u64;
            if total > max_bytes {
                tracing::warn!(
                    read = total,
                    limit = max_bytes,
                    "Upload exceeded size limit"
                );
                return Err(StorageError::new(StorageErrorKind::TooLarge { limit: max_bytes }).into());
            }

            file.write_all(&buf[..n]).await.map_err(|e| {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            })?;
        }

        Ok(total)
    }

    /// Flush, sync and atomically rename the staging file to `final_path`.
    ///
    /// `final_path` must be in the same directory. On failure the guard stays
    /// armed and the staging file is removed when it is dropped.
    ///
    /// # Errors
    ///
    /// Returns `FileWrite` if the data cannot be synced, `Publish` if the
    /// rename fails.
    pub async fn publish(mut self, final_path: &Path) -> KeepsakeResult<()> {
        if let Some(mut file) = self.file.take() {
            let synced = match file.flush().await {
                Ok(()) => file.sync_all().await,
                Err(e) => Err(e),
            };
            synced.map_err(|e| {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            })?;
        }

        tokio::fs::rename(&self.path, final_path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::Publish(format!(
                "rename {} to {}: {}",
                self.path.display(),
                final_path.display(),
                e
            )))
        })?;

        self.published = true;
        Ok(())
    }

    /// Close and delete the staging file now.
    ///
    /// Safe to call repeatedly; a file that is already gone is not an error.
    pub async fn discard(&mut self) -> std::io::Result<()> {
        self.file.take();
        if self.published {
            return Ok(());
        }
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Removed staging file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        self.file.take();
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Cleaned up staging file");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to clean up staging file"
                );
            }
        }
    }
}

/// Delete staging files left in `dir` by a process that died mid-upload.
///
/// Returns how many were removed. Individual failures are logged and skipped.
///
/// # Errors
///
/// Returns `FileRead` if the directory cannot be listed.
pub async fn sweep_staging(dir: &Path) -> KeepsakeResult<usize> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", dir.display(), e)))
    })?;

    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Stopped staging sweep early");
                break;
            }
        };

        let name = entry.file_name();
        if !name.to_str().is_some_and(is_staging_name) {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "Could not remove stale staging file");
            }
        }
    }

    if removed > 0 {
        tracing::info!(dir = %dir.display(), removed, "Removed stale staging files");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_id_shape() {
        let id = random_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(id, random_id());
    }

    #[test]
    fn test_staging_names() {
        assert!(is_staging_name(".tmp_abc_photo.png"));
        assert!(!is_staging_name("photo.png"));
        assert!(!is_staging_name("tmp_photo.png"));
    }
}
