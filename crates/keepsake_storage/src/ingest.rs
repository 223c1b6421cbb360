//! Upload ingestion: sniff, stage, cap, publish.

use crate::staging::{StagedFile, random_id};
use crate::{IngestOptions, classify};
use keepsake_error::{KeepsakeResult, StorageError, StorageErrorKind};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt};

/// An incoming upload.
///
/// `filename` and `declared_type` come from the client and are only logged;
/// the stored name and type are derived from the bytes.
#[derive(Debug)]
pub struct Upload<R> {
    /// The upload body
    pub body: R,
    /// Client-supplied file name
    pub filename: Option<String>,
    /// Client-supplied media type
    pub declared_type: Option<String>,
}

impl<R> Upload<R> {
    /// Wrap a body with no client metadata.
    pub fn new(body: R) -> Self {
        Self {
            body,
            filename: None,
            declared_type: None,
        }
    }

    /// Attach the client-supplied file name.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Attach the client-supplied media type.
    pub fn with_declared_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }
}

/// A successfully published upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredFile {
    /// Full path of the published file
    pub path: PathBuf,
    /// Name of the file inside the store
    pub file_name: String,
    /// Media type detected from the content
    pub media_type: String,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Validate an upload by content and store it atomically under `dest`.
///
/// The leading bytes are classified; content whose type is not in the
/// allowed table is refused before anything touches the disk. Accepted
/// uploads are streamed into a staging file with the size ceiling enforced
/// per chunk, then renamed into place. The upload body is consumed and
/// dropped on every path, and an unpublished staging file never survives
/// this call (or the drop of its future).
///
/// # Errors
///
/// - `ContentRejected` if the detected type is not allowed
/// - `TooLarge` if the body exceeds `max_size_bytes`
/// - `StreamRead` if the body cannot be read
/// - `DirectoryCreation`, `FileWrite` or `Publish` on filesystem faults
#[tracing::instrument(
    skip_all,
    fields(
        filename = ?upload.filename,
        declared_type = ?upload.declared_type,
        dest = %dest.display(),
    )
)]
pub async fn ingest<R>(
    upload: Upload<R>,
    dest: &Path,
    options: &IngestOptions,
) -> KeepsakeResult<StoredFile>
where
    R: AsyncRead + Unpin + Send,
{
    tracing::info!("Starting upload");

    let Upload { mut body, .. } = upload;

    let mut prefix = Vec::with_capacity(*options.sniff_len());
    (&mut body)
        .take(*options.sniff_len() as u64)
        .read_to_end(&mut prefix)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to read upload header for classification");
            StorageError::new(StorageErrorKind::StreamRead(format!("header: {}", e)))
        })?;

    let media_type = classify(&prefix);
    let Some(extension) = options.allowed_types().extension_for(media_type) else {
        tracing::warn!(
            detected = media_type,
            allowed = ?options.allowed_types().media_types().collect::<Vec<_>>(),
            "Upload rejected"
        );
        return Err(StorageError::new(StorageErrorKind::ContentRejected(media_type.to_string())).into());
    };
    tracing::debug!(media_type, extension, "Content classified");

    tokio::fs::create_dir_all(dest).await.map_err(|e| {
        tracing::error!(dest = %dest.display(), error = %e, "Could not create destination directory");
        StorageError::new(StorageErrorKind::DirectoryCreation(format!(
            "{}: {}",
            dest.display(),
            e
        )))
    })?;

    let file_name = if *options.ensure_unique() {
        format!("{}{}{}", options.filename_prefix(), random_id(), extension)
    } else {
        format!("{}{}", options.filename_prefix(), extension)
    };
    let final_path = dest.join(&file_name);

    let mut staged = StagedFile::create(dest, &file_name).await.inspect_err(|e| {
        tracing::error!(error = %e, "Could not create staging file");
    })?;

    // Replay the sniffed prefix ahead of the rest of the body.
    let mut stream = Cursor::new(prefix).chain(body);
    let size_bytes = match staged
        .fill(&mut stream, *options.max_size_bytes(), *options.chunk_size())
        .await
    {
        Ok(size) => size,
        Err(e) => {
            if !e.storage_kind().is_some_and(|kind| kind.is_client_error()) {
                tracing::error!(error = %e, "Unexpected error while saving upload");
            }
            return Err(e);
        }
    };
    drop(stream);

    staged.publish(&final_path).await.inspect_err(|e| {
        tracing::error!(error = %e, "Could not publish upload");
    })?;

    tracing::info!(
        path = %final_path.display(),
        media_type,
        size = size_bytes,
        "Stored upload"
    );

    Ok(StoredFile {
        path: final_path,
        file_name,
        media_type: media_type.to_string(),
        size_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prefix_is_replayed() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
        data.extend(std::iter::repeat_n(7u8, 5000));

        let options = crate::IngestOptionsBuilder::default()
            .sniff_len(16_usize)
            .chunk_size(100_usize)
            .build()
            .unwrap();
        let stored = ingest(Upload::new(&data[..]), dir.path(), &options)
            .await
            .unwrap();

        assert_eq!(stored.size_bytes, data.len() as u64);
        assert_eq!(std::fs::read(&stored.path).unwrap(), data);
    }
}
