//! Content-validated upload storage for Keepsake.
//!
//! This crate owns the two flows with real security contracts: accepting an
//! upload into a flat store directory, and handing a stored file back out.
//!
//! # Features
//!
//! - **Content sniffing**: the stored type comes from magic numbers, never from
//!   the client's file name or `Content-Type`
//! - **Streaming size ceiling**: checked after every chunk, so oversized
//!   uploads are cut off early
//! - **Atomic writes**: staging file + fsync + rename; partial files are never
//!   visible under a final name and are removed on every failure path
//! - **Traversal-safe retrieval**: names are canonicalized and confined to the
//!   store root; escapes look exactly like missing files
//!
//! # Example
//!
//! ```rust
//! use keepsake_storage::{IngestOptions, RetrievalGuard, Upload, ingest};
//! use tokio::io::AsyncReadExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = std::env::temp_dir().join("keepsake-doc");
//! let options = IngestOptions::default();
//!
//! // Store an upload
//! let png: &[u8] = b"\x89PNG\r\n\x1a\n";
//! let stored = ingest(Upload::new(png).with_filename("cat.png"), &dir, &options).await?;
//! assert_eq!(stored.media_type, "image/png");
//!
//! // Serve it back
//! let guard = RetrievalGuard::new(&dir, options.allowed_types().clone())?;
//! let mut found = guard.resolve(&stored.file_name).await?;
//! let mut bytes = Vec::new();
//! found.file.read_to_end(&mut bytes).await?;
//! assert_eq!(bytes, png);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod allowed;
mod classify;
mod guard;
mod ingest;
mod options;
mod staging;

pub use allowed::{AllowedType, AllowedTypes};
pub use classify::{SNIFF_LEN, UNKNOWN_MEDIA_TYPE, classify};
pub use guard::{RetrievalGuard, RetrievedFile, resolve};
pub use ingest::{StoredFile, Upload, ingest};
pub use keepsake_error::{StorageError, StorageErrorKind};
pub use options::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_UPLOAD_BYTES, IngestOptions, IngestOptionsBuilder,
};
pub use staging::{STAGING_MARKER, StagedFile, is_staging_name, sweep_staging};
