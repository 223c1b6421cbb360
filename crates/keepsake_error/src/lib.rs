//! Error types for the Keepsake upload store.
//!
//! This crate provides the foundation error types used throughout the Keepsake workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use keepsake_error::{KeepsakeResult, StorageError, StorageErrorKind};
//!
//! fn lookup(name: &str) -> KeepsakeResult<Vec<u8>> {
//!     Err(StorageError::new(StorageErrorKind::NotFound(name.to_string())))?
//! }
//!
//! let err = lookup("missing.png").unwrap_err();
//! assert!(err.storage_kind().is_some_and(|kind| kind.is_not_found()));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod server;
mod storage;

pub use builder::{BuilderError, BuilderErrorKind};
pub use config::ConfigError;
pub use error::{KeepsakeError, KeepsakeErrorKind, KeepsakeResult};
pub use server::{ServerError, ServerErrorKind};
pub use storage::{StorageError, StorageErrorKind};
