//! HTTP front end for the Keepsake upload store.
//!
//! This crate is the thin layer around [`keepsake_storage`]: it loads
//! configuration, exposes the upload and download routes, and maps storage
//! outcomes onto HTTP statuses.
//!
//! # Routes
//!
//! - `POST /upload` - multipart form with a `file` field; `201` with
//!   `{"message", "filename", "path"}`
//! - `GET /files/{filename}` - streams a stored file
//! - `GET /health` - liveness probe
//!
//! Errors are returned as `{"detail": "..."}`.
//!
//! # Example
//!
//! ```rust,no_run
//! use keepsake_server::{KeepsakeConfig, serve};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = KeepsakeConfig::load(None)?.with_bind("127.0.0.1:8000");
//!     serve(config).await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod config;
mod observability;
mod response;
mod server;

pub use api::{ApiState, create_router};
pub use config::KeepsakeConfig;
pub use keepsake_error::{ServerError, ServerErrorKind};
pub use observability::{ObservabilityConfig, init_observability};
pub use response::{ApiError, ErrorBody, UploadResponse};
pub use server::{prepare_store, serve};
