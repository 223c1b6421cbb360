//! HTTP routes for uploading and downloading files.

use crate::{ApiError, KeepsakeConfig, UploadResponse};
use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures::TryStreamExt;
use keepsake_error::KeepsakeResult;
use keepsake_storage::{IngestOptions, RetrievalGuard, Upload, ingest};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::io::{ReaderStream, StreamReader};
use tower_http::trace::TraceLayer;

/// Shared, read-only state handed to every request.
#[derive(Debug, Clone)]
pub struct ApiState {
    upload_dir: PathBuf,
    options: Arc<IngestOptions>,
    guard: Arc<RetrievalGuard>,
}

impl ApiState {
    /// Build state from configuration.
    ///
    /// The upload directory must already exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid or the directory cannot be
    /// canonicalized.
    pub fn new(config: &KeepsakeConfig) -> KeepsakeResult<Self> {
        let options = config.ingest_options()?;
        let guard = RetrievalGuard::new(config.upload_dir(), options.allowed_types().clone())?;
        Ok(Self {
            upload_dir: config.upload_dir().clone(),
            options: Arc::new(options),
            guard: Arc::new(guard),
        })
    }
}

/// Creates the upload/download router.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/upload", post(upload_file))
        .route("/files/:filename", get(download_file))
        // The ingestor enforces its own streaming ceiling.
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// Accept a multipart upload in the `file` field.
async fn upload_file(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Could not parse multipart body");
                ApiError::malformed(e.status())
            })?
            .ok_or_else(ApiError::missing_file)?;

        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let declared_type = field.content_type().map(str::to_string);
        let body = StreamReader::new(Box::pin(field.map_err(std::io::Error::other)));

        let upload = Upload {
            body,
            filename,
            declared_type,
        };
        let stored = ingest(upload, &state.upload_dir, &state.options).await?;

        return Ok((StatusCode::CREATED, Json(UploadResponse::from(&stored))));
    }
}

/// Stream a stored file back.
async fn download_file(
    State(state): State<ApiState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let found = state.guard.resolve(&filename).await?;

    Ok((
        [
            (header::CONTENT_TYPE, found.media_type),
            (header::CONTENT_LENGTH, found.len.to_string()),
        ],
        Body::from_stream(ReaderStream::new(found.file)),
    )
        .into_response())
}
