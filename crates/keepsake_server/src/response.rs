//! Response bodies and error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use keepsake_error::{KeepsakeError, KeepsakeErrorKind, StorageErrorKind};
use keepsake_storage::StoredFile;
use serde::{Deserialize, Serialize};

/// Body of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Human-readable outcome
    pub message: String,
    /// Stored file name
    pub filename: String,
    /// Store-relative download path
    pub path: String,
}

impl From<&StoredFile> for UploadResponse {
    fn from(stored: &StoredFile) -> Self {
        Self {
            message: "File uploaded successfully".to_string(),
            filename: stored.file_name.clone(),
            path: format!("/files/{}", stored.file_name),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// What went wrong, safe to show to the client
    pub detail: String,
}

/// An error on its way to the client.
///
/// The detail text is fixed per outcome; paths and internal messages stay in
/// the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Response status
    pub status: StatusCode,
    /// Client-facing detail
    pub detail: String,
}

impl ApiError {
    /// Create an error response.
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// The request did not carry a `file` form field.
    pub fn missing_file() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "No file field in upload")
    }

    /// The multipart body could not be parsed.
    pub fn malformed(status: StatusCode) -> Self {
        Self::new(status, "Malformed multipart body")
    }
}

impl From<KeepsakeError> for ApiError {
    fn from(err: KeepsakeError) -> Self {
        let storage_kind = match err.kind() {
            KeepsakeErrorKind::Storage(storage) => &storage.kind,
            _ => {
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            }
        };

        match storage_kind {
            StorageErrorKind::ContentRejected(_) => {
                Self::new(StatusCode::BAD_REQUEST, "Invalid or unsupported file content")
            }
            StorageErrorKind::TooLarge { limit } => Self::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("File too large. Max allowed is {} bytes.", limit),
            ),
            StorageErrorKind::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "File not found"),
            StorageErrorKind::TypeNotAllowed(_) => {
                Self::new(StatusCode::BAD_REQUEST, "File type not allowed")
            }
            StorageErrorKind::DirectoryCreation(_) | StorageErrorKind::InvalidConfig(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error")
            }
            StorageErrorKind::StreamRead(_)
            | StorageErrorKind::FileWrite(_)
            | StorageErrorKind::Publish(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "File upload failed")
            }
            StorageErrorKind::FileRead(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                detail: self.detail,
            }),
        )
            .into_response()
    }
}
