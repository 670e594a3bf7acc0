//! HTTP error mapping.
//!
//! [`AppError`] is the taxonomy the service layer speaks; `IntoResponse`
//! turns it into the registry's wire format. Server-side failures (I/O,
//! database, unclassified) are logged here and answered with a generic
//! message — internal error strings never reach the client body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use depot_metadata::MetadataError;
use depot_storage::StorageError;

/// JSON error response body: `error` is the HTTP reason phrase, `code`
/// the numeric status, `message` the human-readable detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: u16,
    pub message: String,
}

/// Build the standard JSON error response for a status and message.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        error: status.canonical_reason().unwrap_or("Error").to_string(),
        code: status.as_u16(),
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

/// Application-level error mapped onto HTTP statuses.
///
/// `NotFound` and `Conflict` are anticipated outcomes and surface their
/// messages verbatim; the 500-class variants carry the underlying cause
/// for the log only.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request parameters (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid bearer token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Artifact, package, or blob absent (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Unique-constraint violation on (package, version) (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Disk read/write/rename/stat failure (500).
    #[error("i/o failure: {0}")]
    Io(String),

    /// Catalog failure other than a constraint violation (500).
    #[error("database failure: {0}")]
    Database(String),

    /// Unclassified failure (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Io(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message the client is allowed to see.
    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg) => msg.clone(),
            Self::Io(_) | Self::Database(_) | Self::Internal(_) => "internal error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Server-class failures are logged with their real cause; the
        // response body only ever carries the sanitized message.
        match &self {
            Self::Io(_) | Self::Database(_) | Self::Internal(_) => {
                tracing::error!(error = %self, "request failed");
            }
            _ => {}
        }
        error_response(self.status(), self.public_message())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { hash } => Self::NotFound(format!("blob {hash} not found")),
            StorageError::Io(io) => Self::Io(io.to_string()),
        }
    }
}

impl From<MetadataError> for AppError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::Duplicate { package, version } => {
                Self::Conflict(format!("artifact {package}@{version} already exists"))
            }
            MetadataError::ArtifactNotFound { package, version } => {
                Self::NotFound(format!("artifact {package}@{version} not found"))
            }
            MetadataError::Database(db) => Self::Database(db.to_string()),
        }
    }
}
