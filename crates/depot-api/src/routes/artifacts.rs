//! Artifact upload, download, and delete.

use std::io;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::TryStreamExt;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

pub const ARTIFACT_HASH_HEADER: &str = "x-artifact-hash";

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/v1/artifacts/{package}/{version}",
        post(upload).get(download).delete(remove),
    )
}

/// `POST /api/v1/artifacts/{package}/{version}` — stream the request body
/// into the registry.
async fn upload(
    State(state): State<AppState>,
    Path((package, version)): Path<(String, String)>,
    body: Body,
) -> Result<Response, AppError> {
    let reader = StreamReader::new(body.into_data_stream().map_err(io::Error::other));
    let receipt = state.service.upload(&package, &version, reader).await?;
    Ok((StatusCode::CREATED, Json(receipt)).into_response())
}

/// `GET /api/v1/artifacts/{package}/{version}` — stream the blob back.
///
/// Failures after the headers are flushed cannot change the status any
/// more; they are logged and the connection is dropped, leaving the
/// client with a short read against `Content-Length`.
async fn download(
    State(state): State<AppState>,
    Path((package, version)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (artifact, file) = state.service.download(&package, &version).await?;

    let body = Body::from_stream(ReaderStream::new(file).inspect_err(|err| {
        warn!(error = %err, "streaming artifact body failed");
    }));

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (header::CONTENT_LENGTH, artifact.size.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}-{}\"",
                artifact.package, artifact.version
            ),
        ),
        (
            HeaderName::from_static(ARTIFACT_HASH_HEADER),
            artifact.hash,
        ),
    ];

    Ok((headers, body).into_response())
}

/// `DELETE /api/v1/artifacts/{package}/{version}` — drop the catalog row.
async fn remove(
    State(state): State<AppState>,
    Path((package, version)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.service.delete(&package, &version).await?;
    Ok(Json(serde_json::json!({ "status": "deleted" })))
}
