//! Operator-triggered garbage collection.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use depot_core::GcResult;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/gc", post(run))
}

/// `POST /api/v1/gc` — sweep blobs no artifact references.
///
/// Not serialized against uploads; operators are expected to run this in
/// quiet periods.
async fn run(State(state): State<AppState>) -> Result<Json<GcResult>, AppError> {
    Ok(Json(state.service.garbage_collect().await?))
}
