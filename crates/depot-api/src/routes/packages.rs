//! Package listing, search, and info.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use depot_core::{Package, PackageInfo};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/packages", get(list))
        .route("/api/v1/packages/{package}", get(info))
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    search: Option<String>,
}

/// `GET /api/v1/packages[?search=q]` — all packages, or a substring
/// match. An empty result is `[]`, never null.
async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Package>>, AppError> {
    let packages = state.service.list_packages(params.search.as_deref()).await?;
    Ok(Json(packages))
}

/// `GET /api/v1/packages/{package}` — the package and its versions,
/// newest upload first. A package that has lost all its versions still
/// answers, with an empty list.
async fn info(
    State(state): State<AppState>,
    Path(package): Path<String>,
) -> Result<Json<PackageInfo>, AppError> {
    Ok(Json(state.service.package_info(&package).await?))
}
