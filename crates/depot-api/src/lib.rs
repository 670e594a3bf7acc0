//! # depot-api — Artifact Service and HTTP Boundary
//!
//! The registry's HTTP surface, under `/api/v1`:
//!
//! | Method | Path                                | Action          |
//! |--------|-------------------------------------|-----------------|
//! | POST   | `/artifacts/{package}/{version}`    | Upload          |
//! | GET    | `/artifacts/{package}/{version}`    | Download        |
//! | GET    | `/packages[?search=q]`              | List / search   |
//! | GET    | `/packages/{package}`               | Package info    |
//! | DELETE | `/artifacts/{package}/{version}`    | Delete version  |
//! | POST   | `/gc`                               | Garbage collect |
//!
//! ## Middleware stack (outermost first)
//!
//! ```text
//! request id → request log → bearer auth → handler
//! ```
//!
//! Health probes (`/health/*`) are mounted outside the auth layer so
//! orchestrators can reach them without credentials. Every error body is
//! JSON `{error, code, message}`, including unknown-route 404s and
//! wrong-method 405s.

pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod middleware;
pub mod routes;
pub mod service;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Router};
use tracing::warn;

use crate::auth::TokenAuth;
use crate::error::error_response;
use crate::state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState, auth: TokenAuth) -> Router {
    // Authenticated API surface. The JSON fallbacks sit inside the auth
    // layer: an unknown path or wrong method still requires a token, and
    // still answers in the error wire format.
    let api = Router::new()
        .merge(routes::artifacts::router())
        .merge(routes::packages::router())
        .merge(routes::gc::router())
        .fallback(unknown_route)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(from_fn(auth::auth_middleware))
        .layer(Extension(auth))
        .with_state(state.clone());

    // Unauthenticated health probes.
    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(state);

    Router::new()
        .merge(health)
        .merge(api)
        .layer(from_fn(middleware::logging_middleware))
        .layer(from_fn(middleware::request_id_middleware))
}

async fn unknown_route() -> Response {
    error_response(StatusCode::NOT_FOUND, "route not found")
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}

/// Liveness: the process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness: the catalog answers queries.
async fn readiness(State(state): State<AppState>) -> Response {
    match state.service.ready().await {
        Ok(()) => (StatusCode::OK, "ready").into_response(),
        Err(err) => {
            warn!(error = %err, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "catalog unreachable").into_response()
        }
    }
}
