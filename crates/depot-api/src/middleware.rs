//! Request-scoped middleware: request ids and the request log.

use std::time::Instant;

use axum::extract::Request;
use axum::http::header::CONTENT_LENGTH;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id assigned by the outermost middleware layer.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Assign a UUID to the request, echo it as `X-Request-ID` on the
/// response, and run the rest of the stack inside a tracing span carrying
/// it — so any log line emitted while handling the request (including
/// error mapping) is attributable.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    request.extensions_mut().insert(RequestId(id.clone()));

    let span = tracing::info_span!("request", request_id = %id);
    let mut response = next.run(request).instrument(span).await;

    let header_value =
        HeaderValue::from_str(&id).expect("hyphenated uuid is a valid header value");
    response
        .headers_mut()
        .insert(HeaderName::from_static(REQUEST_ID_HEADER), header_value);
    response
}

/// Emit one structured log line per request: method, path, status,
/// response bytes, latency, request id.
///
/// Byte counts come from the response `Content-Length`; a streamed
/// response that dies mid-body still logs its declared length.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let response = next.run(request).await;

    let bytes = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(0);

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        bytes,
        latency_ms = start.elapsed().as_millis() as u64,
        "request"
    );

    response
}
