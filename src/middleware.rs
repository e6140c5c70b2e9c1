use std::time::Instant;
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Request ID header name
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID supplied by the caller, or a fresh UUID v4
pub fn request_id_from(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Wraps each request in a span carrying its request ID
///
/// The ID is taken from `x-request-id` when present, generated otherwise, and
/// echoed back on the response so callers can correlate server logs.
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request_id_from(request.headers());
    let header_value = HeaderValue::from_str(&request_id).ok();

    if let Some(value) = &header_value {
        request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    let span = tracing::info_span!(
        "http_request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
    );

    let start_time = Instant::now();

    let mut response = next.run(request).instrument(span.clone()).await;

    let duration_ms = start_time.elapsed().as_millis() as u64;
    let status = response.status();

    span.in_scope(|| {
        if status.is_success() {
            info!(status = status.as_u16(), duration_ms, "Request completed");
        } else {
            warn!(status = status.as_u16(), duration_ms, "Request completed with error status");
        }
    });

    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
