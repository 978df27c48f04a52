//! Service middleware for metrics and request correlation.
//!
//! ## Metrics Emitted
//!
//! Metrics are `tracing` events under the `forum_kernel::metrics` target, so
//! they can be aggregated from logs:
//!
//! - `request_metric` - path pattern, method, status, latency
//! - `vote_metric` - target kind and resulting score
//! - `auth_metric` - viewer token verification outcome

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{info, info_span, Instrument};

/// Header carrying the request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "forum_kernel::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

/// Correlation middleware.
///
/// Reuses an incoming `X-Request-Id` or mints a v4 UUID, stores it on the
/// request so handlers can echo it in error bodies, runs the request inside
/// a span carrying it, and returns it on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        request.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let method = request.method().clone();
    let uri = request.uri().path().to_string();
    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %uri,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let mut response = next.run(request).instrument(span.clone()).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();
    span.record("status", status);
    span.record("latency_ms", latency.as_millis() as u64);

    info!(
        target: "forum_kernel::access",
        request_id = %request_id,
        method = %method,
        path = %uri,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Normalize path for metrics to avoid high cardinality.
///
/// Numeric id segments become `:id`. Topic slugs and usernames are left as
/// they are; both come from small, slow-growing sets.
fn normalize_path(path: &str) -> String {
    static NUMERIC_SEGMENT: OnceLock<Option<regex_lite::Regex>> = OnceLock::new();
    let regex = NUMERIC_SEGMENT.get_or_init(|| regex_lite::Regex::new(r"/[0-9]+(/|$)").ok());

    match regex {
        Some(regex) => regex.replace_all(path, "/:id$1").to_string(),
        None => path.to_string(),
    }
}

/// Record a vote outcome.
pub fn record_vote(target: &'static str, score: i64) {
    info!(
        target: "forum_kernel::metrics",
        metric_type = "vote",
        vote_target = target,
        score = score,
        "vote_metric"
    );
}

/// Record a viewer token verification.
pub fn record_viewer_auth(valid: bool) {
    let result = if valid { "valid" } else { "invalid" };
    info!(
        target: "forum_kernel::metrics",
        metric_type = "viewer_auth",
        result = result,
        "auth_metric"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_replaces_ids() {
        assert_eq!(normalize_path("/posts/42"), "/posts/:id");
        assert_eq!(normalize_path("/posts/42/vote"), "/posts/:id/vote");
        assert_eq!(normalize_path("/comments/7/vote"), "/comments/:id/vote");
    }

    #[test]
    fn test_normalize_path_preserves_regular_path() {
        assert_eq!(normalize_path("/health/ready"), "/health/ready");
        assert_eq!(normalize_path("/topics/web-development"), "/topics/web-development");
    }
}
