//! Service middleware for request metrics.
//!
//! ## Metrics Exposed
//!
//! - `machine_view_requests` - path, method, status and latency per request

use axum::{extract::Request, middleware::Next, response::Response};
use regex_lite::Regex;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::info;

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "machine_view::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

fn uuid_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").ok()
        })
        .as_ref()
}

/// Normalize path for metrics to avoid high cardinality.
///
/// Slice ids are caller-chosen strings, so everything after
/// `/api/slices/` collapses to `:id`; UUIDs elsewhere do too.
fn normalize_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("/api/slices/") {
        if !rest.is_empty() {
            return "/api/slices/:id".to_string();
        }
    }

    match uuid_pattern() {
        Some(pattern) => pattern.replace_all(path, ":id").to_string(),
        None => path.to_string(),
    }
}
