//! Client-side caching with entity tags
//!
//! Successful responses get `Cache-Control: private, max-age=<n>` and an
//! `ETag` derived from the body. A request whose `If-None-Match` matches the
//! fresh tag gets `304 Not Modified` with no body.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};

/// How long clients may reuse a cached report
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub max_age_seconds: u64,
}

impl CachePolicy {
    pub fn new(max_age_seconds: u64) -> Self {
        Self { max_age_seconds }
    }

    fn cache_control(&self) -> String {
        format!("private, max-age={}", self.max_age_seconds)
    }
}

/// Strong entity tag of a response body
pub fn entity_tag(body: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(body)))
}

/// True if any tag in an `If-None-Match` header matches `etag`
fn matches_if_none_match(headers: &HeaderMap, etag: &str) -> bool {
    let opaque = etag.trim_start_matches("W/");
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == opaque)
}

/// Middleware: tag successful responses and answer conditional requests
pub async fn client_cache_with_etag(
    State(policy): State<CachePolicy>,
    request: Request,
    next: Next,
) -> Response {
    let request_headers = request.headers().clone();
    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("Failed to buffer response body: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let etag = entity_tag(&bytes);
    let (Ok(etag_value), Ok(cache_control)) = (
        HeaderValue::from_str(&etag),
        HeaderValue::from_str(&policy.cache_control()),
    ) else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    if matches_if_none_match(&request_headers, &etag) {
        tracing::debug!(etag = %etag, "Client copy is current");
        return (
            StatusCode::NOT_MODIFIED,
            [(header::ETAG, etag_value), (header::CACHE_CONTROL, cache_control)],
        )
            .into_response();
    }

    parts.headers.insert(header::ETAG, etag_value);
    parts.headers.insert(header::CACHE_CONTROL, cache_control);
    Response::from_parts(parts, Body::from(bytes))
}
