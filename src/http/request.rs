//! Request extraction.
//!
//! # Responsibilities
//! - Parse the query parameters the relay understands (`key`, `prefix`)
//! - Canonicalize the client address (IPv4-mapped IPv6 → IPv4)
//! - Recover the verbatim concrete path after `/channel/{id}/`
//! - Build the per-request tracing span around the request ID
//!
//! # Design Decisions
//! - The concrete path is taken from the raw URI, never re-normalized
//! - Request ID added as early as possible for tracing

use std::net::IpAddr;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request};
use serde::Deserialize;
use tracing::Span;

/// Header carrying the per-request UUID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Query parameters accepted by relay endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayQuery {
    pub key: Option<String>,
    pub prefix: Option<String>,
}

/// Textual client address, with IPv4-mapped IPv6 unwrapped.
pub fn canonical_ip(ip: IpAddr) -> String {
    ip.to_canonical().to_string()
}

/// The `content-type` header, if present and valid text.
pub fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Everything after `/channel/{id}/`, verbatim. `None` when the path has no such suffix.
pub fn concrete_path(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/channel/")?;
    let (channel, suffix) = rest.split_once('/')?;
    (!channel.is_empty()).then_some(suffix)
}

/// Span for one HTTP request, tagged with its request ID.
pub fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::debug_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}
