//! Axum middleware layers applied to the router.
//!
//! Includes request tracing, timeout enforcement, body limits, and response
//! compression.

use std::time::Duration;

use axum::{body::Body, http::Request};
use tracing::Span;

/// Default per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 256 * 1024;

/// Span for one HTTP request.
///
/// Records the path only: checkout links carry the token in the query string.
pub fn request_span(req: &Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %req.method(),
        path = %req.uri().path(),
    )
}

