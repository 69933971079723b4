//! Gateway error taxonomy.
//!
//! Every failure a handler can hit is translated into an HTTP response at
//! the handler boundary; nothing escalates to a process crash. Upstream
//! rejections (non-2xx with a body) are not errors in this taxonomy — they
//! are relayed verbatim by the relay path.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::observability::metrics;

/// Failures raised locally by the gateway, before or instead of an
/// upstream response.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No `Authorization` header on a route that enforces one. Raised
    /// before any upstream contact.
    #[error("Authentication credentials were not provided.")]
    Unauthenticated,

    /// A required inbound parameter is missing or malformed.
    #[error("{0}")]
    BadRequest(String),

    /// No structured upstream response at all: connect refused, timeout,
    /// DNS failure, or a broken connection mid-response.
    #[error("{0}")]
    UpstreamUnreachable(String),

    /// A buffered binary download exceeded the configured limit.
    #[error("upstream response exceeded the configured download limit")]
    DownloadTooLarge,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Authentication credentials were not provided."})),
            )
                .into_response(),
            GatewayError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({"message": message}))).into_response()
            }
            GatewayError::UpstreamUnreachable(message) => {
                metrics::record_upstream_failure("unreachable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"message": message})),
                )
                    .into_response()
            }
            GatewayError::DownloadTooLarge => {
                metrics::record_upstream_failure("download_too_large");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"message": "upstream response exceeded the configured download limit"})),
                )
                    .into_response()
            }
        }
    }
}
