//! Feed error types with HTTP status code mapping.
//!
//! [`FeedError`] is the central error type for the service. The feed is
//! designed to degrade rather than fail: malformed cursors and per-source
//! fetch failures are absorbed upstream, and the request contract is
//! lenient (clamped limits, fallback filter), so only genuine internal
//! faults reach a client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// JSON body returned for any failed request.
///
/// ```json
/// { "success": false, "error": "internal server error" }
/// ```
///
/// The message is intentionally generic for 5xx responses; the full error
/// is logged server-side only.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false` on the error path.
    pub success: bool,
    /// Human-readable error message.
    pub error: String,
}

/// Server-side error enum with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// A content store query failed.
    ///
    /// Individual source failures inside a feed request are recovered
    /// locally; this variant surfaces only when a store fails in a
    /// context with no fallback (e.g. batched enrichment lookups).
    #[error("store error: {0}")]
    Store(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FeedError {
    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message exposed to the client.
    ///
    /// All variants collapse to a generic string so that internal detail
    /// never leaks into a response body.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Store(_) | Self::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl From<sqlx::Error> for FeedError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "feed request failed");
        }
        let body = ErrorResponse {
            success: false,
            error: self.client_message(),
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_do_not_leak_detail() {
        let err = FeedError::Internal("connection pool exhausted at 10.0.0.3".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "internal server error");
    }

    #[test]
    fn store_errors_map_to_500() {
        let err = FeedError::Store("relation missing".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "internal server error");
    }
}
