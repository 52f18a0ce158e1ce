//! Error types for the HTTP layer.
//!
//! [`ApiError`] covers everything a request handler can fail with and
//! converts into an Axum response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. The
//! body always has the shape `{"ok": false, "detail": "..."}` so that
//! the control page can treat every failure the same way.
//!
//! A rejected display mode is a reported outcome rather than a protocol
//! error: it keeps status 200 and only `ok` tells the caller it failed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use waitboard_core::InvalidModeError;

/// Errors that can occur while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A form field was missing or malformed.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The requested display mode does not exist. Answered with 200.
    #[error(transparent)]
    InvalidMode(#[from] InvalidModeError),

    /// A page template failed to render.
    #[error("template error: {0}")]
    Template(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidMode(_) => StatusCode::OK,
            Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "ok": false,
            "detail": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
