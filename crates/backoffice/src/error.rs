//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. A 401 from the upstream API
//! is not a page-level error: it becomes a redirect to the login page tagged
//! with [`ForceLogin`], and the response layer in `middleware::auth` purges
//! the session on the way out. Call sites never special-case it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::posme::ApiError;
use crate::session::{SessionError, apply_cookies, removal_cookies};

/// Marker extension: the response layer must purge the session record before
/// this response leaves the server.
#[derive(Debug, Clone, Copy)]
pub struct ForceLogin;

/// Application-level error type for the backoffice.
#[derive(Debug, Error)]
pub enum AppError {
    /// Upstream POS ME API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Upstream said the session is no longer valid: purge and go to login.
        if matches!(self, Self::Api(ApiError::Unauthorized)) {
            return force_login_response();
        }

        // Capture server errors to Sentry
        if matches!(self, Self::Api(_) | Self::Session(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Api(ApiError::Status { .. }) => StatusCode::BAD_GATEWAY,
            Self::Api(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Api(_) => "External service error".to_string(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Build the tagged purge-and-redirect response for an upstream 401.
///
/// Expires both auth cookies; the session record itself is cleared by the
/// response layer, which sees the [`ForceLogin`] extension.
#[must_use]
pub fn force_login_response() -> Response {
    let mut response = Redirect::to("/login").into_response();
    apply_cookies(&mut response, &removal_cookies());
    response.extensions_mut().insert(ForceLogin);
    response
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
