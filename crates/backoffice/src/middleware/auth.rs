//! Authentication extractors and the global 401 response layer.
//!
//! Provides extractors for requiring staff authentication in route handlers,
//! and the cross-cutting layer that reacts to an upstream 401 by purging the
//! session before the tagged redirect leaves the server.

use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::ForceLogin;
use crate::session::{
    ReadOutcome, SessionStatus, SessionStore, StaffAuth, apply_cookies, removal_cookies,
};

/// Extractor that requires staff authentication.
///
/// Reconciles both token copies on every request (the correcting write to the
/// persistent copy happens here). If the browser session is not
/// authenticated, returns a redirect to the login page for HTML requests or
/// 401 for API requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireStaffAuth(auth): RequireStaffAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.email)
/// }
/// ```
pub struct RequireStaffAuth(pub StaffAuth);

/// Error returned when staff authentication is required but missing.
pub enum StaffAuthRejection {
    /// Redirect to login page (for HTML requests). When `purge` is set the
    /// copies failed the both-copies rule and the auth cookies are expired
    /// on the way out.
    RedirectToLogin { purge: bool },
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Session infrastructure unavailable: status is unknown, so no redirect
    /// decision is made.
    SessionUnavailable,
}

impl IntoResponse for StaffAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { purge } => {
                let mut response = Redirect::to("/login").into_response();
                if purge {
                    apply_cookies(&mut response, &removal_cookies());
                }
                response
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::SessionUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Session service unavailable",
            )
                .into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireStaffAuth
where
    S: Send + Sync,
{
    type Rejection = StaffAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Err(StaffAuthRejection::SessionUnavailable);
        };

        let store = SessionStore::from_parts(session, &parts.headers);
        let is_api = parts.uri.path().starts_with("/api/");

        match store.read().await {
            Ok(ReadOutcome::Authenticated(auth)) => Ok(Self(auth)),
            Ok(ReadOutcome::Purged) => Err(if is_api {
                StaffAuthRejection::Unauthorized
            } else {
                StaffAuthRejection::RedirectToLogin { purge: true }
            }),
            Ok(ReadOutcome::Anonymous) => Err(if is_api {
                StaffAuthRejection::Unauthorized
            } else {
                StaffAuthRejection::RedirectToLogin { purge: false }
            }),
            Err(e) => {
                tracing::error!(error = %e, "Session read failed during auth");
                Err(StaffAuthRejection::SessionUnavailable)
            }
        }
    }
}

/// Extractor that optionally gets the authenticated staff.
///
/// Unlike `RequireStaffAuth`, this does not reject unauthenticated requests.
/// Used by the login page to skip straight to the member list when a valid
/// session already exists.
pub struct OptionalStaffAuth(pub Option<StaffAuth>);

impl<S> FromRequestParts<S> for OptionalStaffAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = match parts.extensions.get::<Session>().cloned() {
            Some(session) => {
                let store = SessionStore::from_parts(session, &parts.headers);
                match store.read().await {
                    Ok(ReadOutcome::Authenticated(auth)) => Some(auth),
                    _ => None,
                }
            }
            None => None,
        };

        Ok(Self(auth))
    }
}

impl<S> FromRequestParts<S> for SessionStatus
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    /// Extract the three-state session status for router guards.
    ///
    /// `Unknown` (session layer missing or unreadable) is not a redirect
    /// decision; guards that see it must not bounce the browser anywhere.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Ok(Self::Unknown);
        };

        let store = SessionStore::from_parts(session, &parts.headers);
        Ok(store.status().await)
    }
}

/// Response layer completing the global 401 handling.
///
/// `AppError` turns an upstream 401 into a login redirect tagged with
/// [`ForceLogin`] and expired auth cookies; the one thing `IntoResponse`
/// cannot do is clear the server-side session record. This layer does that,
/// for every call site transparently.
pub async fn force_login_on_unauthorized(
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if response.extensions().get::<ForceLogin>().is_some() {
        if let Err(e) = session
            .remove::<StaffAuth>(crate::session::AUTH_STORAGE_KEY)
            .await
        {
            tracing::error!(error = %e, "Failed to purge session record after upstream 401");
        }
    }

    response
}
