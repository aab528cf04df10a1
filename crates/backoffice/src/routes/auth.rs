//! Authentication route handlers.
//!
//! Login page and action, logout, and the clear-auth escape hatch that purges
//! stale credentials unconditionally.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::OptionalStaffAuth;
use crate::services;
use crate::session::{SessionStatus, SessionStore, apply_cookies};
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginPageTemplate {
    pub error: Option<String>,
    pub email: String,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Route to the member list or the login page by session status.
///
/// GET /
///
/// `Unknown` is not a redirect decision: without a session status the browser
/// is not bounced anywhere.
pub async fn index(status: SessionStatus) -> Response {
    match status {
        SessionStatus::Authenticated(_) => Redirect::to("/members").into_response(),
        SessionStatus::Unauthenticated => Redirect::to("/login").into_response(),
        SessionStatus::Unknown => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Session service unavailable",
        )
            .into_response(),
    }
}

/// Render the login page.
///
/// GET /login
///
/// An already-authenticated browser is sent straight to the member list.
pub async fn login_page(OptionalStaffAuth(auth): OptionalStaffAuth) -> Response {
    if auth.is_some() {
        return Redirect::to("/members").into_response();
    }

    LoginPageTemplate {
        error: None,
        email: String::new(),
    }
    .into_response()
}

/// Log in against the upstream API.
///
/// POST /login
///
/// On success both token copies are written and the browser goes to the
/// member list; on failure the login page re-renders with the server-provided
/// message.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    axum::Form(form): axum::Form<LoginForm>,
) -> Result<Response> {
    let store = SessionStore::from_parts(session, &headers);
    let email = form.email.trim().to_lowercase();

    match services::auth::login(
        state.api(),
        &store,
        &email,
        &form.password,
        state.config().cookies_secure(),
    )
    .await
    {
        Ok((_auth, cookies)) => {
            let mut response = Redirect::to("/members").into_response();
            apply_cookies(&mut response, &cookies);
            Ok(response)
        }
        Err(services::auth::AuthServiceError::Login(message)) => Ok(LoginPageTemplate {
            error: Some(message),
            email,
        }
        .into_response()),
        Err(services::auth::AuthServiceError::Session(e)) => Err(e.into()),
    }
}

/// Log out and clear both token copies.
///
/// POST /logout
///
/// Always ends unauthenticated, whatever the upstream call does.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Response {
    let store = SessionStore::from_parts(session, &headers);
    let cookies = services::auth::logout(state.api(), &store).await;

    let mut response = Redirect::to("/login").into_response();
    apply_cookies(&mut response, &cookies);
    response
}

/// Purge both token copies without touching the upstream API.
///
/// GET /clear-auth
///
/// Escape hatch for stale credential state.
#[instrument(skip_all)]
pub async fn clear_auth(session: Session, headers: HeaderMap) -> Response {
    let store = SessionStore::from_parts(session, &headers);
    let cookies = store.clear().await;

    tracing::info!("Cleared auth state on request");
    let mut response = Redirect::to("/login").into_response();
    apply_cookies(&mut response, &cookies);
    response
}
