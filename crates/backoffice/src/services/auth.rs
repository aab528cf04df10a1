//! Login/logout orchestration over the API client and the session store.
//!
//! The session controller semantics live here: a successful login ends
//! authenticated with both token copies written; a failed login surfaces the
//! server's message and leaves the browser unauthenticated; logout always
//! ends unauthenticated with both copies cleared, whatever the upstream call
//! does - it cannot fail from the caller's perspective.

use thiserror::Error;
use tower_sessions::cookie::Cookie;
use tracing::instrument;

use crate::posme::{ApiClient, ApiError};
use crate::session::{ReadOutcome, SessionError, SessionStore, StaffAuth};

/// Errors surfaced by the auth service.
#[derive(Debug, Error)]
pub enum AuthServiceError {
    /// Login rejected or unreachable; the message is user-facing.
    #[error("{0}")]
    Login(String),

    /// The session record could not be written after a successful login.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// Log in against the upstream API and write both token copies.
///
/// Returns the authenticated state and the cookies the response must set.
///
/// # Errors
///
/// Returns `AuthServiceError::Login` with the server-provided message (or
/// "Login failed") when the upstream rejects the credentials or is
/// unreachable, and `AuthServiceError::Session` if the session record cannot
/// be written afterwards.
#[instrument(skip_all, fields(email = %email))]
pub async fn login(
    client: &ApiClient,
    store: &SessionStore,
    email: &str,
    password: &str,
    secure_cookies: bool,
) -> Result<(StaffAuth, [Cookie<'static>; 2]), AuthServiceError> {
    let response = client
        .login(email, password)
        .await
        .map_err(|e| AuthServiceError::Login(login_message(&e)))?;

    let (auth, cookies) = store
        .write(response.token, response.staff_user, secure_cookies)
        .await?;

    tracing::info!(staff_id = %auth.user.id, branch = %auth.user.branch, "Staff logged in");
    Ok((auth, cookies))
}

/// Log out: best-effort upstream notification, then unconditionally clear
/// both token copies.
///
/// Always terminal-successful client-side; returns the removal cookies the
/// response must set.
#[instrument(skip_all)]
pub async fn logout(client: &ApiClient, store: &SessionStore) -> [Cookie<'static>; 2] {
    if let Ok(ReadOutcome::Authenticated(auth)) = store.read().await {
        // Failure inside is logged, not surfaced
        client.logout(&auth.token).await;
    }

    store.clear().await
}

/// User-facing message for a failed login.
fn login_message(err: &ApiError) -> String {
    match err {
        ApiError::Status {
            message: Some(message),
            ..
        } => message.clone(),
        _ => {
            tracing::warn!(error = %err, "Login attempt failed without a server message");
            "Login failed".to_string()
        }
    }
}
