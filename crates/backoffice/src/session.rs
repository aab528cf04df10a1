//! Dual-store session credentials for the backoffice.
//!
//! The bearer token for the external POS ME API is held in two per-browser
//! locations: the server session record (persistent copy, survives browser
//! restarts through the session cookie) and a plain `auth_token` cookie with
//! a bounded ~30-day lifetime. A browser session is authenticated only when
//! both copies are present and equal-or-reconciled.
//!
//! All reconciliation logic lives in the pure [`reconcile`] function so the
//! inherent raciness of reading two independent stores is isolated to one
//! place rather than scattered across handlers:
//!
//! - copies differ: the cookie is authoritative, the persistent copy is
//!   corrected to match
//! - cookie absent but persistent copy present: stale, both purged
//! - persistent copy absent: unauthenticated, lingering cookies removed
//!
//! [`SessionStore`] is the only code that touches the session record or the
//! auth cookies.

use axum::http::HeaderMap;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use posme_core::StaffUser;

/// Session record key holding the persistent copy.
pub const AUTH_STORAGE_KEY: &str = "auth_storage";

/// Cookie holding the bearer token copy.
pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// Cookie holding the cached staff record (percent-encoded JSON).
pub const AUTH_USER_COOKIE: &str = "auth_user";

/// Auth cookie lifetime in days.
const AUTH_COOKIE_DAYS: i64 = 30;

/// Errors from the underlying session record.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store error: {0}")]
    Store(#[from] tower_sessions::session::Error),
}

/// The persisted authentication state.
///
/// Only these fields survive across requests; loading/error state never does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffAuth {
    pub token: String,
    pub user: StaffUser,
    pub is_authenticated: bool,
}

impl StaffAuth {
    #[must_use]
    pub const fn new(token: String, user: StaffUser) -> Self {
        Self {
            token,
            user,
            is_authenticated: true,
        }
    }
}

/// Three-state session status consumed by router guards.
///
/// `Unknown` means the session infrastructure was not available for this
/// request. Guards must not treat it as `Unauthenticated`: redirect decisions
/// wait until the status is known.
#[derive(Debug, Clone)]
pub enum SessionStatus {
    Unknown,
    Authenticated(StaffAuth),
    Unauthenticated,
}

/// Outcome of reconciling the two token copies.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// Both copies agree. `corrected` is set when the cookie value won over
    /// a divergent persistent copy and the persistent copy must be rewritten.
    Valid { auth: StaffAuth, corrected: bool },
    /// One copy is missing: fail closed, purge whatever remains.
    Purge,
    /// Neither copy present.
    Anonymous,
}

/// Reconcile the persistent copy against the cookie copy.
///
/// Pure function; the async [`SessionStore`] wrappers only move data in and
/// out of the session record and cookie headers.
#[must_use]
pub fn reconcile(
    persistent: Option<StaffAuth>,
    cookie_token: Option<&str>,
    cookie_user: Option<StaffUser>,
) -> Reconciliation {
    match (persistent, cookie_token) {
        (None, None) => Reconciliation::Anonymous,
        // Stale persistent copy, or an orphaned cookie without a session
        // record: the both-copies rule fails either way.
        (Some(_), None) | (None, Some(_)) => Reconciliation::Purge,
        (Some(auth), Some(cookie)) if auth.token == cookie => Reconciliation::Valid {
            auth,
            corrected: false,
        },
        (Some(auth), Some(cookie)) => {
            // Divergence: the cookie is the more recent write and wins.
            let user = cookie_user.unwrap_or(auth.user);
            Reconciliation::Valid {
                auth: StaffAuth::new(cookie.to_string(), user),
                corrected: true,
            }
        }
    }
}

/// Result of [`SessionStore::read`].
#[derive(Debug, Clone)]
pub enum ReadOutcome {
    Authenticated(StaffAuth),
    /// No credentials at all.
    Anonymous,
    /// The copies failed the both-copies rule; the persistent copy has been
    /// cleared and the response should carry [`removal_cookies`].
    Purged,
}

/// Single point of access to both token copies.
pub struct SessionStore {
    session: Session,
    cookie_token: Option<String>,
    cookie_user: Option<StaffUser>,
}

impl SessionStore {
    /// Build a store from the request's session handle and headers.
    #[must_use]
    pub fn from_parts(session: Session, headers: &HeaderMap) -> Self {
        let cookie_token = request_cookie(headers, AUTH_TOKEN_COOKIE);
        let cookie_user = request_cookie(headers, AUTH_USER_COOKIE)
            .and_then(|raw| serde_json::from_str(&raw).ok());

        Self {
            session,
            cookie_token,
            cookie_user,
        }
    }

    /// Read the reconciled credentials, applying the divergence rule.
    ///
    /// Performs a correcting write to the persistent copy when the cookie
    /// held a different value, and clears the persistent copy when the
    /// both-copies rule fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the session record cannot be read or written.
    pub async fn read(&self) -> Result<ReadOutcome, SessionError> {
        let persistent: Option<StaffAuth> = self.session.get(AUTH_STORAGE_KEY).await?;

        match reconcile(
            persistent,
            self.cookie_token.as_deref(),
            self.cookie_user.clone(),
        ) {
            Reconciliation::Valid { auth, corrected } => {
                if corrected {
                    self.session.insert(AUTH_STORAGE_KEY, &auth).await?;
                }
                Ok(ReadOutcome::Authenticated(auth))
            }
            Reconciliation::Purge => {
                self.session.remove::<StaffAuth>(AUTH_STORAGE_KEY).await?;
                Ok(ReadOutcome::Purged)
            }
            Reconciliation::Anonymous => Ok(ReadOutcome::Anonymous),
        }
    }

    /// Read as a three-state status; store failures map to `Unknown`.
    pub async fn status(&self) -> SessionStatus {
        match self.read().await {
            Ok(ReadOutcome::Authenticated(auth)) => SessionStatus::Authenticated(auth),
            Ok(ReadOutcome::Anonymous | ReadOutcome::Purged) => SessionStatus::Unauthenticated,
            Err(e) => {
                tracing::error!(error = %e, "Session read failed");
                SessionStatus::Unknown
            }
        }
    }

    /// Whether both copies are present, without reconciling.
    pub async fn is_valid(&self) -> bool {
        let persistent: Option<StaffAuth> = self.session.get(AUTH_STORAGE_KEY).await.ok().flatten();
        persistent.is_some() && self.cookie_token.is_some()
    }

    /// Write the token and staff record to both copies.
    ///
    /// Returns the cookies the response must set.
    ///
    /// # Errors
    ///
    /// Returns an error if the session record cannot be written.
    pub async fn write(
        &self,
        token: String,
        user: StaffUser,
        secure: bool,
    ) -> Result<(StaffAuth, [Cookie<'static>; 2]), SessionError> {
        let auth = StaffAuth::new(token, user);
        self.session.insert(AUTH_STORAGE_KEY, &auth).await?;
        let cookies = auth_cookies(&auth, secure);
        Ok((auth, cookies))
    }

    /// Remove token and user from both copies unconditionally.
    ///
    /// Returns the removal cookies the response must set. The session record
    /// is cleared best-effort; a store failure is logged but does not keep
    /// the caller authenticated.
    pub async fn clear(&self) -> [Cookie<'static>; 2] {
        if let Err(e) = self.session.remove::<StaffAuth>(AUTH_STORAGE_KEY).await {
            tracing::error!(error = %e, "Failed to clear session record");
        }
        removal_cookies()
    }
}

/// Build the auth cookie pair for a login or correcting write.
#[must_use]
pub fn auth_cookies(auth: &StaffAuth, secure: bool) -> [Cookie<'static>; 2] {
    let user_json = serde_json::to_string(&auth.user).unwrap_or_default();
    [
        auth_cookie(AUTH_TOKEN_COOKIE, auth.token.clone(), secure),
        auth_cookie(
            AUTH_USER_COOKIE,
            urlencoding::encode(&user_json).into_owned(),
            secure,
        ),
    ]
}

/// Build the removal pair that expires both auth cookies.
#[must_use]
pub fn removal_cookies() -> [Cookie<'static>; 2] {
    [
        removal_cookie(AUTH_TOKEN_COOKIE),
        removal_cookie(AUTH_USER_COOKIE),
    ]
}

/// Append `Set-Cookie` headers to a response.
pub fn apply_cookies(response: &mut Response, cookies: &[Cookie<'static>]) {
    for cookie in cookies {
        if let Ok(value) = cookie.to_string().parse() {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
}

fn auth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .same_site(SameSite::Lax)
        .http_only(true)
        .secure(secure)
        .max_age(Duration::days(AUTH_COOKIE_DAYS))
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .build()
}

/// Extract a cookie value from the request's `Cookie` headers.
fn request_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
        .next()
        .map(|raw| urlencoding::decode(&raw).map_or(raw.clone(), |s| s.into_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn staff_user() -> StaffUser {
        serde_json::from_value(serde_json::json!({
            "id": "s_1",
            "email": "staff@posme.app",
            "branch": "Central",
            "created_at": "2025-01-02T03:04:05Z",
            "updated_at": "2025-01-02T03:04:05Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_reconcile_both_absent() {
        assert_eq!(reconcile(None, None, None), Reconciliation::Anonymous);
    }

    #[test]
    fn test_reconcile_equal_copies() {
        let auth = StaffAuth::new("tok".to_string(), staff_user());
        let result = reconcile(Some(auth.clone()), Some("tok"), None);
        assert_eq!(
            result,
            Reconciliation::Valid {
                auth,
                corrected: false
            }
        );
    }

    #[test]
    fn test_reconcile_cookie_wins_on_divergence() {
        let auth = StaffAuth::new("old".to_string(), staff_user());
        let result = reconcile(Some(auth), Some("new"), None);
        match result {
            Reconciliation::Valid { auth, corrected } => {
                assert_eq!(auth.token, "new");
                assert!(corrected);
            }
            other => panic!("expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn test_reconcile_divergence_is_stable_after_correction() {
        // After the correcting write, the persistent copy matches the cookie
        // and a second read returns the same value without further writes.
        let auth = StaffAuth::new("old".to_string(), staff_user());
        let Reconciliation::Valid {
            auth: corrected, ..
        } = reconcile(Some(auth), Some("new"), None)
        else {
            panic!("expected Valid");
        };

        let result = reconcile(Some(corrected.clone()), Some("new"), None);
        assert_eq!(
            result,
            Reconciliation::Valid {
                auth: corrected,
                corrected: false
            }
        );
    }

    #[test]
    fn test_reconcile_stale_persistent_purges() {
        let auth = StaffAuth::new("tok".to_string(), staff_user());
        assert_eq!(reconcile(Some(auth), None, None), Reconciliation::Purge);
    }

    #[test]
    fn test_reconcile_orphan_cookie_purges() {
        assert_eq!(reconcile(None, Some("tok"), None), Reconciliation::Purge);
    }

    #[test]
    fn test_reconcile_takes_user_from_cookie_on_divergence() {
        let mut other = staff_user();
        other.email = "other@posme.app".to_string();

        let auth = StaffAuth::new("old".to_string(), staff_user());
        let Reconciliation::Valid { auth: winner, .. } =
            reconcile(Some(auth), Some("new"), Some(other.clone()))
        else {
            panic!("expected Valid");
        };
        assert_eq!(winner.user, other);
    }

    #[test]
    fn test_request_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("posme_session=abc; auth_token=tok-123; other=x"),
        );

        assert_eq!(
            request_cookie(&headers, AUTH_TOKEN_COOKIE),
            Some("tok-123".to_string())
        );
        assert_eq!(request_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let auth = StaffAuth::new("tok".to_string(), staff_user());
        let [token_cookie, user_cookie] = auth_cookies(&auth, true);

        assert_eq!(token_cookie.name(), AUTH_TOKEN_COOKIE);
        assert_eq!(token_cookie.value(), "tok");
        assert_eq!(token_cookie.path(), Some("/"));
        assert_eq!(token_cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(token_cookie.secure(), Some(true));
        assert_eq!(
            token_cookie.max_age(),
            Some(Duration::days(AUTH_COOKIE_DAYS))
        );

        // User cookie round-trips through percent-encoding
        let decoded = urlencoding::decode(user_cookie.value()).unwrap();
        let user: StaffUser = serde_json::from_str(&decoded).unwrap();
        assert_eq!(user, auth.user);
    }

    #[test]
    fn test_removal_cookies_expire_immediately() {
        for cookie in removal_cookies() {
            assert_eq!(cookie.max_age(), Some(Duration::ZERO));
            assert!(cookie.value().is_empty());
        }
    }

    // ========================================================================
    // SessionStore over a real (in-memory) session record
    // ========================================================================

    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    fn memory_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn headers_with_token(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = format!("{AUTH_TOKEN_COOKIE}={token}");
        headers.insert(COOKIE, value.parse().expect("cookie header"));
        headers
    }

    #[tokio::test]
    async fn test_write_then_read_with_matching_cookie() {
        let session = memory_session();

        let store = SessionStore::from_parts(session.clone(), &HeaderMap::new());
        let (auth, _cookies) = store
            .write("tok".to_string(), staff_user(), false)
            .await
            .expect("write");
        assert!(auth.is_authenticated);

        // The next request presents the cookie copy alongside the record
        let store = SessionStore::from_parts(session, &headers_with_token("tok"));
        assert!(store.is_valid().await);
        match store.read().await.expect("read") {
            ReadOutcome::Authenticated(read) => assert_eq!(read.token, "tok"),
            other => panic!("expected Authenticated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_read_corrects_persistent_copy_from_cookie() {
        let session = memory_session();

        let store = SessionStore::from_parts(session.clone(), &HeaderMap::new());
        store
            .write("old".to_string(), staff_user(), false)
            .await
            .expect("write");

        // Divergent cookie wins and the record is rewritten to match
        let store = SessionStore::from_parts(session.clone(), &headers_with_token("new"));
        match store.read().await.expect("read") {
            ReadOutcome::Authenticated(read) => assert_eq!(read.token, "new"),
            other => panic!("expected Authenticated, got {other:?}"),
        }

        let persistent: Option<StaffAuth> = session
            .get(AUTH_STORAGE_KEY)
            .await
            .expect("session get");
        assert_eq!(persistent.expect("persistent copy").token, "new");
    }

    #[tokio::test]
    async fn test_read_purges_record_when_cookie_is_missing() {
        let session = memory_session();

        let store = SessionStore::from_parts(session.clone(), &HeaderMap::new());
        store
            .write("tok".to_string(), staff_user(), false)
            .await
            .expect("write");

        // Stale: record present, cookie gone
        let store = SessionStore::from_parts(session.clone(), &HeaderMap::new());
        assert!(!store.is_valid().await);
        assert!(matches!(
            store.read().await.expect("read"),
            ReadOutcome::Purged
        ));

        // Record is gone too; the next read is plain anonymous
        assert!(matches!(
            store.read().await.expect("read"),
            ReadOutcome::Anonymous
        ));
    }

    #[tokio::test]
    async fn test_clear_removes_record_unconditionally() {
        let session = memory_session();

        let store = SessionStore::from_parts(session.clone(), &headers_with_token("tok"));
        store
            .write("tok".to_string(), staff_user(), false)
            .await
            .expect("write");

        let cookies = store.clear().await;
        assert_eq!(cookies.len(), 2);
        assert!(!store.is_valid().await);
    }
}
