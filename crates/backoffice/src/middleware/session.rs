//! Session middleware configuration.
//!
//! Sets up in-memory sessions using tower-sessions. The session record holds
//! the persistent copy of the auth credentials (see `crate::session`) and the
//! per-dialog transaction draft. There is no database anywhere in this
//! system, so a process restart simply fails closed: the surviving cookie
//! copy no longer has a matching record and the next request purges it.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::BackofficeConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "posme_session";

/// Session expiry time in seconds (30 days, matching the auth cookie pair).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &BackofficeConfig) -> SessionManagerLayer<MemoryStore> {
    let store = MemoryStore::default();

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.cookies_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
