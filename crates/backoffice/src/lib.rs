//! POS ME Backoffice library.
//!
//! This crate provides the backoffice functionality as a library, allowing
//! it to be tested and reused.
//!
//! # Security
//!
//! This binary holds no data of its own: every member, transaction, and
//! staff record lives in the external POS ME backend, reached with the
//! per-browser bearer token. The only state here is the per-session
//! credential pair and the open dialog draft.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod composer;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod posme;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;

use axum::{Router, routing::get};

use state::AppState;

/// Build the full backoffice application.
///
/// The session layer and the 401 response layer are part of the app so that
/// in-process tests exercise the same stack the binary serves.
#[must_use]
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .layer(axum::middleware::from_fn(
            middleware::force_login_on_unauthorized,
        ))
        .layer(session_layer)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
