//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                             - Landing page
//! GET  /health                       - Health check
//!
//! # Policies
//! GET  /policy/pos-me                - POS ME privacy policy
//! GET  /policy/points-me             - Points ME privacy policy
//!
//! # Account deletion
//! GET  /account-deletion             - Deletion request page
//! POST /api/account-deletion-request - Deletion request endpoint (JSON)
//!
//! # SEO
//! GET  /sitemap.xml
//! GET  /robots.txt
//! ```

pub mod account_deletion;
pub mod home;
pub mod policy;
pub mod seo;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/policy/pos-me", get(policy::pos_me))
        .route("/policy/points-me", get(policy::points_me))
        .route("/account-deletion", get(account_deletion::page))
        .route(
            "/api/account-deletion-request",
            post(account_deletion::submit),
        )
        .route("/sitemap.xml", get(seo::sitemap))
        .route("/robots.txt", get(seo::robots))
}
