//! HTTP route handlers for the backoffice.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to /members or /login by session status
//! GET  /health                 - Health check
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! POST /logout                 - Logout action
//! GET  /clear-auth             - Purge both token copies, go to login
//!
//! # Members
//! GET  /members                - Member list with search and pagination
//! POST /members                - Register a new member
//!
//! # Points dialog (HTMX fragments)
//! POST /members/points/{action}/open - Open an earn/redeem dialog (fresh draft)
//! POST /members/points/add           - Add one bottle to the draft
//! POST /members/points/remove        - Remove one bottle from the draft
//! POST /members/points/submit        - Submit the draft as one transaction
//! POST /members/points/close         - Discard the draft
//!
//! # Transactions
//! GET  /transactions           - Branch transaction history
//! ```

pub mod auth;
pub mod members;
pub mod transactions;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all routes for the backoffice.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::index))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/clear-auth", get(auth::clear_auth))
        .route("/members", get(members::index).post(members::create))
        .route(
            "/members/points/{action}/open",
            post(transactions::open_dialog),
        )
        .route("/members/points/add", post(transactions::add_bottle))
        .route("/members/points/remove", post(transactions::remove_bottle))
        .route("/members/points/submit", post(transactions::submit))
        .route("/members/points/close", post(transactions::close_dialog))
        .route("/transactions", get(transactions::index))
}
