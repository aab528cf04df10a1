//! Integration tests for POS ME web.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p posme-integration-tests
//! ```
//!
//! All tests are self-contained: each one spins up the app under test (and a
//! scripted upstream POS ME API where needed) on an ephemeral port inside the
//! test process. No external services or credentials are required.
//!
//! # Test Categories
//!
//! - `api_client_retry` - retry/backoff and error mapping of the API client
//! - `site_deletion_endpoint` - the account-deletion request endpoint
//! - `backoffice_session` - login, logout, and the dual-store session rules

use std::net::SocketAddr;

use axum::Router;

/// Serve a router on an ephemeral port and return its base URL.
///
/// The server task runs until the test process exits.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr: SocketAddr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server error");
    });

    format!("http://{addr}")
}

/// HTTP client that keeps cookies and does not follow redirects, so tests
/// can assert on redirect responses and Set-Cookie behavior directly.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// A staff user JSON body as the upstream returns it.
#[must_use]
pub fn staff_user_json() -> serde_json::Value {
    serde_json::json!({
        "id": "s_1",
        "email": "staff@posme.app",
        "branch": "Central",
        "created_at": "2025-01-02T03:04:05Z",
        "updated_at": "2025-01-02T03:04:05Z"
    })
}
