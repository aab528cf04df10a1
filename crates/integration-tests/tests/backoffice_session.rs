//! End-to-end session tests for the backoffice.
//!
//! Drives the real backoffice app against a scripted upstream POS ME API:
//! login/logout flows, the dual-store cookie rules, the global 401 handling,
//! and the points dialog.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::response::IntoResponse;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get, routing::post};
use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use secrecy::SecretString;
use url::Url;

use posme_backoffice::config::BackofficeConfig;
use posme_backoffice::state::AppState;
use posme_integration_tests::{client, spawn, staff_user_json};

/// Toggles controlling the scripted upstream.
#[derive(Clone, Default)]
struct Upstream {
    members_unauthorized: Arc<AtomicBool>,
    logout_fails: Arc<AtomicBool>,
}

fn member_json() -> serde_json::Value {
    serde_json::json!({
        "id": "m_1",
        "name": "Somsak",
        "last4": "1234",
        "total_points": 12,
        "milestone_score": 3,
        "points_1_0_liter": 12,
        "points_1_5_liter": 0,
        "branch": "Central",
        "status": "active",
        "membership_number": "PM-001",
        "registration_receipt_number": "5-99925",
        "welcome_bonus_claimed": true,
        "registered_by_staff": "staff@posme.app",
        "created_at": "2025-01-02T03:04:05Z",
        "updated_at": "2025-01-02T03:04:05Z"
    })
}

fn upstream_router(upstream: Upstream) -> Router {
    Router::new()
        .route(
            "/api/v1/auth/login",
            post(|Json(body): Json<serde_json::Value>| async move {
                if body["password"] == serde_json::json!("secret") {
                    Json(serde_json::json!({
                        "token": "tok-1",
                        "staff_user": staff_user_json()
                    }))
                    .into_response()
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(serde_json::json!({ "message": "Invalid credentials" })),
                    )
                        .into_response()
                }
            }),
        )
        .route(
            "/api/v1/auth/logout",
            post(|State(upstream): State<Upstream>| async move {
                if upstream.logout_fails.load(Ordering::SeqCst) {
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                } else {
                    Json(serde_json::json!({})).into_response()
                }
            }),
        )
        .route(
            "/api/v1/members",
            get(|State(upstream): State<Upstream>| async move {
                if upstream.members_unauthorized.load(Ordering::SeqCst) {
                    StatusCode::UNAUTHORIZED.into_response()
                } else {
                    Json(serde_json::json!({
                        "members": [member_json()],
                        "total": 1,
                        "page": 1,
                        "limit": 20
                    }))
                    .into_response()
                }
            }),
        )
        .route(
            "/api/v1/transactions",
            post(|| async {
                Json(serde_json::json!({
                    "transactions": [],
                    "total_points": 10,
                    "message": "ok"
                }))
            }),
        )
        .with_state(upstream)
}

/// Spin up the scripted upstream and a backoffice pointed at it.
async fn spawn_backoffice(upstream: Upstream) -> String {
    let upstream_base = spawn(upstream_router(upstream)).await;

    let config = BackofficeConfig {
        host: "127.0.0.1".parse().expect("ip"),
        port: 0,
        base_url: "http://localhost:3001".to_string(),
        session_secret: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6q"),
        api_base_url: Url::parse(&format!("{upstream_base}/api/v1/")).expect("upstream url"),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.1,
    };
    let state = AppState::new(config).expect("state");
    spawn(posme_backoffice::app(state)).await
}

/// Log in and return the cookies set on the response as (name, value) pairs.
async fn do_login(base: &str) -> Vec<(String, String)> {
    let response = client()
        .post(format!("{base}/login"))
        .form(&[("email", "staff@posme.app"), ("password", "secret")])
        .send()
        .await
        .expect("login request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(LOCATION).expect("location"),
        "/members"
    );

    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| {
            let raw = value.to_str().ok()?;
            let (pair, _) = raw.split_once(';')?;
            let (name, value) = pair.split_once('=')?;
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Build a `Cookie` header from selected pairs.
fn cookie_header(cookies: &[(String, String)], names: &[&str]) -> String {
    cookies
        .iter()
        .filter(|(name, _)| names.contains(&name.as_str()))
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[tokio::test]
async fn test_login_sets_both_copies_and_member_list_renders() {
    let base = spawn_backoffice(Upstream::default()).await;
    let cookies = do_login(&base).await;

    let names: Vec<&str> = cookies.iter().map(|(name, _)| name.as_str()).collect();
    assert!(names.contains(&"posme_session"), "session cookie missing");
    assert!(names.contains(&"auth_token"), "token cookie missing");
    assert!(names.contains(&"auth_user"), "user cookie missing");

    let response = client()
        .get(format!("{base}/members"))
        .header(
            COOKIE,
            cookie_header(&cookies, &["posme_session", "auth_token", "auth_user"]),
        )
        .send()
        .await
        .expect("members request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("members body");
    assert!(body.contains("Somsak"));
    assert!(body.contains("staff@posme.app"));
}

#[tokio::test]
async fn test_login_failure_surfaces_server_message() {
    let base = spawn_backoffice(Upstream::default()).await;

    let response = client()
        .post(format!("{base}/login"))
        .form(&[("email", "staff@posme.app"), ("password", "wrong")])
        .send()
        .await
        .expect("login request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("login body");
    assert!(body.contains("Invalid credentials"));
}

#[tokio::test]
async fn test_logout_clears_session_even_when_upstream_fails() {
    let upstream = Upstream::default();
    upstream.logout_fails.store(true, Ordering::SeqCst);
    let base = spawn_backoffice(upstream).await;

    let cookies = do_login(&base).await;
    let all = cookie_header(&cookies, &["posme_session", "auth_token", "auth_user"]);

    let response = client()
        .post(format!("{base}/logout"))
        .header(COOKIE, all.clone())
        .send()
        .await
        .expect("logout request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(LOCATION).expect("location"), "/login");

    // Both auth cookies are expired on the way out
    let removed: Vec<String> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|v| v.contains("Max-Age=0"))
        .map(ToString::to_string)
        .collect();
    assert!(removed.iter().any(|c| c.starts_with("auth_token=")));
    assert!(removed.iter().any(|c| c.starts_with("auth_user=")));

    // The session record is gone: the old cookie set no longer authenticates
    let response = client()
        .get(format!("{base}/members"))
        .header(COOKIE, all)
        .send()
        .await
        .expect("members request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(LOCATION).expect("location"), "/login");
}

#[tokio::test]
async fn test_upstream_401_purges_session_and_redirects() {
    let upstream = Upstream::default();
    let base = spawn_backoffice(upstream.clone()).await;

    let cookies = do_login(&base).await;
    let all = cookie_header(&cookies, &["posme_session", "auth_token", "auth_user"]);

    upstream.members_unauthorized.store(true, Ordering::SeqCst);
    let response = client()
        .get(format!("{base}/members"))
        .header(COOKIE, all.clone())
        .send()
        .await
        .expect("members request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(LOCATION).expect("location"), "/login");

    // Even after the upstream recovers, the purged session stays logged out
    upstream.members_unauthorized.store(false, Ordering::SeqCst);
    let response = client()
        .get(format!("{base}/members"))
        .header(COOKIE, all)
        .send()
        .await
        .expect("members request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(LOCATION).expect("location"), "/login");
}

#[tokio::test]
async fn test_session_without_token_cookie_fails_closed() {
    let base = spawn_backoffice(Upstream::default()).await;
    let cookies = do_login(&base).await;

    // Persistent copy present, cookie copy missing: purge both
    let response = client()
        .get(format!("{base}/members"))
        .header(COOKIE, cookie_header(&cookies, &["posme_session"]))
        .send()
        .await
        .expect("members request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(LOCATION).expect("location"), "/login");

    // And the stale session record was cleared: presenting the full cookie
    // set afterwards no longer authenticates.
    let response = client()
        .get(format!("{base}/members"))
        .header(
            COOKIE,
            cookie_header(&cookies, &["posme_session", "auth_token", "auth_user"]),
        )
        .send()
        .await
        .expect("members request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_token_cookie_without_session_fails_closed() {
    let base = spawn_backoffice(Upstream::default()).await;
    let cookies = do_login(&base).await;

    let response = client()
        .get(format!("{base}/members"))
        .header(COOKIE, cookie_header(&cookies, &["auth_token", "auth_user"]))
        .send()
        .await
        .expect("members request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(LOCATION).expect("location"), "/login");
}

#[tokio::test]
async fn test_divergent_cookie_token_still_authenticates() {
    let base = spawn_backoffice(Upstream::default()).await;
    let mut cookies = do_login(&base).await;

    // Simulate a newer login in another tab: the cookie copy moved on
    for (name, value) in &mut cookies {
        if name == "auth_token" {
            *value = "tok-2".to_string();
        }
    }

    let response = client()
        .get(format!("{base}/members"))
        .header(
            COOKIE,
            cookie_header(&cookies, &["posme_session", "auth_token", "auth_user"]),
        )
        .send()
        .await
        .expect("members request");

    // Cookie wins; the request proceeds authenticated
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_points_dialog_guard_and_submit() {
    let base = spawn_backoffice(Upstream::default()).await;
    let cookies = do_login(&base).await;
    let all = cookie_header(&cookies, &["posme_session", "auth_token", "auth_user"]);

    // Open a redeem dialog for a member with 12 points on 1.0 L
    let response = client()
        .post(format!("{base}/members/points/redeem/open"))
        .header(COOKIE, all.clone())
        .form(&[
            ("id", "m_1"),
            ("name", "Somsak"),
            ("last4", "1234"),
            ("points_1_0_liter", "12"),
            ("points_1_5_liter", "0"),
        ])
        .send()
        .await
        .expect("open dialog");
    assert_eq!(response.status(), StatusCode::OK);

    // Two bottles fit into 12 points
    for _ in 0..2 {
        let response = client()
            .post(format!("{base}/members/points/add"))
            .header(COOKIE, all.clone())
            .form(&[("product_type", "1_0_LITER")])
            .send()
            .await
            .expect("add bottle");
        assert_eq!(response.status(), StatusCode::OK);
    }

    // The third is rejected client-side with the remaining bottle count
    let response = client()
        .post(format!("{base}/members/points/add"))
        .header(COOKIE, all.clone())
        .form(&[("product_type", "1_0_LITER")])
        .send()
        .await
        .expect("add bottle");
    let body = response.text().await.expect("dialog body");
    assert!(body.contains("Not enough 1.0 L points"));
    assert!(body.contains("2 bottle(s) redeemable"));
    // Draft unchanged at 10 points
    assert!(body.contains("10 pts"));

    // Submit without a receipt number is rejected locally
    let response = client()
        .post(format!("{base}/members/points/submit"))
        .header(COOKIE, all.clone())
        .form(&[("receipt_number", "  ")])
        .send()
        .await
        .expect("submit");
    let body = response.text().await.expect("dialog body");
    assert!(body.contains("Receipt number is required"));

    // A receipt number makes the submit go through and refresh the page
    let response = client()
        .post(format!("{base}/members/points/submit"))
        .header(COOKIE, all.clone())
        .form(&[("receipt_number", "5-99925")])
        .send()
        .await
        .expect("submit");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("hx-refresh")
            .expect("hx-refresh header"),
        "true"
    );

    // The draft is gone: another add has no dialog to act on
    let response = client()
        .post(format!("{base}/members/points/add"))
        .header(COOKIE, all)
        .form(&[("product_type", "1_0_LITER")])
        .send()
        .await
        .expect("add bottle");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
