//! Account-deletion request page and endpoint.
//!
//! The endpoint validates and hands the request to the configured
//! [`crate::notify::DeletionNotifier`]; nothing is persisted here and the
//! request's lifecycle ends at the HTTP response.

use std::sync::LazyLock;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::filters;
use crate::notify::DeletionRequest;
use crate::state::AppState;

/// Email shape: something@something.tld, no whitespace.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// Loose phone shape: digits/+/-/space/parentheses, at least 8 characters.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+\-\s()]{8,}$").expect("phone pattern compiles"));

/// Deletion-request page template.
#[derive(Template, WebTemplate)]
#[template(path = "account_deletion/index.html")]
pub struct AccountDeletionTemplate {
    pub support_email: String,
}

/// Deletion request body.
#[derive(Debug, Deserialize)]
pub struct DeletionRequestBody {
    #[serde(default)]
    pub contact: String,
    #[serde(default, rename = "storeName")]
    pub store_name: Option<String>,
    #[serde(default)]
    pub message: String,
    /// Hidden form field legitimate users never fill in.
    #[serde(default)]
    pub honeypot: Option<String>,
}

/// Deletion request response.
#[derive(Debug, Serialize)]
pub struct DeletionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeletionResponse {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            error: None,
        }
    }

    fn rejected(error: &str) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.to_string()),
        }
    }
}

/// Display the account-deletion request page.
///
/// GET /account-deletion
#[instrument(skip(state))]
pub async fn page(State(state): State<AppState>) -> AccountDeletionTemplate {
    AccountDeletionTemplate {
        support_email: state.config().support_email.clone(),
    }
}

/// Accept an account-deletion request.
///
/// POST /api/account-deletion-request
///
/// Rejects bot submissions (non-empty honeypot) and malformed contacts with
/// 400; on success delivers the request to the notifier and confirms.
/// Unexpected failures become a generic 500 - no internals leak.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<DeletionRequestBody>,
) -> impl IntoResponse {
    // Honeypot spam protection - if filled, it's likely a bot
    if body.honeypot.as_deref().is_some_and(|h| !h.is_empty()) {
        tracing::debug!("Deletion request dropped: honeypot filled");
        return (
            StatusCode::BAD_REQUEST,
            Json(DeletionResponse::rejected("Invalid request")),
        );
    }

    let contact = body.contact.trim();
    let message = body.message.trim();

    if contact.is_empty() || message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(DeletionResponse::rejected(
                "Contact and message are required",
            )),
        );
    }

    if !EMAIL_PATTERN.is_match(contact) && !PHONE_PATTERN.is_match(contact) {
        return (
            StatusCode::BAD_REQUEST,
            Json(DeletionResponse::rejected(
                "Please provide a valid email or phone number",
            )),
        );
    }

    let request = DeletionRequest {
        contact: contact.to_string(),
        store_name: body
            .store_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string),
        message: message.to_string(),
        client_ip: client_ip(&headers),
    };

    match state.notifier().notify(&request).await {
        Ok(()) => (
            StatusCode::OK,
            Json(DeletionResponse::ok(
                "Your deletion request has been received. We will contact you within \
                 1-2 business days to verify and process your request.",
            )),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to process deletion request");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DeletionResponse::rejected(
                    "Failed to process request. Please try again or contact support directly.",
                )),
            )
        }
    }
}

/// Client IP as reported by proxy headers.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(EMAIL_PATTERN.is_match("a@b.com"));
        assert!(EMAIL_PATTERN.is_match("user.name@domain.co.uk"));

        assert!(!EMAIL_PATTERN.is_match("abc"));
        assert!(!EMAIL_PATTERN.is_match("a@b"));
        assert!(!EMAIL_PATTERN.is_match("a b@c.com"));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(PHONE_PATTERN.is_match("0812345678"));
        assert!(PHONE_PATTERN.is_match("+66 81 234 5678"));
        assert!(PHONE_PATTERN.is_match("(081) 234-5678"));

        // Too short or containing letters
        assert!(!PHONE_PATTERN.is_match("1234567"));
        assert!(!PHONE_PATTERN.is_match("081abc5678"));
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "unknown");

        headers.insert("x-real-ip", "10.0.0.2".parse().expect("header"));
        assert_eq!(client_ip(&headers), "10.0.0.2");

        headers.insert("x-forwarded-for", "203.0.113.9".parse().expect("header"));
        assert_eq!(client_ip(&headers), "203.0.113.9");
    }
}
