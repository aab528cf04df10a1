//! POS ME REST API client.
//!
//! Thin typed passthrough to the external backend. Every call attaches
//! `Authorization: Bearer <token>` when a token is supplied; transient
//! upstream failures (408, 429, 5xx gateway statuses) are retried up to two
//! additional times with exponential backoff. A 401 response maps to
//! [`ApiError::Unauthorized`], which the response layer turns into a session
//! purge plus a redirect to the login page - call sites never handle it.
//!
//! No client-side caching: each call is independent, and idempotency of
//! creates is the server's responsibility.

pub mod types;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use types::{
    CreateMemberRequest, ErrorBody, LoginResponse, MemberPage, MemberSummary, TransactionPage,
    TransactionRequest, TransactionResponse,
};

/// Fixed request timeout for every upstream call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Additional attempts after the first failed one.
const MAX_RETRIES: u32 = 2;

/// Base delay for exponential retry backoff.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// Errors from the POS ME API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint path did not join onto the base URL.
    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    /// A request body failed to serialize.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Non-success response, carrying the server-provided message if any.
    #[error("{}", .message.as_deref().unwrap_or("The request failed. Please try again."))]
    Status {
        status: u16,
        message: Option<String>,
    },

    /// 401 from any endpoint: the session is no longer valid upstream.
    #[error("Unauthorized")]
    Unauthorized,
}

/// Whether a response status is worth retrying.
const fn is_retryable(status: StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
}

/// Client for the external POS ME REST API.
///
/// Constructed once per process; cheaply cloneable.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client with the fixed request timeout.
    ///
    /// The base URL must end with `/` so endpoint paths join underneath it
    /// (config normalizes this).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: Url) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner { http, base_url }),
        })
    }

    /// Send one request, retrying transient upstream statuses.
    ///
    /// Returns the final response whatever its status; status handling is the
    /// caller's concern because `auth/login` has its own error contract.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.inner.base_url.join(path)?;

        let mut attempt: u32 = 0;
        loop {
            let mut request = self.inner.http.request(method.clone(), url.clone());
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if is_retryable(status) && attempt < MAX_RETRIES {
                attempt += 1;
                let delay = RETRY_BASE_DELAY * 2_u32.saturating_pow(attempt - 1);
                tracing::debug!(%status, attempt, ?delay, path, "Retrying upstream request");
                tokio::time::sleep(delay).await;
                continue;
            }

            return Ok(response);
        }
    }

    /// Map a non-login response to a typed result.
    async fn check<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }

    /// `POST auth/login`.
    ///
    /// # Errors
    ///
    /// On any non-2xx response, returns `ApiError::Status` carrying the
    /// server-provided message if present, else the generic "Login failed".
    /// Login does not participate in the global 401 handling - a rejected
    /// login is a normal error for the login page to display.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response = self
            .execute(Method::POST, "auth/login", None, &[], Some(&body))
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: Some(message.unwrap_or_else(|| "Login failed".to_string())),
            });
        }

        Ok(response.json::<LoginResponse>().await?)
    }

    /// `POST auth/logout`. Best-effort: failures are logged, never surfaced.
    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &str) {
        let result = self
            .execute(Method::POST, "auth/logout", Some(token), &[], None)
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(status = %response.status(), "Logout notification rejected");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Logout notification failed");
            }
        }
    }

    /// `GET members?search&page&limit`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    #[instrument(skip(self, token))]
    pub async fn get_members(
        &self,
        token: &str,
        search: Option<&str>,
        page: i64,
        limit: i64,
    ) -> Result<MemberPage, ApiError> {
        let mut query = vec![("page", page.to_string()), ("limit", limit.to_string())];
        if let Some(search) = search.filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }

        let response = self
            .execute(Method::GET, "members", Some(token), &query, None)
            .await?;
        Self::check(response).await
    }

    /// `POST members`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    #[instrument(skip(self, token, request), fields(last4 = %request.last4))]
    pub async fn create_member(
        &self,
        token: &str,
        request: &CreateMemberRequest,
    ) -> Result<MemberSummary, ApiError> {
        let body = serde_json::to_value(request)?;
        let response = self
            .execute(Method::POST, "members", Some(token), &[], Some(&body))
            .await?;
        Self::check(response).await
    }

    /// `POST transactions`.
    ///
    /// The client does not dedupe: each call creates exactly one batch and
    /// idempotency is the server's responsibility.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    #[instrument(skip(self, token, request), fields(member_id = %request.member_id, action = ?request.action))]
    pub async fn create_transaction(
        &self,
        token: &str,
        request: &TransactionRequest,
    ) -> Result<TransactionResponse, ApiError> {
        let body = serde_json::to_value(request)?;
        let response = self
            .execute(Method::POST, "transactions", Some(token), &[], Some(&body))
            .await?;
        Self::check(response).await
    }

    /// `GET transactions/branch?page&limit`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    #[instrument(skip(self, token))]
    pub async fn get_branch_transactions(
        &self,
        token: &str,
        page: i64,
        limit: i64,
    ) -> Result<TransactionPage, ApiError> {
        let query = [("page", page.to_string()), ("limit", limit.to_string())];
        let response = self
            .execute(
                Method::GET,
                "transactions/branch",
                Some(token),
                &query,
                None,
            )
            .await?;
        Self::check(response).await
    }
}

/// Convenience used by list pages.
#[must_use]
pub const fn page_count(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}
