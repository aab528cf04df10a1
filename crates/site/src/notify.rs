//! Deletion-request notification collaborator.
//!
//! Account-deletion requests are not persisted by this app; they are handed
//! to a [`DeletionNotifier`]. The shipped implementation logs them for the
//! support team's log-based alerting. Database or email implementations plug
//! in behind the same trait without touching the route handler.

use async_trait::async_trait;
use thiserror::Error;

/// Errors delivering a deletion request to the notification channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// A validated account-deletion request, ready for delivery.
#[derive(Debug, Clone)]
pub struct DeletionRequest {
    /// Email address or phone number to reach the requester.
    pub contact: String,
    /// Store name, if the requester runs a POS ME store.
    pub store_name: Option<String>,
    /// Free-text request message.
    pub message: String,
    /// Client IP as reported by the proxy headers.
    pub client_ip: String,
}

/// Delivery channel for account-deletion requests.
#[async_trait]
pub trait DeletionNotifier: Send + Sync {
    /// Deliver one deletion request.
    async fn notify(&self, request: &DeletionRequest) -> Result<(), NotifyError>;
}

/// Notifier that records requests in the structured log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl DeletionNotifier for LogNotifier {
    async fn notify(&self, request: &DeletionRequest) -> Result<(), NotifyError> {
        tracing::info!(
            contact = %request.contact,
            store_name = request.store_name.as_deref().unwrap_or("N/A"),
            message = %request.message,
            client_ip = %request.client_ip,
            "Account deletion request received"
        );
        Ok(())
    }
}
