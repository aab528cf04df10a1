//! Wire types for the external POS ME REST API.
//!
//! These mirror the JSON bodies of the six endpoints the backoffice uses.
//! Everything here is owned by the external backend; the client performs no
//! local computation beyond serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use posme_core::{Member, MemberId, ProductType, StaffUser, Transaction, TransactionAction, TransactionId};

/// `POST auth/login` response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub staff_user: StaffUser,
}

/// `GET members` response page.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberPage {
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub total: i64,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// `POST members` request body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateMemberRequest {
    pub name: String,
    pub last4: String,
    pub branch: String,
    pub registration_receipt_number: String,
}

/// `POST members` response (a subset of the full member record).
#[derive(Debug, Clone, Deserialize)]
pub struct MemberSummary {
    pub id: MemberId,
    pub name: String,
    pub last4: String,
    pub branch: String,
    pub registration_receipt_number: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// One pending point adjustment inside a transaction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEntry {
    pub product_type: ProductType,
    pub points: i64,
}

/// `POST transactions` request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRequest {
    pub member_id: MemberId,
    pub action: TransactionAction,
    pub products: Vec<ProductEntry>,
    pub receipt_text: String,
}

/// One ledger entry created by `POST transactions`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedTransaction {
    pub id: TransactionId,
    pub action: TransactionAction,
    pub product_type: ProductType,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

/// `POST transactions` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionResponse {
    #[serde(default)]
    pub transactions: Vec<CreatedTransaction>,
    #[serde(default)]
    pub total_points: i64,
    #[serde(default)]
    pub message: String,
}

/// `GET transactions/branch` response page.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionPage {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub total: i64,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// Error body shape used by the upstream API.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

const fn default_page() -> i64 {
    1
}

const fn default_limit() -> i64 {
    20
}
