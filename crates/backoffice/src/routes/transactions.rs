//! Points dialog fragments and branch transaction history.
//!
//! The earn/redeem dialog is driven by HTMX: opening a dialog stores a fresh
//! draft in the session, each tap posts back and re-renders the fragment, and
//! a successful submit discards the draft and refreshes the page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::HeaderName,
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use posme_core::{ProductType, Transaction, TransactionAction, redeemable_bottles};

use crate::composer::{MemberSnapshot, TransactionComposer};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireStaffAuth;
use crate::posme::{ApiError, page_count};
use crate::session::SessionError;
use crate::state::AppState;

use super::members::StaffView;

/// Session record key holding the open dialog's draft.
pub const DRAFT_KEY: &str = "txn_draft";

/// Transactions per page, fixed to match the upstream default.
const PAGE_SIZE: i64 = 20;

/// HTMX response header forcing a full page refresh.
const HX_REFRESH: HeaderName = HeaderName::from_static("hx-refresh");

// =============================================================================
// Dialog fragments
// =============================================================================

/// Product selection form data.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub product_type: ProductType,
}

/// Submit form data.
#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub receipt_number: String,
}

/// One drafted row in the dialog.
#[derive(Debug, Clone)]
pub struct DraftRow {
    pub product_type: String,
    pub label: String,
    pub bottles: i64,
    pub points: i64,
}

/// Transaction dialog fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "members/_transaction_dialog.html")]
pub struct TransactionDialogTemplate {
    pub title: String,
    pub is_redeem: bool,
    pub member_name: String,
    pub member_last4: String,
    pub balance_1_0: i64,
    pub balance_1_5: i64,
    pub redeemable_1_0: i64,
    pub redeemable_1_5: i64,
    pub points_per_bottle: i64,
    pub rows: Vec<DraftRow>,
    pub description: String,
    pub total_points: i64,
    pub receipt_number: String,
    pub notice: Option<String>,
}

impl TransactionDialogTemplate {
    fn from_composer(composer: &TransactionComposer, notice: Option<String>) -> Self {
        let member = composer.member();
        let action = composer.action();

        let rows = ProductType::ALL
            .iter()
            .filter(|&&pt| composer.points_for(pt) > 0)
            .map(|&pt| DraftRow {
                product_type: product_type_value(pt).to_string(),
                label: pt.label().to_string(),
                bottles: composer.bottles_for(pt),
                points: composer.points_for(pt),
            })
            .collect();

        Self {
            title: match action {
                TransactionAction::Earn => "Award points".to_string(),
                TransactionAction::Redeem => "Redeem points".to_string(),
            },
            is_redeem: action == TransactionAction::Redeem,
            member_name: member.name.clone(),
            member_last4: member.last4.clone(),
            balance_1_0: member.points_for(ProductType::OneLiter),
            balance_1_5: member.points_for(ProductType::OneAndHalfLiter),
            redeemable_1_0: redeemable_bottles(member.points_for(ProductType::OneLiter)),
            redeemable_1_5: redeemable_bottles(member.points_for(ProductType::OneAndHalfLiter)),
            points_per_bottle: action.points_per_bottle(),
            rows,
            description: composer.describe(),
            total_points: composer.total_points(),
            receipt_number: composer.receipt_number().to_string(),
            notice,
        }
    }
}

/// Wire value for a product type, used in form buttons.
const fn product_type_value(product_type: ProductType) -> &'static str {
    match product_type {
        ProductType::OneLiter => "1_0_LITER",
        ProductType::OneAndHalfLiter => "1_5_LITER",
    }
}

/// Parse the action path segment.
fn parse_action(raw: &str) -> Option<TransactionAction> {
    match raw {
        "earn" => Some(TransactionAction::Earn),
        "redeem" => Some(TransactionAction::Redeem),
        _ => None,
    }
}

/// Load the open draft from the session.
async fn load_draft(session: &Session) -> Result<TransactionComposer> {
    session
        .get::<TransactionComposer>(DRAFT_KEY)
        .await
        .map_err(SessionError::from)?
        .ok_or_else(|| AppError::BadRequest("No open points dialog".to_string()))
}

/// Save the draft back to the session.
async fn save_draft(session: &Session, composer: &TransactionComposer) -> Result<()> {
    session
        .insert(DRAFT_KEY, composer)
        .await
        .map_err(SessionError::from)?;
    Ok(())
}

/// Open an earn/redeem dialog with a fresh, empty draft.
///
/// POST /members/points/{action}/open
///
/// The member snapshot comes from the already-loaded list row; balances are
/// not re-fetched.
#[instrument(skip_all, fields(member_id = %member.id, action = %action))]
pub async fn open_dialog(
    RequireStaffAuth(_auth): RequireStaffAuth,
    session: Session,
    Path(action): Path<String>,
    axum::Form(member): axum::Form<MemberSnapshot>,
) -> Result<TransactionDialogTemplate> {
    let action = parse_action(&action)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown action: {action}")))?;

    let composer = TransactionComposer::new(action, member);
    save_draft(&session, &composer).await?;

    Ok(TransactionDialogTemplate::from_composer(&composer, None))
}

/// Add one bottle's worth of points to the draft.
///
/// POST /members/points/add
///
/// A rejected REDEEM increment leaves the draft unchanged and surfaces the
/// remaining redeemable bottle count as a notice - no network call is made.
#[instrument(skip_all, fields(product_type = %form.product_type))]
pub async fn add_bottle(
    RequireStaffAuth(_auth): RequireStaffAuth,
    session: Session,
    axum::Form(form): axum::Form<ProductForm>,
) -> Result<TransactionDialogTemplate> {
    let mut composer = load_draft(&session).await?;

    let notice = match composer.increment(form.product_type) {
        Ok(()) => {
            save_draft(&session, &composer).await?;
            None
        }
        Err(e) => Some(e.to_string()),
    };

    Ok(TransactionDialogTemplate::from_composer(&composer, notice))
}

/// Remove one bottle's worth of points from the draft.
///
/// POST /members/points/remove
#[instrument(skip_all, fields(product_type = %form.product_type))]
pub async fn remove_bottle(
    RequireStaffAuth(_auth): RequireStaffAuth,
    session: Session,
    axum::Form(form): axum::Form<ProductForm>,
) -> Result<TransactionDialogTemplate> {
    let mut composer = load_draft(&session).await?;
    composer.decrement(form.product_type);
    save_draft(&session, &composer).await?;

    Ok(TransactionDialogTemplate::from_composer(&composer, None))
}

/// Submit the draft as a single transaction batch.
///
/// POST /members/points/submit
///
/// Local validation failures (empty draft, blank receipt number) re-render
/// the dialog without any network call. Upstream failure leaves the draft
/// intact for retry; success discards it and refreshes the page.
#[instrument(skip_all)]
pub async fn submit(
    RequireStaffAuth(auth): RequireStaffAuth,
    State(state): State<AppState>,
    session: Session,
    axum::Form(form): axum::Form<SubmitForm>,
) -> Result<Response> {
    let mut composer = load_draft(&session).await?;
    composer.set_receipt_number(form.receipt_number);
    save_draft(&session, &composer).await?;

    let request = match composer.finish() {
        Ok(request) => request,
        Err(e) => {
            return Ok(
                TransactionDialogTemplate::from_composer(&composer, Some(e.to_string()))
                    .into_response(),
            );
        }
    };

    match state.api().create_transaction(&auth.token, &request).await {
        Ok(response) => {
            session
                .remove::<TransactionComposer>(DRAFT_KEY)
                .await
                .map_err(SessionError::from)?;
            tracing::info!(
                member_id = %request.member_id,
                action = ?request.action,
                total_points = response.total_points,
                "Transaction recorded"
            );
            Ok(([(HX_REFRESH, "true")], ()).into_response())
        }
        Err(ApiError::Unauthorized) => Err(AppError::from(ApiError::Unauthorized)),
        Err(e) => Ok(
            TransactionDialogTemplate::from_composer(&composer, Some(e.to_string()))
                .into_response(),
        ),
    }
}

/// Discard the draft and close the dialog.
///
/// POST /members/points/close
#[instrument(skip_all)]
pub async fn close_dialog(
    RequireStaffAuth(_auth): RequireStaffAuth,
    session: Session,
) -> Result<Response> {
    session
        .remove::<TransactionComposer>(DRAFT_KEY)
        .await
        .map_err(SessionError::from)?;
    Ok(Html("").into_response())
}

// =============================================================================
// Branch transaction history
// =============================================================================

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub page: Option<i64>,
}

/// Transaction row view for templates.
#[derive(Debug, Clone)]
pub struct TransactionView {
    pub is_earn: bool,
    pub action_label: String,
    pub product_label: String,
    pub points: i64,
    pub receipt_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Transaction> for TransactionView {
    fn from(txn: &Transaction) -> Self {
        Self {
            is_earn: txn.action == TransactionAction::Earn,
            action_label: match txn.action {
                TransactionAction::Earn => "Earned".to_string(),
                TransactionAction::Redeem => "Redeemed".to_string(),
            },
            product_label: txn.product_type.label().to_string(),
            points: txn.points,
            receipt_text: txn.receipt_text.clone(),
            created_at: txn.created_at,
        }
    }
}

/// Transaction history page template.
#[derive(Template, WebTemplate)]
#[template(path = "transactions/index.html")]
pub struct TransactionsIndexTemplate {
    pub staff: StaffView,
    pub transactions: Vec<TransactionView>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

/// Branch transaction history page.
///
/// GET /transactions
#[instrument(skip(auth, state))]
pub async fn index(
    RequireStaffAuth(auth): RequireStaffAuth,
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<TransactionsIndexTemplate> {
    let page = query.page.unwrap_or(1).max(1);
    let result = state
        .api()
        .get_branch_transactions(&auth.token, page, PAGE_SIZE)
        .await?;

    Ok(TransactionsIndexTemplate {
        staff: StaffView::from(&auth),
        transactions: result.transactions.iter().map(TransactionView::from).collect(),
        total: result.total,
        page: result.page,
        total_pages: page_count(result.total, result.limit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        assert_eq!(parse_action("earn"), Some(TransactionAction::Earn));
        assert_eq!(parse_action("redeem"), Some(TransactionAction::Redeem));
        assert_eq!(parse_action("EARN"), None);
        assert_eq!(parse_action("other"), None);
    }

    #[test]
    fn test_product_type_value_matches_wire_names() {
        for pt in ProductType::ALL {
            let wire = serde_json::to_string(&pt).expect("serialize");
            assert_eq!(format!("\"{}\"", product_type_value(pt)), wire);
        }
    }
}
