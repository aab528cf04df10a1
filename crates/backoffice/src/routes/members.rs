//! Member list and registration route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use posme_core::Member;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireStaffAuth;
use crate::posme::{ApiError, page_count};
use crate::posme::types::CreateMemberRequest;
use crate::session::StaffAuth;
use crate::state::AppState;

/// Members per page, fixed to match the upstream default.
const PAGE_SIZE: i64 = 20;

/// Pagination/search query parameters.
#[derive(Debug, Deserialize)]
pub struct MembersQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
}

/// New member form data. The branch is taken from the logged-in staff
/// account, not the form.
#[derive(Debug, Deserialize)]
pub struct CreateMemberForm {
    pub name: String,
    pub last4: String,
    pub registration_receipt_number: String,
}

/// Staff header view for templates.
#[derive(Debug, Clone)]
pub struct StaffView {
    pub email: String,
    pub branch: String,
}

impl From<&StaffAuth> for StaffView {
    fn from(auth: &StaffAuth) -> Self {
        Self {
            email: auth.user.email.clone(),
            branch: auth.user.branch.clone(),
        }
    }
}

/// Member card view for templates.
#[derive(Debug, Clone)]
pub struct MemberView {
    pub id: String,
    pub name: String,
    pub last4: String,
    pub branch: String,
    pub points_1_0_liter: i64,
    pub points_1_5_liter: i64,
    pub milestone_score: i64,
    pub membership_number: Option<String>,
    pub welcome_bonus_claimed: bool,
    pub registered_by_staff: String,
    pub created_at: DateTime<Utc>,
    pub can_redeem: bool,
}

impl From<&Member> for MemberView {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id.to_string(),
            name: member.name.clone(),
            last4: member.last4.clone(),
            branch: member.branch.clone(),
            points_1_0_liter: member.points_1_0_liter,
            points_1_5_liter: member.points_1_5_liter,
            milestone_score: member.milestone_score,
            membership_number: member.membership_number.clone(),
            welcome_bonus_claimed: member.welcome_bonus_claimed,
            registered_by_staff: member.registered_by_staff.clone(),
            created_at: member.created_at,
            can_redeem: member.can_redeem(),
        }
    }
}

/// Member list page template.
#[derive(Template, WebTemplate)]
#[template(path = "members/index.html")]
pub struct MembersIndexTemplate {
    pub staff: StaffView,
    pub members: Vec<MemberView>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
    pub search: String,
    pub error: Option<String>,
}

/// Fetch one member page and build the list template.
async fn load_members_page(
    state: &AppState,
    auth: &StaffAuth,
    search: Option<&str>,
    page: i64,
    error: Option<String>,
) -> Result<MembersIndexTemplate> {
    let result = state
        .api()
        .get_members(&auth.token, search, page, PAGE_SIZE)
        .await?;

    Ok(MembersIndexTemplate {
        staff: StaffView::from(auth),
        members: result.members.iter().map(MemberView::from).collect(),
        total: result.total,
        page: result.page,
        total_pages: page_count(result.total, result.limit),
        search: search.unwrap_or_default().to_string(),
        error,
    })
}

/// Member list page with search and pagination.
///
/// GET /members
#[instrument(skip(auth, state))]
pub async fn index(
    RequireStaffAuth(auth): RequireStaffAuth,
    State(state): State<AppState>,
    Query(query): Query<MembersQuery>,
) -> Result<MembersIndexTemplate> {
    let page = query.page.unwrap_or(1).max(1);
    load_members_page(&state, &auth, query.search.as_deref(), page, None).await
}

/// Register a new member.
///
/// POST /members
///
/// The branch is always the registering staff's own branch.
#[instrument(skip_all, fields(last4 = %form.last4))]
pub async fn create(
    RequireStaffAuth(auth): RequireStaffAuth,
    State(state): State<AppState>,
    axum::Form(form): axum::Form<CreateMemberForm>,
) -> Result<Response> {
    if let Some(message) = validate_member_form(&form) {
        let template = load_members_page(&state, &auth, None, 1, Some(message)).await?;
        return Ok(template.into_response());
    }

    let request = CreateMemberRequest {
        name: form.name.trim().to_string(),
        last4: form.last4.trim().to_string(),
        branch: auth.user.branch.clone(),
        registration_receipt_number: form.registration_receipt_number.trim().to_string(),
    };

    match state.api().create_member(&auth.token, &request).await {
        Ok(member) => {
            tracing::info!(member_id = %member.id, "Member registered");
            Ok(Redirect::to("/members").into_response())
        }
        Err(ApiError::Unauthorized) => Err(AppError::from(ApiError::Unauthorized)),
        Err(e) => {
            let template = load_members_page(&state, &auth, None, 1, Some(e.to_string())).await?;
            Ok(template.into_response())
        }
    }
}

/// Validate the registration form; returns a user-facing message on failure.
fn validate_member_form(form: &CreateMemberForm) -> Option<String> {
    if form.name.trim().is_empty() {
        return Some("Name is required".to_string());
    }
    let last4 = form.last4.trim();
    if last4.len() != 4 || !last4.chars().all(|c| c.is_ascii_digit()) {
        return Some("Enter the last 4 digits of the phone number".to_string());
    }
    if form.registration_receipt_number.trim().is_empty() {
        return Some("Receipt number is required".to_string());
    }
    None
}
