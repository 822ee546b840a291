//! Onboarding pages and actions

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use landlease_core::forms::{FarmerOnboardingForm, LandownerOnboardingForm};
use landlease_core::{OnboardingStatus, Role, ValidationErrors};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::error::AppError;
use crate::onboarding::{self, STATUS_ENTRY_POINT};
use crate::state::AppState;
use crate::store::{
    FarmerProfile, Land, LandStore, LandownerProfile, SessionStore, UserStore, UserSummary,
};

#[derive(Debug, Serialize)]
pub struct PageData {
    pub page: &'static str,
    pub user: Option<UserSummary>,
    pub status: OnboardingStatus,
}

async fn page_data<U, L, S>(
    state: &AppState<U, L, S>,
    cookies: &Cookies,
    page: &'static str,
) -> Result<Json<PageData>, AppError>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    let principal = super::session::current_principal(state, cookies);
    let report = onboarding::resolve_status(state.user_store.as_ref(), principal.as_ref())?;
    Ok(Json(PageData {
        page,
        user: report.user,
        status: report.status,
    }))
}

/// GET /onboarding
pub async fn role_selection_page<U, L, S>(
    State(state): State<Arc<AppState<U, L, S>>>,
    cookies: Cookies,
) -> Result<Json<PageData>, AppError>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    page_data(&state, &cookies, "role_selection").await
}

/// GET /onboarding/farmer
pub async fn farmer_page<U, L, S>(
    State(state): State<Arc<AppState<U, L, S>>>,
    cookies: Cookies,
) -> Result<Json<PageData>, AppError>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    page_data(&state, &cookies, "farmer_onboarding").await
}

/// GET /onboarding/landowner
pub async fn landowner_page<U, L, S>(
    State(state): State<Arc<AppState<U, L, S>>>,
    cookies: Cookies,
) -> Result<Json<PageData>, AppError>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    page_data(&state, &cookies, "landowner_onboarding").await
}

#[derive(Debug, Deserialize)]
pub struct SelectRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub user: UserSummary,
    pub redirect_to: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FarmerActionResponse {
    #[serde(flatten)]
    pub base: ActionResponse,
    pub profile: FarmerProfile,
}

#[derive(Debug, Serialize)]
pub struct LandownerActionResponse {
    #[serde(flatten)]
    pub base: ActionResponse,
    pub profile: LandownerProfile,
    pub land: Option<Land>,
    pub land_created: bool,
    pub land_error: Option<String>,
}

/// Unreadable request bodies are reported as validation failures
fn form_body<T>(operation: &str, body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match body {
        Ok(Json(form)) => Ok(form),
        Err(rejection) => {
            tracing::warn!(operation, error = %rejection.body_text(), "Unreadable form body");
            let mut errors = ValidationErrors::new();
            errors.push("body", rejection.body_text());
            Err(AppError::Validation(errors))
        }
    }
}

fn parse_role(raw: &str) -> Result<Role, AppError> {
    raw.parse().map_err(|_| {
        let mut errors = ValidationErrors::new();
        errors.push("role", "must be FARMER or LANDOWNER");
        AppError::Validation(errors)
    })
}

/// POST /onboarding
pub async fn select_role<U, L, S>(
    State(state): State<Arc<AppState<U, L, S>>>,
    cookies: Cookies,
    body: Result<Json<SelectRoleRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, AppError>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    let principal = super::session::current_principal(&state, &cookies)
        .ok_or(AppError::AuthenticationRequired)?;
    let req = form_body("assign_role", body)?;
    let role = parse_role(&req.role)?;
    let user = onboarding::assign_role(state.user_store.as_ref(), Some(&principal), role)?;

    Ok(Json(ActionResponse {
        success: true,
        user: UserSummary::from(&user),
        redirect_to: STATUS_ENTRY_POINT,
    }))
}

/// POST /onboarding/farmer
pub async fn complete_farmer<U, L, S>(
    State(state): State<Arc<AppState<U, L, S>>>,
    cookies: Cookies,
    body: Result<Json<FarmerOnboardingForm>, JsonRejection>,
) -> Result<Json<FarmerActionResponse>, AppError>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    let principal = super::session::current_principal(&state, &cookies);
    let form = form_body("complete_farmer_onboarding", body)?;
    let done = onboarding::complete_farmer_onboarding(
        state.user_store.as_ref(),
        principal.as_ref(),
        form,
    )?;

    Ok(Json(FarmerActionResponse {
        base: ActionResponse {
            success: true,
            user: UserSummary::from(&done.user),
            redirect_to: STATUS_ENTRY_POINT,
        },
        profile: done.profile,
    }))
}

/// POST /onboarding/landowner
pub async fn complete_landowner<U, L, S>(
    State(state): State<Arc<AppState<U, L, S>>>,
    cookies: Cookies,
    body: Result<Json<LandownerOnboardingForm>, JsonRejection>,
) -> Result<Json<LandownerActionResponse>, AppError>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    let principal = super::session::current_principal(&state, &cookies);
    let form = form_body("complete_landowner_onboarding", body)?;
    let done = onboarding::complete_landowner_onboarding(
        state.user_store.as_ref(),
        state.land_store.as_ref(),
        principal.as_ref(),
        form,
    )?;

    Ok(Json(LandownerActionResponse {
        base: ActionResponse {
            success: true,
            user: UserSummary::from(&done.user),
            redirect_to: STATUS_ENTRY_POINT,
        },
        profile: done.profile,
        land_created: done.land.is_some(),
        land: done.land,
        land_error: done.land_error,
    }))
}
