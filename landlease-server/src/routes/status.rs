//! Onboarding status endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use landlease_core::OnboardingStatus;
use serde::Serialize;
use tower_cookies::Cookies;

use crate::error::AppError;
use crate::onboarding;
use crate::state::AppState;
use crate::store::{LandStore, SessionStore, UserStore, UserSummary};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub user: Option<UserSummary>,
    pub exists: bool,
    pub needs_onboarding: bool,
    pub status: OnboardingStatus,
}

/// GET /api/user/status
///
/// Reachable in every funnel state; 401 without a session.
pub async fn get_user_status<U, L, S>(
    State(state): State<Arc<AppState<U, L, S>>>,
    cookies: Cookies,
) -> Result<Json<StatusResponse>, AppError>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    let principal = super::session::current_principal(&state, &cookies);
    let report = onboarding::resolve_status(state.user_store.as_ref(), principal.as_ref())?;

    Ok(Json(StatusResponse {
        exists: report.user.is_some(),
        needs_onboarding: report.status.needs_onboarding(),
        status: report.status,
        user: report.user,
    }))
}
