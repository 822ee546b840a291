//! Dashboard pages

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use landlease_core::{OnboardingStatus, Role};
use tower_cookies::Cookies;

use crate::dashboard;
use crate::error::AppError;
use crate::onboarding::{self, StatusReport, STATUS_ENTRY_POINT};
use crate::state::AppState;
use crate::store::{LandStore, SessionStore, UserStore};

fn report<U, L, S>(state: &AppState<U, L, S>, cookies: &Cookies) -> Result<StatusReport, AppError>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    let principal = super::session::current_principal(state, cookies);
    onboarding::resolve_status(state.user_store.as_ref(), principal.as_ref())
}

/// Where a principal in this funnel position belongs
fn next_step(report: &StatusReport) -> &'static str {
    match (report.status, report.role()) {
        (OnboardingStatus::Complete, Some(role)) => role.dashboard_path(),
        (OnboardingStatus::NeedsProfile, Some(role)) => role.onboarding_path(),
        _ => "/onboarding",
    }
}

/// GET /dashboard
///
/// Status-resolution entry point: every action sends the client here and
/// this page forwards to the step the fresh status calls for.
pub async fn entry_point<U, L, S>(
    State(state): State<Arc<AppState<U, L, S>>>,
    cookies: Cookies,
) -> Result<Redirect, AppError>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    let report = report(&state, &cookies)?;
    Ok(Redirect::to(next_step(&report)))
}

/// Onboarded user of `role`, or where to send the request instead
fn onboarded_as(report: &StatusReport, role: Role) -> Result<crate::store::UserId, &'static str> {
    match (&report.user, report.status) {
        (Some(user), OnboardingStatus::Complete) if user.role == Some(role) => Ok(user.id),
        _ => Err(if report.status == OnboardingStatus::Complete {
            next_step(report)
        } else {
            STATUS_ENTRY_POINT
        }),
    }
}

/// GET /farmer/dashboard
pub async fn farmer_dashboard<U, L, S>(
    State(state): State<Arc<AppState<U, L, S>>>,
    cookies: Cookies,
) -> Result<Response, AppError>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    let report = report(&state, &cookies)?;
    let user_id = match onboarded_as(&report, Role::Farmer) {
        Ok(id) => id,
        Err(to) => return Ok(Redirect::to(to).into_response()),
    };
    let page = dashboard::get_farmer_dashboard(
        state.user_store.as_ref(),
        state.land_store.as_ref(),
        user_id,
    )?;
    Ok(Json(page).into_response())
}

/// GET /landowner/dashboard
pub async fn landowner_dashboard<U, L, S>(
    State(state): State<Arc<AppState<U, L, S>>>,
    cookies: Cookies,
) -> Result<Response, AppError>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    let report = report(&state, &cookies)?;
    let user_id = match onboarded_as(&report, Role::Landowner) {
        Ok(id) => id,
        Err(to) => return Ok(Redirect::to(to).into_response()),
    };
    let page = dashboard::get_landowner_dashboard(
        state.user_store.as_ref(),
        state.land_store.as_ref(),
        user_id,
    )?;
    Ok(Json(page).into_response())
}
