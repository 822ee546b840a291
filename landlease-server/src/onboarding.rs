//! Onboarding funnel operations: status resolution, role assignment and
//! per-role completion.
//!
//! Every operation takes the authenticated principal explicitly (`None`
//! when the request has no session) and reports failures as [`AppError`]
//! kinds. Failures are logged here, once, with the operation name and
//! principal id.

use landlease_core::forms::{FarmerOnboardingForm, LandownerOnboardingForm};
use landlease_core::{OnboardingStatus, Role};
use serde::Serialize;

use crate::error::AppError;
use crate::store::{
    FarmerProfile, Identity, Land, LandStore, LandownerProfile, Principal, User, UserStore,
    UserSummary,
};

/// Where the client should go after a successful action, so the gate
/// re-evaluates fresh state instead of the client guessing the next page
pub const STATUS_ENTRY_POINT: &str = "/dashboard";

/// Outcome of status resolution
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub user: Option<UserSummary>,
    pub status: OnboardingStatus,
}

impl StatusReport {
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().and_then(|u| u.role)
    }
}

#[derive(Debug, Clone)]
pub struct FarmerOnboarded {
    pub user: User,
    pub profile: FarmerProfile,
}

#[derive(Debug, Clone)]
pub struct LandownerOnboarded {
    pub user: User,
    pub profile: LandownerProfile,
    pub land: Option<Land>,
    /// Set when land details were supplied but could not be saved
    pub land_error: Option<String>,
}

fn require(principal: Option<&Principal>) -> Result<&Principal, AppError> {
    principal.ok_or(AppError::AuthenticationRequired)
}

fn log_failure<T>(
    operation: &'static str,
    principal: Option<&Principal>,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    if let Err(e) = &result {
        let principal = principal.map(|p| p.external_id.as_str()).unwrap_or("-");
        match e {
            AppError::Persistence(_) | AppError::Internal(_) => {
                tracing::error!(operation, principal, error = %e, "Operation failed")
            }
            _ => tracing::warn!(operation, principal, error = %e, "Operation rejected"),
        }
    }
    result
}

/// Resolve the principal's funnel position. Pure read; never creates a user.
pub fn resolve_status<U: UserStore>(
    users: &U,
    principal: Option<&Principal>,
) -> Result<StatusReport, AppError> {
    log_failure("resolve_status", principal, status_of(users, principal))
}

fn status_of<U: UserStore>(
    users: &U,
    principal: Option<&Principal>,
) -> Result<StatusReport, AppError> {
    let principal = require(principal)?;
    let user = users.get_user_by_external_id(&principal.external_id)?;
    let status = OnboardingStatus::resolve(user.as_ref().map(|u| (u.role, u.onboarded)));
    Ok(StatusReport {
        user: user.as_ref().map(UserSummary::from),
        status,
    })
}

/// Set the principal's role, creating the user if missing. Last write wins;
/// profiles of a previous role are left in place.
pub fn assign_role<U: UserStore>(
    users: &U,
    principal: Option<&Principal>,
    role: Role,
) -> Result<User, AppError> {
    log_failure("assign_role", principal, store_role(users, principal, role))
}

fn store_role<U: UserStore>(
    users: &U,
    principal: Option<&Principal>,
    role: Role,
) -> Result<User, AppError> {
    let principal = require(principal)?;
    let user = users.assign_role(&Identity::from(principal), role)?;
    tracing::info!(user_id = user.id.0, role = %role, "Role assigned");
    Ok(user)
}

/// Load the principal's user and check it carries `role`
fn onboarding_user<U: UserStore>(
    users: &U,
    principal: Option<&Principal>,
    role: Role,
) -> Result<User, AppError> {
    let principal = require(principal)?;
    let user = users
        .get_user_by_external_id(&principal.external_id)?
        .ok_or(AppError::RoleNotSelected)?;
    match user.role {
        None => Err(AppError::RoleNotSelected),
        Some(stored) if stored != role => Err(AppError::RoleMismatch),
        Some(_) => Ok(user),
    }
}

/// Complete farmer onboarding.
///
/// Checks, in order: a session, an existing user, a FARMER role, then the
/// form. Nothing is written unless all pass. Contact update, the onboarded
/// flag and the profile upsert are applied atomically.
pub fn complete_farmer_onboarding<U: UserStore>(
    users: &U,
    principal: Option<&Principal>,
    form: FarmerOnboardingForm,
) -> Result<FarmerOnboarded, AppError> {
    let result = onboard_farmer(users, principal, form);
    log_failure("complete_farmer_onboarding", principal, result)
}

fn onboard_farmer<U: UserStore>(
    users: &U,
    principal: Option<&Principal>,
    form: FarmerOnboardingForm,
) -> Result<FarmerOnboarded, AppError> {
    let user = onboarding_user(users, principal, Role::Farmer)?;
    let onboarding = form.into_onboarding()?;

    let (user, profile) =
        users.complete_farmer_onboarding(user.id, &onboarding.contact, &onboarding.profile)?;
    tracing::info!(user_id = user.id.0, profile_id = profile.id.0, "Farmer onboarded");
    Ok(FarmerOnboarded { user, profile })
}

/// Complete landowner onboarding.
///
/// Same checks and atomic profile write as the farmer flow. A land supplied
/// with the form is created afterwards as a separate, best-effort step: if it
/// fails, onboarding still succeeds and the failure is reported in
/// `land_error`.
pub fn complete_landowner_onboarding<U: UserStore, L: LandStore>(
    users: &U,
    lands: &L,
    principal: Option<&Principal>,
    form: LandownerOnboardingForm,
) -> Result<LandownerOnboarded, AppError> {
    let result = onboard_landowner(users, lands, principal, form);
    log_failure("complete_landowner_onboarding", principal, result)
}

fn onboard_landowner<U: UserStore, L: LandStore>(
    users: &U,
    lands: &L,
    principal: Option<&Principal>,
    form: LandownerOnboardingForm,
) -> Result<LandownerOnboarded, AppError> {
    let user = onboarding_user(users, principal, Role::Landowner)?;
    let onboarding = form.into_onboarding()?;

    let (user, profile) = users.complete_landowner_onboarding(user.id, &onboarding.contact)?;
    tracing::info!(user_id = user.id.0, profile_id = profile.id.0, "Landowner onboarded");

    let (land, land_error) = match onboarding.land {
        Some(input) => match lands.create_land(profile.id, &input) {
            Ok(land) => {
                tracing::info!(land_id = land.id.0, "Land created during onboarding");
                (Some(land), None)
            }
            Err(e) => {
                tracing::warn!(
                    user_id = user.id.0,
                    error = %e,
                    "Land creation failed after landowner onboarding"
                );
                (None, Some(e.to_string()))
            }
        },
        None => (None, None),
    };

    Ok(LandownerOnboarded {
        user,
        profile,
        land,
        land_error,
    })
}
