//! Sign-out

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tower_cookies::Cookies;

use crate::state::AppState;
use crate::store::{LandStore, SessionStore, UserStore};

#[derive(Serialize)]
pub struct SignOutResponse {
    pub success: bool,
}

/// POST /api/sign-out
pub async fn sign_out<U, L, S>(
    State(state): State<Arc<AppState<U, L, S>>>,
    cookies: Cookies,
) -> Json<SignOutResponse>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    if let Some(session_id) = super::session::session_id(&cookies, &state.session_cookie) {
        if let Err(e) = state.session_store.delete(&session_id) {
            tracing::warn!(error = %e, "Failed to delete session on sign-out");
        }
    }
    super::session::clear_session_cookie(&cookies, &state.session_cookie);

    Json(SignOutResponse { success: true })
}
