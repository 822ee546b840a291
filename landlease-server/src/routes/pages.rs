//! Public pages

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};
use tower_cookies::Cookies;

use crate::state::AppState;
use crate::store::{LandStore, SessionStore, UserStore};

/// GET /
pub async fn home<U, L, S>(
    State(state): State<Arc<AppState<U, L, S>>>,
    cookies: Cookies,
) -> Json<Value>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    let signed_in = super::session::current_principal(&state, &cookies).is_some();
    let next = if signed_in {
        crate::onboarding::STATUS_ENTRY_POINT
    } else {
        state.gate.paths().sign_in.as_str()
    };
    Json(json!({
        "page": "home",
        "signed_in": signed_in,
        "next": next,
    }))
}

/// GET /sign-in and /sign-up
///
/// Sessions are issued by the identity provider; this only echoes where
/// to return afterwards.
pub async fn sign_in(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let redirect_url = params
        .get("redirect_url")
        .cloned()
        .unwrap_or_else(|| crate::onboarding::STATUS_ENTRY_POINT.to_string());
    Json(json!({
        "page": "sign_in",
        "redirect_url": redirect_url,
    }))
}
