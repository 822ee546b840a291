//! Access gate middleware

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use landlease_core::{Decision, GateState, RequestClass};
use tower_cookies::Cookies;

use crate::onboarding;
use crate::state::AppState;
use crate::store::{LandStore, SessionStore, UserStore};

/// Runs before every route. Page requests have the principal's funnel
/// position resolved fresh and are redirected when it does not allow them.
pub async fn access_gate<U, L, S>(
    State(state): State<Arc<AppState<U, L, S>>>,
    cookies: Cookies,
    request: Request,
    next: Next,
) -> Response
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    let path = request.uri().path().to_string();
    if state.gate.classify(&path) != RequestClass::Page {
        return next.run(request).await;
    }

    let gate_state = match super::session::current_principal(&state, &cookies) {
        None => GateState::Anonymous,
        Some(principal) => {
            match onboarding::resolve_status(state.user_store.as_ref(), Some(&principal)) {
                Ok(report) => GateState::from_status(report.status, report.role()),
                Err(_) => GateState::Unresolved,
            }
        }
    };

    match state.gate.decide(gate_state, &path, request.uri().query()) {
        Decision::Allow => next.run(request).await,
        Decision::Redirect(to) => {
            tracing::debug!(path = %path, ?gate_state, to = %to, "Gate redirect");
            Redirect::to(&to).into_response()
        }
    }
}
