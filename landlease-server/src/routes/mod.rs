//! HTTP routes for the marketplace

mod auth;
mod dashboard;
mod gate;
mod onboarding;
mod pages;
mod session;
mod status;
mod webhook;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::store::{LandStore, SessionStore, UserStore};

pub use gate::access_gate;
pub use session::{clear_session_cookie, current_principal, set_session_cookie};

/// Optional route groups
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterOptions {
    /// Mount `POST /api/test/session`
    pub enable_test_routes: bool,
}

/// Create the router with all production routes
pub fn create_router<U, L, S>(state: Arc<AppState<U, L, S>>) -> Router
where
    U: UserStore + 'static,
    L: LandStore + 'static,
    S: SessionStore + 'static,
{
    create_router_with_options(state, RouterOptions::default())
}

pub fn create_router_with_options<U, L, S>(
    state: Arc<AppState<U, L, S>>,
    options: RouterOptions,
) -> Router
where
    U: UserStore + 'static,
    L: LandStore + 'static,
    S: SessionStore + 'static,
{
    let mut router = Router::new()
        .route("/", get(pages::home))
        .route("/sign-in", get(pages::sign_in))
        .route("/sign-up", get(pages::sign_in))
        .route(
            "/onboarding",
            get(onboarding::role_selection_page).post(onboarding::select_role),
        )
        .route(
            "/onboarding/farmer",
            get(onboarding::farmer_page).post(onboarding::complete_farmer),
        )
        .route(
            "/onboarding/landowner",
            get(onboarding::landowner_page).post(onboarding::complete_landowner),
        )
        .route("/dashboard", get(dashboard::entry_point))
        .route("/farmer/dashboard", get(dashboard::farmer_dashboard))
        .route("/landowner/dashboard", get(dashboard::landowner_dashboard))
        .route("/api/user/status", get(status::get_user_status))
        .route("/api/webhooks/identity", post(webhook::identity_webhook))
        .route("/api/sign-out", post(auth::sign_out));

    if options.enable_test_routes {
        tracing::warn!("Test routes enabled");
        router = router.route("/api/test/session", post(test::create_session));
    }

    router
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            gate::access_gate::<U, L, S>,
        ))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
