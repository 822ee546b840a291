//! Application state shared by all handlers

use std::sync::Arc;

use landlease_core::{AccessGate, WebhookVerifier};

use crate::store::{LandStore, SessionStore, UserStore};

/// Shared state, generic over the storage backends
pub struct AppState<U, L, S>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    pub user_store: Arc<U>,
    pub land_store: Arc<L>,
    pub session_store: Arc<S>,
    pub gate: AccessGate,
    /// `None` when no webhook secret is configured; deliveries are then refused
    pub webhook_verifier: Option<WebhookVerifier>,
    pub session_cookie: String,
}

impl<U, L, S> AppState<U, L, S>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    pub fn new(
        user_store: U,
        land_store: L,
        session_store: S,
        webhook_verifier: Option<WebhookVerifier>,
    ) -> Self {
        Self::from_shared(
            Arc::new(user_store),
            Arc::new(land_store),
            Arc::new(session_store),
            webhook_verifier,
        )
    }

    /// Build from stores that may be one shared backend
    pub fn from_shared(
        user_store: Arc<U>,
        land_store: Arc<L>,
        session_store: Arc<S>,
        webhook_verifier: Option<WebhookVerifier>,
    ) -> Self {
        Self {
            user_store,
            land_store,
            session_store,
            gate: AccessGate::default(),
            webhook_verifier,
            session_cookie: crate::config::DEFAULT_SESSION_COOKIE.to_string(),
        }
    }

    pub fn with_session_cookie(mut self, name: impl Into<String>) -> Self {
        self.session_cookie = name.into();
        self
    }
}
