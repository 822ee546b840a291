//! Identity-provider webhook endpoint

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use landlease_core::webhook::{HEADER_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP};
use landlease_core::{IdentityEvent, WebhookHeaders};
use serde::Serialize;

use crate::error::AppError;
use crate::identity::apply_identity_event;
use crate::state::AppState;
use crate::store::{LandStore, SessionStore, UserStore};

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub handled: bool,
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::InvalidWebhook(format!("missing {} header", name)))
}

/// POST /api/webhooks/identity
///
/// 400 when the delivery is not authentic; 500 when it is but could not
/// be applied, so the provider redelivers.
pub async fn identity_webhook<U, L, S>(
    State(state): State<Arc<AppState<U, L, S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, AppError>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    let verifier = state
        .webhook_verifier
        .as_ref()
        .ok_or_else(|| AppError::Internal("webhook secret is not configured".to_string()))?;

    let delivery = WebhookHeaders {
        id: header(&headers, HEADER_ID)?,
        timestamp: header(&headers, HEADER_TIMESTAMP)?,
        signature: header(&headers, HEADER_SIGNATURE)?,
    };

    if let Err(e) = verifier.verify(&delivery, &body) {
        tracing::warn!(delivery_id = delivery.id, error = %e, "Rejected webhook delivery");
        return Err(e.into());
    }

    let event = IdentityEvent::parse(&body)?;
    tracing::debug!(delivery_id = delivery.id, event_type = event.event_type(), "Webhook received");

    let handled = apply_identity_event(state.user_store.as_ref(), &event)?;
    Ok(Json(WebhookResponse {
        success: true,
        handled,
    }))
}
