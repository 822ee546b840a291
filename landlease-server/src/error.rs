//! Service error types
//!
//! Every failure crossing the HTTP boundary carries a stable `error` code
//! next to its human-readable `reason`, so clients branch on the kind and
//! never on message text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use landlease_core::ValidationErrors;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Select a role before completing onboarding")]
    RoleNotSelected,

    #[error("Onboarding submitted for a different role than the account's")]
    RoleMismatch,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid webhook: {0}")]
    InvalidWebhook(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable kind
    pub fn code(&self) -> &'static str {
        match self {
            AppError::AuthenticationRequired => "authentication_required",
            AppError::RoleNotSelected => "role_not_selected",
            AppError::RoleMismatch => "role_mismatch",
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidWebhook(_) => "invalid_webhook",
            AppError::Persistence(_) => "persistence_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            AppError::RoleNotSelected | AppError::RoleMismatch => StatusCode::CONFLICT,
            AppError::Validation(_) | AppError::InvalidWebhook(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Persistence(e.to_string())
    }
}

impl From<landlease_core::Error> for AppError {
    fn from(e: landlease_core::Error) -> Self {
        match e {
            landlease_core::Error::Validation(errors) => AppError::Validation(errors),
            other => AppError::InvalidWebhook(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = match &self {
            // mismatches are client races; no need for a specific message
            AppError::RoleMismatch => "Failed to complete onboarding".to_string(),
            AppError::Persistence(msg) => {
                tracing::error!("Persistence error: {}", msg);
                "Something went wrong, please try again".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut body = json!({
            "success": false,
            "error": self.code(),
            "reason": reason,
        });
        if let AppError::Validation(errors) = &self {
            body["fields"] = json!(errors.errors);
        }

        (status, axum::Json(body)).into_response()
    }
}
