//! Applying identity-provider lifecycle events to local users

use landlease_core::{IdentityEvent, IdentityUser};

use crate::error::AppError;
use crate::store::{Identity, UserStore};

fn identity_of(user: &IdentityUser) -> Result<Identity, AppError> {
    let email = user
        .primary_email()
        .ok_or_else(|| AppError::InvalidWebhook(format!("user {} has no email address", user.id)))?;
    Ok(Identity {
        external_id: user.id.clone(),
        email: email.to_string(),
        name: user.display_name(),
        image_url: user.image_url.clone(),
    })
}

/// Apply a verified event. Returns whether the event type is one we act on.
pub fn apply_identity_event<U: UserStore>(
    users: &U,
    event: &IdentityEvent,
) -> Result<bool, AppError> {
    match event {
        IdentityEvent::UserCreated(user) => {
            let local = users.upsert_identity(&identity_of(user)?)?;
            tracing::info!(user_id = local.id.0, external_id = %user.id, "Identity user created");
            Ok(true)
        }
        IdentityEvent::UserUpdated(user) => {
            let name = user.display_name();
            match users.update_identity_profile(&user.id, &name, user.image_url.as_deref())? {
                Some(local) => {
                    tracing::info!(user_id = local.id.0, "Identity profile synced")
                }
                None => tracing::debug!(external_id = %user.id, "Update for unknown user ignored"),
            }
            Ok(true)
        }
        IdentityEvent::UserDeleted { id } => {
            if users.delete_user_by_external_id(id)? {
                tracing::info!(external_id = %id, "Identity user deleted");
            } else {
                tracing::debug!(external_id = %id, "Delete for unknown user ignored");
            }
            Ok(true)
        }
        IdentityEvent::Unhandled(event_type) => {
            tracing::info!(event_type = %event_type, "Unhandled identity event acknowledged");
            Ok(false)
        }
    }
}
