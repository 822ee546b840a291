//! Onboarding funnel position of a principal

use serde::{Deserialize, Serialize};

use crate::domain::Role;

/// Where a principal sits in the onboarding funnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStatus {
    NeedsRole,
    NeedsProfile,
    Complete,
}

impl OnboardingStatus {
    /// Resolve from the local user record, if any.
    ///
    /// `record` is `(role, onboarded)`. A missing record means the role has
    /// not been picked yet; nothing is created here.
    pub fn resolve(record: Option<(Option<Role>, bool)>) -> Self {
        match record {
            None | Some((None, _)) => OnboardingStatus::NeedsRole,
            Some((Some(_), false)) => OnboardingStatus::NeedsProfile,
            Some((Some(_), true)) => OnboardingStatus::Complete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OnboardingStatus::NeedsRole => "needs_role",
            OnboardingStatus::NeedsProfile => "needs_profile",
            OnboardingStatus::Complete => "complete",
        }
    }

    pub fn needs_onboarding(&self) -> bool {
        *self != OnboardingStatus::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_record_needs_role() {
        assert_eq!(OnboardingStatus::resolve(None), OnboardingStatus::NeedsRole);
    }

    #[test]
    fn test_record_without_role_needs_role() {
        // onboarded without a role is inconsistent; role wins
        assert_eq!(
            OnboardingStatus::resolve(Some((None, true))),
            OnboardingStatus::NeedsRole
        );
        assert_eq!(
            OnboardingStatus::resolve(Some((None, false))),
            OnboardingStatus::NeedsRole
        );
    }

    #[test]
    fn test_role_set_not_onboarded_needs_profile() {
        for role in Role::ALL {
            assert_eq!(
                OnboardingStatus::resolve(Some((Some(*role), false))),
                OnboardingStatus::NeedsProfile
            );
        }
    }

    #[test]
    fn test_role_set_and_onboarded_is_complete() {
        let status = OnboardingStatus::resolve(Some((Some(Role::Landowner), true)));
        assert_eq!(status, OnboardingStatus::Complete);
        assert!(!status.needs_onboarding());
    }

    #[test]
    fn test_serialized_form() {
        assert_eq!(
            serde_json::to_string(&OnboardingStatus::NeedsProfile).unwrap(),
            "\"needs_profile\""
        );
    }
}
