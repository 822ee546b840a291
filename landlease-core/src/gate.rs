//! Access gate: per-request routing decision over the onboarding funnel.
//!
//! The gate keeps no state of its own. Callers resolve the principal's
//! funnel position on every request and ask [`AccessGate::decide`] what
//! to do with it.

use crate::domain::Role;
use crate::status::OnboardingStatus;

/// Funnel position of the principal making a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No authenticated session
    Anonymous,
    NeedsRole,
    NeedsProfile(Role),
    Complete(Role),
    /// Status lookup failed; treated like `NeedsRole` so protected pages stay closed
    Unresolved,
}

impl GateState {
    /// Build from a resolved status and the stored role
    pub fn from_status(status: OnboardingStatus, role: Option<Role>) -> Self {
        match (status, role) {
            (OnboardingStatus::NeedsProfile, Some(role)) => GateState::NeedsProfile(role),
            (OnboardingStatus::Complete, Some(role)) => GateState::Complete(role),
            _ => GateState::NeedsRole,
        }
    }
}

/// How the gate treats a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Assets; never gated
    Static,
    /// On the public allow-list
    Public,
    /// JSON endpoints; handlers answer 401 themselves
    Api,
    /// Everything else
    Page,
}

/// Outcome of a gate decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(String),
}

/// Path layout the gate routes against
#[derive(Debug, Clone)]
pub struct GatePaths {
    pub sign_in: String,
    pub role_selection: String,
    pub onboarding_namespace: String,
    pub api_prefix: String,
    pub public: Vec<String>,
    pub static_prefixes: Vec<String>,
}

impl Default for GatePaths {
    fn default() -> Self {
        Self {
            sign_in: "/sign-in".to_string(),
            role_selection: "/onboarding".to_string(),
            onboarding_namespace: "/onboarding".to_string(),
            api_prefix: "/api".to_string(),
            public: vec![
                "/".to_string(),
                "/sign-in".to_string(),
                "/sign-up".to_string(),
                "/api/webhooks".to_string(),
            ],
            static_prefixes: vec!["/static".to_string(), "/assets".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    paths: GatePaths,
}

impl AccessGate {
    pub fn new(paths: GatePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &GatePaths {
        &self.paths
    }

    /// Classify a request path
    pub fn classify(&self, path: &str) -> RequestClass {
        let path = normalize(path);

        if self
            .paths
            .static_prefixes
            .iter()
            .any(|prefix| under(path, prefix))
            || path.rsplit('/').next().is_some_and(|seg| seg.contains('.'))
        {
            return RequestClass::Static;
        }

        // "/" is only public as an exact match, otherwise it would cover everything
        let is_public = self.paths.public.iter().any(|p| {
            if p == "/" {
                path == "/"
            } else {
                under(path, p)
            }
        });
        if is_public {
            return RequestClass::Public;
        }

        if under(path, &self.paths.api_prefix) {
            return RequestClass::Api;
        }

        RequestClass::Page
    }

    /// Whether the path is an onboarding page
    pub fn is_onboarding(&self, path: &str) -> bool {
        under(normalize(path), &self.paths.onboarding_namespace)
    }

    /// Decide what to do with a request.
    ///
    /// `query` is the raw query string, kept in the sign-in return URL.
    pub fn decide(&self, state: GateState, path: &str, query: Option<&str>) -> Decision {
        match self.classify(path) {
            RequestClass::Static | RequestClass::Public | RequestClass::Api => {
                return Decision::Allow
            }
            RequestClass::Page => {}
        }

        let path = normalize(path);
        match state {
            GateState::Anonymous => Decision::Redirect(self.sign_in_url(path, query)),
            GateState::NeedsRole | GateState::Unresolved => {
                if path == self.paths.role_selection {
                    Decision::Allow
                } else {
                    Decision::Redirect(self.paths.role_selection.clone())
                }
            }
            GateState::NeedsProfile(role) => {
                if under(path, role.onboarding_path()) {
                    Decision::Allow
                } else {
                    Decision::Redirect(role.onboarding_path().to_string())
                }
            }
            GateState::Complete(role) => {
                if self.is_onboarding(path) || under(path, role.other().namespace()) {
                    Decision::Redirect(role.dashboard_path().to_string())
                } else {
                    Decision::Allow
                }
            }
        }
    }

    /// Sign-in URL that returns to `path` afterwards
    pub fn sign_in_url(&self, path: &str, query: Option<&str>) -> String {
        let target = match query {
            Some(q) if !q.is_empty() => format!("{}?{}", path, q),
            _ => path.to_string(),
        };
        format!(
            "{}?redirect_url={}",
            self.paths.sign_in,
            urlencoding::encode(&target)
        )
    }
}

/// Drop a trailing slash, keeping "/" itself
fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Segment-prefix match: `/onboarding` covers `/onboarding/x` but not `/onboardingx`
fn under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
