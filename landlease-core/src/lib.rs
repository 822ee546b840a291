//! Landlease Core Library
//!
//! Request-independent logic of the land-leasing marketplace:
//! - Where a principal sits in the onboarding funnel
//! - Which page a request may see given that position
//! - Typed, lenient onboarding form contracts
//! - Identity-provider webhook verification

pub mod domain;
pub mod error;
pub mod forms;
pub mod gate;
pub mod status;
pub mod webhook;

pub use domain::{
    ApplicationStatus, BidStatus, FarmingType, LandStatus, LandType, LeaseStatus, PaymentStatus,
    Role,
};
pub use error::{Error, FieldError, ValidationErrors};
pub use gate::{AccessGate, Decision, GatePaths, GateState, RequestClass};
pub use status::OnboardingStatus;
pub use webhook::{IdentityEvent, IdentityUser, WebhookHeaders, WebhookVerifier};

/// Result type for landlease-core operations
pub type Result<T> = std::result::Result<T, Error>;
