//! Storage abstractions for the marketplace

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::{InMemoryLandStore, InMemorySessionStore, InMemoryUserStore};
pub use models::*;
pub use sqlite::SqliteStore;

use landlease_core::forms::{ContactDetails, FarmerProfileInput, LandInput};
use landlease_core::Role;

use crate::error::AppError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, AppError>;

/// Trait for users and their role-specific profiles
pub trait UserStore: Send + Sync {
    /// Get a user by internal ID
    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Get a user by the identity provider's ID
    fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>>;

    /// Create the user if missing, otherwise sync email, name and avatar.
    /// Role and onboarding state of an existing user are left alone.
    fn upsert_identity(&self, identity: &Identity) -> StoreResult<User>;

    /// Sync display name and avatar; `None` if the user does not exist
    fn update_identity_profile(
        &self,
        external_id: &str,
        name: &str,
        image_url: Option<&str>,
    ) -> StoreResult<Option<User>>;

    /// Set the role, creating the user (not onboarded) if missing.
    /// Never clears `onboarded`.
    fn assign_role(&self, identity: &Identity, role: Role) -> StoreResult<User>;

    /// Delete a user and their profiles; false if there was no such user
    fn delete_user_by_external_id(&self, external_id: &str) -> StoreResult<bool>;

    /// Atomically update contact details, mark onboarded, and upsert the farmer profile
    fn complete_farmer_onboarding(
        &self,
        user_id: UserId,
        contact: &ContactDetails,
        profile: &FarmerProfileInput,
    ) -> StoreResult<(User, FarmerProfile)>;

    /// Atomically update contact details, mark onboarded, and upsert the landowner profile
    fn complete_landowner_onboarding(
        &self,
        user_id: UserId,
        contact: &ContactDetails,
    ) -> StoreResult<(User, LandownerProfile)>;

    fn get_farmer_profile(&self, user_id: UserId) -> StoreResult<Option<FarmerProfile>>;

    fn get_farmer_profile_by_id(&self, profile_id: ProfileId)
        -> StoreResult<Option<FarmerProfile>>;

    fn get_landowner_profile(&self, user_id: UserId) -> StoreResult<Option<LandownerProfile>>;
}

/// Trait for lands and the marketplace records hanging off them
pub trait LandStore: Send + Sync {
    fn create_land(&self, owner_id: ProfileId, land: &LandInput) -> StoreResult<Land>;

    fn get_land(&self, land_id: LandId) -> StoreResult<Option<Land>>;

    fn list_lands_by_owner(&self, owner_id: ProfileId) -> StoreResult<Vec<Land>>;

    fn create_application(&self, application: NewApplication) -> StoreResult<Application>;

    fn list_applications_for_lands(&self, land_ids: &[LandId]) -> StoreResult<Vec<Application>>;

    fn list_applications_by_farmer(&self, farmer_id: ProfileId) -> StoreResult<Vec<Application>>;

    fn create_lease(&self, lease: NewLease) -> StoreResult<Lease>;

    fn list_leases_for_lands(&self, land_ids: &[LandId]) -> StoreResult<Vec<Lease>>;

    fn list_leases_by_farmer(&self, farmer_id: ProfileId) -> StoreResult<Vec<Lease>>;

    fn create_bid(&self, bid: NewBid) -> StoreResult<Bid>;

    fn list_bids_by_farmer(&self, farmer_id: ProfileId) -> StoreResult<Vec<Bid>>;

    fn create_payment(&self, payment: NewPayment) -> StoreResult<Payment>;

    fn list_payments_for_leases(&self, lease_ids: &[LeaseId]) -> StoreResult<Vec<Payment>>;
}

/// Trait for session storage
pub trait SessionStore: Send + Sync {
    /// Create a new session for a principal
    fn create(&self, principal: Principal) -> StoreResult<Session>;

    /// Get a session by ID
    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>>;

    /// Delete a session
    fn delete(&self, session_id: &SessionId) -> StoreResult<()>;
}
