//! Data models for marketplace storage

use chrono::{DateTime, Utc};
use landlease_core::{
    ApplicationStatus, BidStatus, FarmingType, LandStatus, LandType, LeaseStatus, PaymentStatus,
    Role,
};
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);
    };
}

id_type!(
    /// Internal user identifier (not the identity provider's id)
    UserId
);
id_type!(
    /// Farmer or landowner profile identifier
    ProfileId
);
id_type!(LandId);
id_type!(ApplicationId);
id_type!(LeaseId);
id_type!(BidId);
id_type!(PaymentId);

/// Opaque session token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// The authenticated identity making a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Identity provider's user id
    pub external_id: String,
    pub email: String,
    pub name: String,
}

/// Identity fields as known to the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
}

impl From<&Principal> for Identity {
    fn from(p: &Principal) -> Self {
        Identity {
            external_id: p.external_id.clone(),
            email: p.email.clone(),
            name: p.name.clone(),
            image_url: None,
        }
    }
}

/// A marketplace account, linked to an identity-provider user
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
    pub role: Option<Role>,
    pub onboarded: bool,
    pub phone: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
    pub role: Option<Role>,
    pub onboarded: bool,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self {
        UserSummary {
            id: u.id,
            external_id: u.external_id.clone(),
            email: u.email.clone(),
            name: u.name.clone(),
            image_url: u.image_url.clone(),
            role: u.role,
            onboarded: u.onboarded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmerProfile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub crops: Vec<String>,
    pub experience_years: u8,
    pub farming_type: FarmingType,
    pub land_size_acres: f64,
    pub lease_duration_months: u16,
    pub irrigation_needed: bool,
    pub equipment_access: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandownerProfile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub verified: bool,
    pub verification_level: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A parcel offered for lease by a landowner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Land {
    pub id: LandId,
    pub owner_id: ProfileId,
    pub title: String,
    pub size_acres: f64,
    pub land_type: LandType,
    pub soil_type: Option<String>,
    pub irrigation_available: bool,
    pub min_lease_months: u16,
    pub max_lease_months: u16,
    pub expected_rent_min: Option<f64>,
    pub expected_rent_max: Option<f64>,
    pub allowed_crops: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A farmer's request to lease a land
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Application {
    pub id: ApplicationId,
    pub land_id: LandId,
    pub farmer_id: ProfileId,
    pub status: ApplicationStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewApplication {
    pub land_id: LandId,
    pub farmer_id: ProfileId,
    pub status: ApplicationStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A lease; `annual_rent` is per year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lease {
    pub id: LeaseId,
    pub land_id: LandId,
    pub farmer_id: ProfileId,
    pub annual_rent: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: LeaseStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLease {
    pub land_id: LandId,
    pub farmer_id: ProfileId,
    pub annual_rent: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: LeaseStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bid {
    pub id: BidId,
    pub land_id: LandId,
    pub farmer_id: ProfileId,
    pub amount: f64,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBid {
    pub land_id: LandId,
    pub farmer_id: ProfileId,
    pub amount: f64,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    pub lease_id: LeaseId,
    pub amount: f64,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub lease_id: LeaseId,
    pub amount: f64,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A user session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub principal: Principal,
    pub created_at: DateTime<Utc>,
}

/// Land status is derived: leased while any lease on it is active
pub fn land_status(land: &Land, leases: &[Lease]) -> LandStatus {
    let leased = leases
        .iter()
        .any(|l| l.land_id == land.id && l.status == LeaseStatus::Active);
    if leased {
        LandStatus::Leased
    } else {
        LandStatus::Available
    }
}
