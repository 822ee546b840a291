//! In-memory storage implementations

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::Utc;
use landlease_core::forms::{ContactDetails, FarmerProfileInput, LandInput};
use landlease_core::Role;
use uuid::Uuid;

use super::{
    Application, ApplicationId, Bid, BidId, FarmerProfile, Identity, Land, LandId, LandStore,
    LandownerProfile, Lease, LeaseId, NewApplication, NewBid, NewLease, NewPayment, Payment,
    PaymentId, Principal, ProfileId, Session, SessionId, SessionStore, StoreResult, User, UserId,
    UserStore,
};
use crate::error::AppError;

/// In-memory user and profile store
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
    farmer_profiles: RwLock<HashMap<UserId, FarmerProfile>>,
    landowner_profiles: RwLock<HashMap<UserId, LandownerProfile>>,
    next_user_id: AtomicU64,
    next_profile_id: AtomicU64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            farmer_profiles: RwLock::new(HashMap::new()),
            landowner_profiles: RwLock::new(HashMap::new()),
            next_user_id: AtomicU64::new(1),
            next_profile_id: AtomicU64::new(1),
        }
    }

    /// Number of stored users (for testing purposes)
    pub fn user_count(&self) -> usize {
        self.users.read().unwrap().len()
    }

    fn new_user(&self, identity: &Identity, role: Option<Role>) -> User {
        let now = Utc::now();
        User {
            id: UserId(self.next_user_id.fetch_add(1, Ordering::SeqCst)),
            external_id: identity.external_id.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            image_url: identity.image_url.clone(),
            role,
            onboarded: false,
            phone: None,
            state: None,
            district: None,
            bio: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_contact(user: &mut User, contact: &ContactDetails) {
    user.phone = Some(contact.phone.clone());
    user.state = Some(contact.state.clone());
    user.district = Some(contact.district.clone());
    user.bio = contact.bio.clone();
    user.onboarded = true;
    user.updated_at = Utc::now();
}

impl UserStore for InMemoryUserStore {
    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().unwrap().get(&user_id).cloned())
    }

    fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().unwrap();
        Ok(users
            .values()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    fn upsert_identity(&self, identity: &Identity) -> StoreResult<User> {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users
            .values_mut()
            .find(|u| u.external_id == identity.external_id)
        {
            user.email = identity.email.clone();
            user.name = identity.name.clone();
            user.image_url = identity.image_url.clone();
            user.updated_at = Utc::now();
            return Ok(user.clone());
        }

        let user = self.new_user(identity, None);
        users.insert(user.id, user.clone());
        Ok(user)
    }

    fn update_identity_profile(
        &self,
        external_id: &str,
        name: &str,
        image_url: Option<&str>,
    ) -> StoreResult<Option<User>> {
        let mut users = self.users.write().unwrap();
        Ok(users
            .values_mut()
            .find(|u| u.external_id == external_id)
            .map(|user| {
                user.name = name.to_string();
                user.image_url = image_url.map(str::to_string);
                user.updated_at = Utc::now();
                user.clone()
            }))
    }

    fn assign_role(&self, identity: &Identity, role: Role) -> StoreResult<User> {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users
            .values_mut()
            .find(|u| u.external_id == identity.external_id)
        {
            user.role = Some(role);
            user.updated_at = Utc::now();
            return Ok(user.clone());
        }

        let user = self.new_user(identity, Some(role));
        users.insert(user.id, user.clone());
        Ok(user)
    }

    fn delete_user_by_external_id(&self, external_id: &str) -> StoreResult<bool> {
        let mut users = self.users.write().unwrap();
        let Some(user_id) = users
            .values()
            .find(|u| u.external_id == external_id)
            .map(|u| u.id)
        else {
            return Ok(false);
        };

        users.remove(&user_id);
        self.farmer_profiles.write().unwrap().remove(&user_id);
        self.landowner_profiles.write().unwrap().remove(&user_id);
        Ok(true)
    }

    fn complete_farmer_onboarding(
        &self,
        user_id: UserId,
        contact: &ContactDetails,
        profile: &FarmerProfileInput,
    ) -> StoreResult<(User, FarmerProfile)> {
        // Both locks held for the whole unit so readers never see half of it
        let mut users = self.users.write().unwrap();
        let mut profiles = self.farmer_profiles.write().unwrap();

        let user = users.get_mut(&user_id).ok_or(AppError::NotFound("User"))?;
        apply_contact(user, contact);

        let now = Utc::now();
        let stored = profiles.entry(user_id).or_insert_with(|| FarmerProfile {
            id: ProfileId(self.next_profile_id.fetch_add(1, Ordering::SeqCst)),
            user_id,
            crops: Vec::new(),
            experience_years: 0,
            farming_type: profile.farming_type,
            land_size_acres: 0.0,
            lease_duration_months: 0,
            irrigation_needed: false,
            equipment_access: false,
            created_at: now,
            updated_at: now,
        });
        stored.crops = profile.crops.clone();
        stored.experience_years = profile.experience_years;
        stored.farming_type = profile.farming_type;
        stored.land_size_acres = profile.land_size_acres;
        stored.lease_duration_months = profile.lease_duration_months;
        stored.irrigation_needed = profile.irrigation_needed;
        stored.equipment_access = profile.equipment_access;
        stored.updated_at = now;

        Ok((user.clone(), stored.clone()))
    }

    fn complete_landowner_onboarding(
        &self,
        user_id: UserId,
        contact: &ContactDetails,
    ) -> StoreResult<(User, LandownerProfile)> {
        let mut users = self.users.write().unwrap();
        let mut profiles = self.landowner_profiles.write().unwrap();

        let user = users.get_mut(&user_id).ok_or(AppError::NotFound("User"))?;
        apply_contact(user, contact);

        let now = Utc::now();
        let stored = profiles.entry(user_id).or_insert_with(|| LandownerProfile {
            id: ProfileId(self.next_profile_id.fetch_add(1, Ordering::SeqCst)),
            user_id,
            verified: false,
            verification_level: 0,
            created_at: now,
            updated_at: now,
        });
        stored.updated_at = now;

        Ok((user.clone(), stored.clone()))
    }

    fn get_farmer_profile(&self, user_id: UserId) -> StoreResult<Option<FarmerProfile>> {
        Ok(self.farmer_profiles.read().unwrap().get(&user_id).cloned())
    }

    fn get_farmer_profile_by_id(
        &self,
        profile_id: ProfileId,
    ) -> StoreResult<Option<FarmerProfile>> {
        let profiles = self.farmer_profiles.read().unwrap();
        Ok(profiles.values().find(|p| p.id == profile_id).cloned())
    }

    fn get_landowner_profile(&self, user_id: UserId) -> StoreResult<Option<LandownerProfile>> {
        Ok(self.landowner_profiles.read().unwrap().get(&user_id).cloned())
    }
}

/// In-memory land, application, lease, bid and payment store
pub struct InMemoryLandStore {
    lands: RwLock<HashMap<LandId, Land>>,
    applications: RwLock<HashMap<ApplicationId, Application>>,
    leases: RwLock<HashMap<LeaseId, Lease>>,
    bids: RwLock<HashMap<BidId, Bid>>,
    payments: RwLock<HashMap<PaymentId, Payment>>,
    next_id: AtomicU64,
}

impl InMemoryLandStore {
    pub fn new() -> Self {
        Self {
            lands: RwLock::new(HashMap::new()),
            applications: RwLock::new(HashMap::new()),
            leases: RwLock::new(HashMap::new()),
            bids: RwLock::new(HashMap::new()),
            payments: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for InMemoryLandStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Values sorted by id, so listings are stable
fn sorted<K, V: Clone, F>(map: &HashMap<K, V>, keep: F, key: fn(&V) -> u64) -> Vec<V>
where
    F: Fn(&V) -> bool,
{
    let mut out: Vec<V> = map.values().filter(|v| keep(v)).cloned().collect();
    out.sort_by_key(key);
    out
}

impl LandStore for InMemoryLandStore {
    fn create_land(&self, owner_id: ProfileId, land: &LandInput) -> StoreResult<Land> {
        let land = Land {
            id: LandId(self.next()),
            owner_id,
            title: land.title.clone(),
            size_acres: land.size_acres,
            land_type: land.land_type,
            soil_type: land.soil_type.clone(),
            irrigation_available: land.irrigation_available,
            min_lease_months: land.min_lease_months,
            max_lease_months: land.max_lease_months,
            expected_rent_min: land.expected_rent_min,
            expected_rent_max: land.expected_rent_max,
            allowed_crops: land.allowed_crops.clone(),
            created_at: Utc::now(),
        };
        self.lands.write().unwrap().insert(land.id, land.clone());
        Ok(land)
    }

    fn get_land(&self, land_id: LandId) -> StoreResult<Option<Land>> {
        Ok(self.lands.read().unwrap().get(&land_id).cloned())
    }

    fn list_lands_by_owner(&self, owner_id: ProfileId) -> StoreResult<Vec<Land>> {
        let lands = self.lands.read().unwrap();
        Ok(sorted(&*lands, |l| l.owner_id == owner_id, |l| l.id.0))
    }

    fn create_application(&self, application: NewApplication) -> StoreResult<Application> {
        let application = Application {
            id: ApplicationId(self.next()),
            land_id: application.land_id,
            farmer_id: application.farmer_id,
            status: application.status,
            message: application.message,
            created_at: application.created_at,
        };
        self.applications
            .write()
            .unwrap()
            .insert(application.id, application.clone());
        Ok(application)
    }

    fn list_applications_for_lands(&self, land_ids: &[LandId]) -> StoreResult<Vec<Application>> {
        let applications = self.applications.read().unwrap();
        Ok(sorted(&*applications, |a| land_ids.contains(&a.land_id), |a| a.id.0))
    }

    fn list_applications_by_farmer(&self, farmer_id: ProfileId) -> StoreResult<Vec<Application>> {
        let applications = self.applications.read().unwrap();
        Ok(sorted(&*applications, |a| a.farmer_id == farmer_id, |a| a.id.0))
    }

    fn create_lease(&self, lease: NewLease) -> StoreResult<Lease> {
        let lease = Lease {
            id: LeaseId(self.next()),
            land_id: lease.land_id,
            farmer_id: lease.farmer_id,
            annual_rent: lease.annual_rent,
            start_date: lease.start_date,
            end_date: lease.end_date,
            status: lease.status,
        };
        self.leases.write().unwrap().insert(lease.id, lease.clone());
        Ok(lease)
    }

    fn list_leases_for_lands(&self, land_ids: &[LandId]) -> StoreResult<Vec<Lease>> {
        let leases = self.leases.read().unwrap();
        Ok(sorted(&*leases, |l| land_ids.contains(&l.land_id), |l| l.id.0))
    }

    fn list_leases_by_farmer(&self, farmer_id: ProfileId) -> StoreResult<Vec<Lease>> {
        let leases = self.leases.read().unwrap();
        Ok(sorted(&*leases, |l| l.farmer_id == farmer_id, |l| l.id.0))
    }

    fn create_bid(&self, bid: NewBid) -> StoreResult<Bid> {
        let bid = Bid {
            id: BidId(self.next()),
            land_id: bid.land_id,
            farmer_id: bid.farmer_id,
            amount: bid.amount,
            status: bid.status,
            created_at: bid.created_at,
        };
        self.bids.write().unwrap().insert(bid.id, bid.clone());
        Ok(bid)
    }

    fn list_bids_by_farmer(&self, farmer_id: ProfileId) -> StoreResult<Vec<Bid>> {
        let bids = self.bids.read().unwrap();
        Ok(sorted(&*bids, |b| b.farmer_id == farmer_id, |b| b.id.0))
    }

    fn create_payment(&self, payment: NewPayment) -> StoreResult<Payment> {
        let payment = Payment {
            id: PaymentId(self.next()),
            lease_id: payment.lease_id,
            amount: payment.amount,
            status: payment.status,
            paid_at: payment.paid_at,
            created_at: payment.created_at,
        };
        self.payments
            .write()
            .unwrap()
            .insert(payment.id, payment.clone());
        Ok(payment)
    }

    fn list_payments_for_leases(&self, lease_ids: &[LeaseId]) -> StoreResult<Vec<Payment>> {
        let payments = self.payments.read().unwrap();
        Ok(sorted(&*payments, |p| lease_ids.contains(&p.lease_id), |p| p.id.0))
    }
}

/// In-memory session store
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, principal: Principal) -> StoreResult<Session> {
        let session = Session {
            id: SessionId(Uuid::new_v4().to_string()),
            principal,
            created_at: Utc::now(),
        };
        self.sessions
            .write()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        Ok(self.sessions.read().unwrap().get(session_id).cloned())
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        self.sessions.write().unwrap().remove(session_id);
        Ok(())
    }
}
