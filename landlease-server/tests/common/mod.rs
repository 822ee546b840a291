//! Common test utilities for marketplace integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use landlease_core::forms::{ContactDetails, FarmerProfileInput, LandInput};
use landlease_core::{Role, WebhookVerifier};
use landlease_server::store::{
    Application, Bid, FarmerProfile, Identity, Land, LandId, LandownerProfile, Lease, LeaseId,
    NewApplication, NewBid, NewLease, NewPayment, Payment, Principal, ProfileId, StoreResult, User,
    UserId,
};
use landlease_server::{
    create_router_with_options, AppError, AppState, InMemoryLandStore, InMemorySessionStore,
    InMemoryUserStore, LandStore, RouterOptions, SessionStore, UserStore,
};
use serde_json::{json, Value};

pub const WEBHOOK_SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";
pub const SESSION_COOKIE: &str = "__session";

pub type MemoryState<L = InMemoryLandStore> =
    Arc<AppState<InMemoryUserStore, L, InMemorySessionStore>>;

pub fn verifier() -> WebhookVerifier {
    WebhookVerifier::new(WEBHOOK_SECRET).unwrap()
}

/// State over in-memory stores with a custom land store
pub fn state_with_lands<L: LandStore>(lands: L) -> MemoryState<L> {
    Arc::new(AppState::new(
        InMemoryUserStore::new(),
        lands,
        InMemorySessionStore::new(),
        Some(verifier()),
    ))
}

/// Test server over any state, with test routes mounted
pub fn server_for<U, L, S>(state: Arc<AppState<U, L, S>>) -> TestServer
where
    U: UserStore + 'static,
    L: LandStore + 'static,
    S: SessionStore + 'static,
{
    let app = create_router_with_options(
        state,
        RouterOptions {
            enable_test_routes: true,
        },
    );
    TestServer::new(app).expect("Failed to create test server")
}

/// Create a test server over in-memory stores
pub fn create_test_server() -> (TestServer, MemoryState) {
    let state = state_with_lands(InMemoryLandStore::new());
    (server_for(state.clone()), state)
}

pub fn principal(external_id: &str) -> Principal {
    Principal {
        external_id: external_id.to_string(),
        email: format!("{}@example.com", external_id),
        name: format!("User {}", external_id),
    }
}

/// Open a session for `external_id` and return its cookie
pub fn sign_in<U, L, S>(state: &AppState<U, L, S>, external_id: &str) -> cookie::Cookie<'static>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    let session = state
        .session_store
        .create(principal(external_id))
        .expect("Failed to create session");
    cookie::Cookie::new(SESSION_COOKIE, session.id.0)
}

pub fn farmer_form() -> Value {
    json!({
        "phone": "9876500001",
        "state": "Punjab",
        "district": "Ludhiana",
        "bio": "Third generation wheat farmer",
        "crops": ["Wheat", " Rice ", "Wheat", ""],
        "experience": "12",
        "farming_type": "ORGANIC",
        "land_size": 25,
        "lease_duration": "36",
        "irrigation_needed": true,
        "equipment_access": "on",
    })
}

pub fn landowner_form() -> Value {
    json!({
        "phone": "9876500002",
        "state": "Haryana",
        "district": "Karnal",
    })
}

pub fn landowner_form_with_land() -> Value {
    let mut form = landowner_form();
    form["land_title"] = json!("North field");
    form["land_size"] = json!("40");
    form["land_type"] = json!("AGRICULTURAL");
    form["soil_type"] = json!("Loamy");
    form["irrigation_available"] = json!(true);
    form["min_lease_duration"] = json!(24);
    form["max_lease_duration"] = json!(12);
    form["expected_rent_min"] = json!(30000);
    form["expected_rent_max"] = json!(20000);
    form["allowed_crops"] = json!(["Wheat", "Sugarcane"]);
    form
}

/// Take a principal through role selection and profile completion
pub async fn onboard(
    server: &TestServer,
    session: &cookie::Cookie<'static>,
    role: &str,
    form: Value,
) {
    let response = server
        .post("/onboarding")
        .add_cookie(session.clone())
        .json(&json!({ "role": role }))
        .await;
    assert_eq!(response.status_code(), 200);

    let path = match role {
        "FARMER" => "/onboarding/farmer",
        _ => "/onboarding/landowner",
    };
    let response = server.post(path).add_cookie(session.clone()).json(&form).await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
}

pub fn location(response: &axum_test::TestResponse) -> String {
    response
        .headers()
        .get("location")
        .expect("No Location header")
        .to_str()
        .expect("Location header is not ASCII")
        .to_string()
}

/// Header pair for `TestRequest::add_header`
pub fn header(name: &'static str, value: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(name),
        HeaderValue::from_str(value).expect("Invalid header value"),
    )
}

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
}

/// Land store that fails selected operations on demand
#[derive(Default)]
pub struct FailingLandStore {
    inner: InMemoryLandStore,
    pub fail_create_land: AtomicBool,
    pub fail_payments: AtomicBool,
}

impl FailingLandStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(flag: &AtomicBool) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(AppError::Persistence("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl LandStore for FailingLandStore {
    fn create_land(&self, owner_id: ProfileId, land: &LandInput) -> StoreResult<Land> {
        Self::check(&self.fail_create_land)?;
        self.inner.create_land(owner_id, land)
    }

    fn get_land(&self, land_id: LandId) -> StoreResult<Option<Land>> {
        self.inner.get_land(land_id)
    }

    fn list_lands_by_owner(&self, owner_id: ProfileId) -> StoreResult<Vec<Land>> {
        self.inner.list_lands_by_owner(owner_id)
    }

    fn create_application(&self, application: NewApplication) -> StoreResult<Application> {
        self.inner.create_application(application)
    }

    fn list_applications_for_lands(&self, land_ids: &[LandId]) -> StoreResult<Vec<Application>> {
        self.inner.list_applications_for_lands(land_ids)
    }

    fn list_applications_by_farmer(&self, farmer_id: ProfileId) -> StoreResult<Vec<Application>> {
        self.inner.list_applications_by_farmer(farmer_id)
    }

    fn create_lease(&self, lease: NewLease) -> StoreResult<Lease> {
        self.inner.create_lease(lease)
    }

    fn list_leases_for_lands(&self, land_ids: &[LandId]) -> StoreResult<Vec<Lease>> {
        self.inner.list_leases_for_lands(land_ids)
    }

    fn list_leases_by_farmer(&self, farmer_id: ProfileId) -> StoreResult<Vec<Lease>> {
        self.inner.list_leases_by_farmer(farmer_id)
    }

    fn create_bid(&self, bid: NewBid) -> StoreResult<Bid> {
        self.inner.create_bid(bid)
    }

    fn list_bids_by_farmer(&self, farmer_id: ProfileId) -> StoreResult<Vec<Bid>> {
        self.inner.list_bids_by_farmer(farmer_id)
    }

    fn create_payment(&self, payment: NewPayment) -> StoreResult<Payment> {
        self.inner.create_payment(payment)
    }

    fn list_payments_for_leases(&self, lease_ids: &[LeaseId]) -> StoreResult<Vec<Payment>> {
        Self::check(&self.fail_payments)?;
        self.inner.list_payments_for_leases(lease_ids)
    }
}

/// User store whose lookups by external id always fail
#[derive(Default)]
pub struct FailingUserStore {
    inner: InMemoryUserStore,
}

impl FailingUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for FailingUserStore {
    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        self.inner.get_user(user_id)
    }

    fn get_user_by_external_id(&self, _external_id: &str) -> StoreResult<Option<User>> {
        Err(AppError::Persistence("database is locked".to_string()))
    }

    fn upsert_identity(&self, identity: &Identity) -> StoreResult<User> {
        self.inner.upsert_identity(identity)
    }

    fn update_identity_profile(
        &self,
        external_id: &str,
        name: &str,
        image_url: Option<&str>,
    ) -> StoreResult<Option<User>> {
        self.inner.update_identity_profile(external_id, name, image_url)
    }

    fn assign_role(&self, identity: &Identity, role: Role) -> StoreResult<User> {
        self.inner.assign_role(identity, role)
    }

    fn delete_user_by_external_id(&self, external_id: &str) -> StoreResult<bool> {
        self.inner.delete_user_by_external_id(external_id)
    }

    fn complete_farmer_onboarding(
        &self,
        user_id: UserId,
        contact: &ContactDetails,
        profile: &FarmerProfileInput,
    ) -> StoreResult<(User, FarmerProfile)> {
        self.inner.complete_farmer_onboarding(user_id, contact, profile)
    }

    fn complete_landowner_onboarding(
        &self,
        user_id: UserId,
        contact: &ContactDetails,
    ) -> StoreResult<(User, LandownerProfile)> {
        self.inner.complete_landowner_onboarding(user_id, contact)
    }

    fn get_farmer_profile(&self, user_id: UserId) -> StoreResult<Option<FarmerProfile>> {
        self.inner.get_farmer_profile(user_id)
    }

    fn get_farmer_profile_by_id(
        &self,
        profile_id: ProfileId,
    ) -> StoreResult<Option<FarmerProfile>> {
        self.inner.get_farmer_profile_by_id(profile_id)
    }

    fn get_landowner_profile(&self, user_id: UserId) -> StoreResult<Option<LandownerProfile>> {
        self.inner.get_landowner_profile(user_id)
    }
}
