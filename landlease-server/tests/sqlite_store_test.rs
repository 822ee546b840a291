//! SQLite store tests: persistence, migrations and atomic onboarding

use chrono::{Duration, Utc};
use landlease_core::forms::{ContactDetails, FarmerProfileInput, LandInput};
use landlease_core::{FarmingType, LandType, LeaseStatus, PaymentStatus, Role};
use landlease_server::store::{
    Identity, LandStore, NewLease, NewPayment, Principal, SessionStore, SqliteStore, UserId,
    UserStore,
};
use tempfile::TempDir;

fn create_test_store() -> (SqliteStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.db");
    let store = SqliteStore::open(path.to_str().unwrap()).unwrap();
    (store, dir) // Return dir to keep it alive
}

fn identity(external_id: &str) -> Identity {
    Identity {
        external_id: external_id.to_string(),
        email: format!("{}@example.com", external_id),
        name: "Gurpreet Kaur".to_string(),
        image_url: None,
    }
}

fn contact() -> ContactDetails {
    ContactDetails {
        phone: "9876500003".to_string(),
        state: "Punjab".to_string(),
        district: "Amritsar".to_string(),
        bio: None,
    }
}

fn farmer_input(crops: &[&str]) -> FarmerProfileInput {
    FarmerProfileInput {
        crops: crops.iter().map(|c| c.to_string()).collect(),
        experience_years: 5,
        farming_type: FarmingType::Commercial,
        land_size_acres: 8.0,
        lease_duration_months: 24,
        irrigation_needed: true,
        equipment_access: false,
    }
}

fn land_input() -> LandInput {
    LandInput {
        title: "Canal-side field".to_string(),
        size_acres: 12.5,
        land_type: LandType::Agricultural,
        soil_type: Some("Alluvial".to_string()),
        irrigation_available: true,
        min_lease_months: 6,
        max_lease_months: 36,
        expected_rent_min: Some(15_000.0),
        expected_rent_max: None,
        allowed_crops: vec!["Rice".to_string()],
    }
}

/// Test: a fresh database is migrated to the current schema
#[test]
fn test_schema_is_migrated() {
    let (store, _dir) = create_test_store();
    assert_eq!(store.schema_version().unwrap(), 1);
}

/// Test: data survives reopening the database file
#[test]
fn test_data_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("persist.db");
    let path = path.to_str().unwrap();

    {
        let store = SqliteStore::open(path).unwrap();
        store.assign_role(&identity("user_p"), Role::Farmer).unwrap();
    }

    let store = SqliteStore::open(path).unwrap();
    let user = store.get_user_by_external_id("user_p").unwrap().unwrap();
    assert_eq!(user.role, Some(Role::Farmer));
    assert_eq!(store.schema_version().unwrap(), 1);
}

/// Test: upserting an identity never resets role or onboarding
#[test]
fn test_upsert_identity_keeps_progress() {
    let (store, _dir) = create_test_store();
    let user = store.assign_role(&identity("user_u"), Role::Farmer).unwrap();
    store
        .complete_farmer_onboarding(user.id, &contact(), &farmer_input(&["Rice"]))
        .unwrap();

    let mut renamed = identity("user_u");
    renamed.name = "G. Kaur".to_string();
    let user = store.upsert_identity(&renamed).unwrap();

    assert_eq!(user.name, "G. Kaur");
    assert_eq!(user.role, Some(Role::Farmer));
    assert!(user.onboarded);
}

/// Test: assign_role creates the user once and never clears onboarded
#[test]
fn test_assign_role_is_idempotent_and_one_way() {
    let (store, _dir) = create_test_store();
    let first = store.assign_role(&identity("user_r"), Role::Landowner).unwrap();
    let second = store.assign_role(&identity("user_r"), Role::Landowner).unwrap();
    assert_eq!(first.id, second.id);
    assert!(!second.onboarded);

    store.complete_landowner_onboarding(first.id, &contact()).unwrap();
    let switched = store.assign_role(&identity("user_r"), Role::Farmer).unwrap();
    assert_eq!(switched.role, Some(Role::Farmer));
    assert!(switched.onboarded);
}

/// Test: farmer completion writes contact, flag and profile together
#[test]
fn test_complete_farmer_onboarding() {
    let (store, _dir) = create_test_store();
    let user = store.assign_role(&identity("user_f"), Role::Farmer).unwrap();

    let (user, profile) = store
        .complete_farmer_onboarding(user.id, &contact(), &farmer_input(&["Rice", "Maize"]))
        .unwrap();
    assert!(user.onboarded);
    assert_eq!(user.district.as_deref(), Some("Amritsar"));
    assert_eq!(profile.crops, vec!["Rice".to_string(), "Maize".to_string()]);

    // Second submission updates the same profile row
    let (_, again) = store
        .complete_farmer_onboarding(user.id, &contact(), &farmer_input(&["Cotton"]))
        .unwrap();
    assert_eq!(again.id, profile.id);
    let stored = store.get_farmer_profile_by_id(profile.id).unwrap().unwrap();
    assert_eq!(stored.crops, vec!["Cotton".to_string()]);
    assert_eq!(stored.farming_type, FarmingType::Commercial);
}

/// Test: completion for a missing user fails without writing anything
#[test]
fn test_complete_onboarding_for_missing_user_fails() {
    let (store, _dir) = create_test_store();

    let input = farmer_input(&["Rice"]);
    let result = store.complete_farmer_onboarding(UserId(999), &contact(), &input);

    assert!(result.is_err());
    assert!(store.get_farmer_profile(UserId(999)).unwrap().is_none());
}

/// Test: landowner profile upsert keeps verification fields
#[test]
fn test_landowner_profile_upsert() {
    let (store, _dir) = create_test_store();
    let user = store.assign_role(&identity("user_l"), Role::Landowner).unwrap();

    let (_, first) = store.complete_landowner_onboarding(user.id, &contact()).unwrap();
    let (_, second) = store.complete_landowner_onboarding(user.id, &contact()).unwrap();

    assert_eq!(first.id, second.id);
    assert!(!second.verified);
    assert_eq!(second.verification_level, 0);
}

/// Test: lands, leases and payments round-trip through the store
#[test]
fn test_land_records() {
    let (store, _dir) = create_test_store();
    let user = store.assign_role(&identity("user_o"), Role::Landowner).unwrap();
    let (_, owner) = store.complete_landowner_onboarding(user.id, &contact()).unwrap();
    let farmer_user = store.assign_role(&identity("user_t"), Role::Farmer).unwrap();
    let (_, farmer) = store
        .complete_farmer_onboarding(farmer_user.id, &contact(), &farmer_input(&["Rice"]))
        .unwrap();

    let land = store.create_land(owner.id, &land_input()).unwrap();
    assert_eq!(store.get_land(land.id).unwrap().unwrap(), land);
    assert_eq!(store.list_lands_by_owner(owner.id).unwrap(), vec![land.clone()]);

    let now = Utc::now();
    let lease = store
        .create_lease(NewLease {
            land_id: land.id,
            farmer_id: farmer.id,
            annual_rent: 60_000.0,
            start_date: now,
            end_date: now + Duration::days(365),
            status: LeaseStatus::Active,
        })
        .unwrap();
    store
        .create_payment(NewPayment {
            lease_id: lease.id,
            amount: 5_000.0,
            status: PaymentStatus::Completed,
            paid_at: Some(now),
            created_at: now,
        })
        .unwrap();

    assert_eq!(store.list_leases_for_lands(&[land.id]).unwrap().len(), 1);
    assert_eq!(store.list_leases_by_farmer(farmer.id).unwrap()[0].id, lease.id);
    assert!(store.list_leases_for_lands(&[]).unwrap().is_empty());
    let payments = store.list_payments_for_leases(&[lease.id]).unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Completed);
}

/// Test: deleting a user cascades to their profiles
#[test]
fn test_delete_user_cascades() {
    let (store, _dir) = create_test_store();
    let user = store.assign_role(&identity("user_d"), Role::Farmer).unwrap();
    store
        .complete_farmer_onboarding(user.id, &contact(), &farmer_input(&["Rice"]))
        .unwrap();

    assert!(store.delete_user_by_external_id("user_d").unwrap());
    assert!(!store.delete_user_by_external_id("user_d").unwrap());
    assert!(store.get_user(user.id).unwrap().is_none());
    assert!(store.get_farmer_profile(user.id).unwrap().is_none());
}

/// Test: update_identity_profile is a no-op for unknown users
#[test]
fn test_update_identity_profile() {
    let (store, _dir) = create_test_store();
    assert!(store
        .update_identity_profile("user_none", "Nobody", None)
        .unwrap()
        .is_none());

    store.upsert_identity(&identity("user_i")).unwrap();
    let user = store
        .update_identity_profile("user_i", "New Name", Some("https://img.example.com/b.png"))
        .unwrap()
        .unwrap();
    assert_eq!(user.name, "New Name");
    assert_eq!(user.image_url.as_deref(), Some("https://img.example.com/b.png"));
}

/// Test: sessions persist their principal
#[test]
fn test_session_lifecycle() {
    let (store, _dir) = create_test_store();
    let principal = Principal {
        external_id: "user_s".to_string(),
        email: "user_s@example.com".to_string(),
        name: "S".to_string(),
    };

    let session = store.create(principal.clone()).unwrap();
    let loaded = store.get(&session.id).unwrap().unwrap();
    assert_eq!(loaded.principal, principal);

    store.delete(&session.id).unwrap();
    assert!(store.get(&session.id).unwrap().is_none());
}
