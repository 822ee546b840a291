//! SQLite-based storage implementation

use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use landlease_core::forms::{ContactDetails, FarmerProfileInput, LandInput};
use landlease_core::Role;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{
    Application, ApplicationId, Bid, BidId, FarmerProfile, Identity, Land, LandId, LandStore,
    LandownerProfile, Lease, LeaseId, NewApplication, NewBid, NewLease, NewPayment, Payment,
    PaymentId, Principal, ProfileId, Session, SessionId, SessionStore, StoreResult, User, UserId,
    UserStore,
};
use crate::error::AppError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

const USER_COLUMNS: &str = "id, external_id, email, name, image_url, role, onboarded, \
     phone, state, district, bio, created_at, updated_at";
const FARMER_COLUMNS: &str = "id, user_id, crops, experience_years, farming_type, \
     land_size_acres, lease_duration_months, irrigation_needed, equipment_access, \
     created_at, updated_at";
const LANDOWNER_COLUMNS: &str =
    "id, user_id, verified, verification_level, created_at, updated_at";
const LAND_COLUMNS: &str = "id, owner_id, title, size_acres, land_type, soil_type, \
     irrigation_available, min_lease_months, max_lease_months, expected_rent_min, \
     expected_rent_max, allowed_crops, created_at";
const APPLICATION_COLUMNS: &str = "id, land_id, farmer_id, status, message, created_at";
const LEASE_COLUMNS: &str =
    "id, land_id, farmer_id, annual_rent, start_date, end_date, status";
const BID_COLUMNS: &str = "id, land_id, farmer_id, amount, status, created_at";
const PAYMENT_COLUMNS: &str = "id, lease_id, amount, status, paid_at, created_at";

/// SQLite-based store implementing UserStore, LandStore and SessionStore
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, AppError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self, AppError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, AppError> {
        // Enable foreign keys
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        // Run migrations
        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Current schema version (0 if no schema exists)
    pub fn schema_version(&self) -> Result<i32, AppError> {
        let conn = self.conn.lock().unwrap();
        Self::get_schema_version(&conn)
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), AppError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    fn get_schema_version(conn: &Connection) -> Result<i32, AppError> {
        let table_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        Ok(conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })?)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), AppError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                name TEXT NOT NULL,
                image_url TEXT,
                role TEXT,
                onboarded INTEGER NOT NULL DEFAULT 0,
                phone TEXT,
                state TEXT,
                district TEXT,
                bio TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS farmer_profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                crops TEXT NOT NULL,
                experience_years INTEGER NOT NULL,
                farming_type TEXT NOT NULL,
                land_size_acres REAL NOT NULL,
                lease_duration_months INTEGER NOT NULL,
                irrigation_needed INTEGER NOT NULL,
                equipment_access INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS landowner_profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                verified INTEGER NOT NULL DEFAULT 0,
                verification_level INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS lands (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL REFERENCES landowner_profiles(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                size_acres REAL NOT NULL,
                land_type TEXT NOT NULL,
                soil_type TEXT,
                irrigation_available INTEGER NOT NULL,
                min_lease_months INTEGER NOT NULL,
                max_lease_months INTEGER NOT NULL,
                expected_rent_min REAL,
                expected_rent_max REAL,
                allowed_crops TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_lands_owner ON lands(owner_id);

            CREATE TABLE IF NOT EXISTS applications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                land_id INTEGER NOT NULL REFERENCES lands(id) ON DELETE CASCADE,
                farmer_id INTEGER NOT NULL REFERENCES farmer_profiles(id) ON DELETE CASCADE,
                status TEXT NOT NULL,
                message TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_applications_land ON applications(land_id);
            CREATE INDEX IF NOT EXISTS idx_applications_farmer ON applications(farmer_id);

            CREATE TABLE IF NOT EXISTS leases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                land_id INTEGER NOT NULL REFERENCES lands(id) ON DELETE CASCADE,
                farmer_id INTEGER NOT NULL REFERENCES farmer_profiles(id) ON DELETE CASCADE,
                annual_rent REAL NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                status TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_leases_land ON leases(land_id);
            CREATE INDEX IF NOT EXISTS idx_leases_farmer ON leases(farmer_id);

            CREATE TABLE IF NOT EXISTS bids (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                land_id INTEGER NOT NULL REFERENCES lands(id) ON DELETE CASCADE,
                farmer_id INTEGER NOT NULL REFERENCES farmer_profiles(id) ON DELETE CASCADE,
                amount REAL NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS payments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                lease_id INTEGER NOT NULL REFERENCES leases(id) ON DELETE CASCADE,
                amount REAL NOT NULL,
                status TEXT NOT NULL,
                paid_at TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_payments_lease ON payments(lease_id);

            -- Sessions may exist before the user row does
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                external_id TEXT NOT NULL,
                email TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn time_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn opt_time_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn enum_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = landlease_core::Error>,
{
    let s: String = row.get(idx)?;
    s.parse().map_err(|e| conversion_error(idx, e))
}

fn list_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let s: String = row.get(idx)?;
    serde_json::from_str(&s).map_err(|e| conversion_error(idx, e))
}

fn id_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    Ok(row.get::<_, i64>(idx)? as u64)
}

fn list_json(items: &[String]) -> Result<String, AppError> {
    serde_json::to_string(items).map_err(|e| AppError::Internal(e.to_string()))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: Option<String> = row.get(5)?;
    Ok(User {
        id: UserId(id_col(row, 0)?),
        external_id: row.get(1)?,
        email: row.get(2)?,
        name: row.get(3)?,
        image_url: row.get(4)?,
        role: role
            .map(|r| Role::from_str(&r).map_err(|e| conversion_error(5, e)))
            .transpose()?,
        onboarded: row.get::<_, i32>(6)? != 0,
        phone: row.get(7)?,
        state: row.get(8)?,
        district: row.get(9)?,
        bio: row.get(10)?,
        created_at: time_col(row, 11)?,
        updated_at: time_col(row, 12)?,
    })
}

fn farmer_from_row(row: &Row<'_>) -> rusqlite::Result<FarmerProfile> {
    Ok(FarmerProfile {
        id: ProfileId(id_col(row, 0)?),
        user_id: UserId(id_col(row, 1)?),
        crops: list_col(row, 2)?,
        experience_years: row.get(3)?,
        farming_type: enum_col(row, 4)?,
        land_size_acres: row.get(5)?,
        lease_duration_months: row.get(6)?,
        irrigation_needed: row.get::<_, i32>(7)? != 0,
        equipment_access: row.get::<_, i32>(8)? != 0,
        created_at: time_col(row, 9)?,
        updated_at: time_col(row, 10)?,
    })
}

fn landowner_from_row(row: &Row<'_>) -> rusqlite::Result<LandownerProfile> {
    Ok(LandownerProfile {
        id: ProfileId(id_col(row, 0)?),
        user_id: UserId(id_col(row, 1)?),
        verified: row.get::<_, i32>(2)? != 0,
        verification_level: row.get(3)?,
        created_at: time_col(row, 4)?,
        updated_at: time_col(row, 5)?,
    })
}

fn land_from_row(row: &Row<'_>) -> rusqlite::Result<Land> {
    Ok(Land {
        id: LandId(id_col(row, 0)?),
        owner_id: ProfileId(id_col(row, 1)?),
        title: row.get(2)?,
        size_acres: row.get(3)?,
        land_type: enum_col(row, 4)?,
        soil_type: row.get(5)?,
        irrigation_available: row.get::<_, i32>(6)? != 0,
        min_lease_months: row.get(7)?,
        max_lease_months: row.get(8)?,
        expected_rent_min: row.get(9)?,
        expected_rent_max: row.get(10)?,
        allowed_crops: list_col(row, 11)?,
        created_at: time_col(row, 12)?,
    })
}

fn application_from_row(row: &Row<'_>) -> rusqlite::Result<Application> {
    Ok(Application {
        id: ApplicationId(id_col(row, 0)?),
        land_id: LandId(id_col(row, 1)?),
        farmer_id: ProfileId(id_col(row, 2)?),
        status: enum_col(row, 3)?,
        message: row.get(4)?,
        created_at: time_col(row, 5)?,
    })
}

fn lease_from_row(row: &Row<'_>) -> rusqlite::Result<Lease> {
    Ok(Lease {
        id: LeaseId(id_col(row, 0)?),
        land_id: LandId(id_col(row, 1)?),
        farmer_id: ProfileId(id_col(row, 2)?),
        annual_rent: row.get(3)?,
        start_date: time_col(row, 4)?,
        end_date: time_col(row, 5)?,
        status: enum_col(row, 6)?,
    })
}

fn bid_from_row(row: &Row<'_>) -> rusqlite::Result<Bid> {
    Ok(Bid {
        id: BidId(id_col(row, 0)?),
        land_id: LandId(id_col(row, 1)?),
        farmer_id: ProfileId(id_col(row, 2)?),
        amount: row.get(3)?,
        status: enum_col(row, 4)?,
        created_at: time_col(row, 5)?,
    })
}

fn payment_from_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
    Ok(Payment {
        id: PaymentId(id_col(row, 0)?),
        lease_id: LeaseId(id_col(row, 1)?),
        amount: row.get(2)?,
        status: enum_col(row, 3)?,
        paid_at: opt_time_col(row, 4)?,
        created_at: time_col(row, 5)?,
    })
}

fn query_user(
    conn: &Connection,
    clause: &str,
    key: &dyn rusqlite::ToSql,
) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, clause);
    Ok(conn.query_row(&sql, [key], user_from_row).optional()?)
}

fn require_user(conn: &Connection, external_id: &str) -> StoreResult<User> {
    query_user(conn, "external_id", &external_id)?.ok_or(AppError::NotFound("User"))
}

fn query_many<T>(
    conn: &Connection,
    sql: &str,
    ids: &[u64],
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> StoreResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params_from_iter(ids.iter().map(|id| *id as i64)), map)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// `SELECT ... WHERE column IN (?, ?, ...)`; empty input matches nothing
fn query_in<T>(
    conn: &Connection,
    columns: &str,
    table: &str,
    column: &str,
    ids: &[u64],
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> StoreResult<Vec<T>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT {} FROM {} WHERE {} IN ({}) ORDER BY id",
        columns, table, column, placeholders
    );
    query_many(conn, &sql, ids, map)
}

fn update_contact(
    conn: &Connection,
    user_id: UserId,
    contact: &ContactDetails,
    now: &str,
) -> StoreResult<()> {
    let rows_affected = conn.execute(
        "UPDATE users SET phone = ?1, state = ?2, district = ?3, bio = ?4, onboarded = 1, updated_at = ?5
         WHERE id = ?6",
        params![
            contact.phone,
            contact.state,
            contact.district,
            contact.bio,
            now,
            user_id.0 as i64
        ],
    )?;

    if rows_affected == 0 {
        return Err(AppError::NotFound("User"));
    }
    Ok(())
}

impl UserStore for SqliteStore {
    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        query_user(&conn, "id", &(user_id.0 as i64))
    }

    fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        query_user(&conn, "external_id", &external_id)
    }

    fn upsert_identity(&self, identity: &Identity) -> StoreResult<User> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO users (external_id, email, name, image_url, onboarded, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)
             ON CONFLICT(external_id) DO UPDATE SET
                email = excluded.email,
                name = excluded.name,
                image_url = excluded.image_url,
                updated_at = excluded.updated_at",
            params![
                identity.external_id,
                identity.email,
                identity.name,
                identity.image_url,
                now
            ],
        )?;

        require_user(&conn, &identity.external_id)
    }

    fn update_identity_profile(
        &self,
        external_id: &str,
        name: &str,
        image_url: Option<&str>,
    ) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let rows_affected = conn.execute(
            "UPDATE users SET name = ?1, image_url = ?2, updated_at = ?3 WHERE external_id = ?4",
            params![name, image_url, now, external_id],
        )?;

        if rows_affected == 0 {
            return Ok(None);
        }
        query_user(&conn, "external_id", &external_id)
    }

    fn assign_role(&self, identity: &Identity, role: Role) -> StoreResult<User> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO users (external_id, email, name, image_url, role, onboarded, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
             ON CONFLICT(external_id) DO UPDATE SET
                role = excluded.role,
                updated_at = excluded.updated_at",
            params![
                identity.external_id,
                identity.email,
                identity.name,
                identity.image_url,
                role.as_str(),
                now
            ],
        )?;

        require_user(&conn, &identity.external_id)
    }

    fn delete_user_by_external_id(&self, external_id: &str) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows_deleted = conn.execute(
            "DELETE FROM users WHERE external_id = ?1",
            params![external_id],
        )?;
        Ok(rows_deleted > 0)
    }

    fn complete_farmer_onboarding(
        &self,
        user_id: UserId,
        contact: &ContactDetails,
        profile: &FarmerProfileInput,
    ) -> StoreResult<(User, FarmerProfile)> {
        let mut conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let crops = list_json(&profile.crops)?;

        // Dropping the transaction on an early return rolls it back
        let tx = conn.transaction()?;
        update_contact(&tx, user_id, contact, &now)?;
        tx.execute(
            "INSERT INTO farmer_profiles (user_id, crops, experience_years, farming_type,
                land_size_acres, lease_duration_months, irrigation_needed, equipment_access,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             ON CONFLICT(user_id) DO UPDATE SET
                crops = excluded.crops,
                experience_years = excluded.experience_years,
                farming_type = excluded.farming_type,
                land_size_acres = excluded.land_size_acres,
                lease_duration_months = excluded.lease_duration_months,
                irrigation_needed = excluded.irrigation_needed,
                equipment_access = excluded.equipment_access,
                updated_at = excluded.updated_at",
            params![
                user_id.0 as i64,
                crops,
                profile.experience_years,
                profile.farming_type.as_str(),
                profile.land_size_acres,
                profile.lease_duration_months,
                profile.irrigation_needed as i32,
                profile.equipment_access as i32,
                now
            ],
        )?;

        let user = query_user(&tx, "id", &(user_id.0 as i64))?.ok_or(AppError::NotFound("User"))?;
        let stored = tx.query_row(
            &format!("SELECT {} FROM farmer_profiles WHERE user_id = ?1", FARMER_COLUMNS),
            params![user_id.0 as i64],
            farmer_from_row,
        )?;
        tx.commit()?;

        Ok((user, stored))
    }

    fn complete_landowner_onboarding(
        &self,
        user_id: UserId,
        contact: &ContactDetails,
    ) -> StoreResult<(User, LandownerProfile)> {
        let mut conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let tx = conn.transaction()?;
        update_contact(&tx, user_id, contact, &now)?;
        tx.execute(
            "INSERT INTO landowner_profiles (user_id, verified, verification_level, created_at, updated_at)
             VALUES (?1, 0, 0, ?2, ?2)
             ON CONFLICT(user_id) DO UPDATE SET updated_at = excluded.updated_at",
            params![user_id.0 as i64, now],
        )?;

        let user = query_user(&tx, "id", &(user_id.0 as i64))?.ok_or(AppError::NotFound("User"))?;
        let stored = tx.query_row(
            &format!("SELECT {} FROM landowner_profiles WHERE user_id = ?1", LANDOWNER_COLUMNS),
            params![user_id.0 as i64],
            landowner_from_row,
        )?;
        tx.commit()?;

        Ok((user, stored))
    }

    fn get_farmer_profile(&self, user_id: UserId) -> StoreResult<Option<FarmerProfile>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM farmer_profiles WHERE user_id = ?1", FARMER_COLUMNS),
                params![user_id.0 as i64],
                farmer_from_row,
            )
            .optional()?)
    }

    fn get_farmer_profile_by_id(
        &self,
        profile_id: ProfileId,
    ) -> StoreResult<Option<FarmerProfile>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM farmer_profiles WHERE id = ?1", FARMER_COLUMNS),
                params![profile_id.0 as i64],
                farmer_from_row,
            )
            .optional()?)
    }

    fn get_landowner_profile(&self, user_id: UserId) -> StoreResult<Option<LandownerProfile>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM landowner_profiles WHERE user_id = ?1", LANDOWNER_COLUMNS),
                params![user_id.0 as i64],
                landowner_from_row,
            )
            .optional()?)
    }
}

impl LandStore for SqliteStore {
    fn create_land(&self, owner_id: ProfileId, land: &LandInput) -> StoreResult<Land> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO lands (owner_id, title, size_acres, land_type, soil_type,
                irrigation_available, min_lease_months, max_lease_months,
                expected_rent_min, expected_rent_max, allowed_crops, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                owner_id.0 as i64,
                land.title,
                land.size_acres,
                land.land_type.as_str(),
                land.soil_type,
                land.irrigation_available as i32,
                land.min_lease_months,
                land.max_lease_months,
                land.expected_rent_min,
                land.expected_rent_max,
                list_json(&land.allowed_crops)?,
                now
            ],
        )?;

        let id = conn.last_insert_rowid();
        Ok(conn.query_row(
            &format!("SELECT {} FROM lands WHERE id = ?1", LAND_COLUMNS),
            params![id],
            land_from_row,
        )?)
    }

    fn get_land(&self, land_id: LandId) -> StoreResult<Option<Land>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM lands WHERE id = ?1", LAND_COLUMNS),
                params![land_id.0 as i64],
                land_from_row,
            )
            .optional()?)
    }

    fn list_lands_by_owner(&self, owner_id: ProfileId) -> StoreResult<Vec<Land>> {
        let conn = self.conn.lock().unwrap();
        query_in(&conn, LAND_COLUMNS, "lands", "owner_id", &[owner_id.0], land_from_row)
    }

    fn create_application(&self, application: NewApplication) -> StoreResult<Application> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO applications (land_id, farmer_id, status, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                application.land_id.0 as i64,
                application.farmer_id.0 as i64,
                application.status.as_str(),
                application.message,
                application.created_at.to_rfc3339()
            ],
        )?;

        Ok(Application {
            id: ApplicationId(conn.last_insert_rowid() as u64),
            land_id: application.land_id,
            farmer_id: application.farmer_id,
            status: application.status,
            message: application.message,
            created_at: application.created_at,
        })
    }

    fn list_applications_for_lands(&self, land_ids: &[LandId]) -> StoreResult<Vec<Application>> {
        let conn = self.conn.lock().unwrap();
        let ids: Vec<u64> = land_ids.iter().map(|id| id.0).collect();
        query_in(&conn, APPLICATION_COLUMNS, "applications", "land_id", &ids, application_from_row)
    }

    fn list_applications_by_farmer(&self, farmer_id: ProfileId) -> StoreResult<Vec<Application>> {
        let conn = self.conn.lock().unwrap();
        query_in(
            &conn,
            APPLICATION_COLUMNS,
            "applications",
            "farmer_id",
            &[farmer_id.0],
            application_from_row,
        )
    }

    fn create_lease(&self, lease: NewLease) -> StoreResult<Lease> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO leases (land_id, farmer_id, annual_rent, start_date, end_date, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                lease.land_id.0 as i64,
                lease.farmer_id.0 as i64,
                lease.annual_rent,
                lease.start_date.to_rfc3339(),
                lease.end_date.to_rfc3339(),
                lease.status.as_str()
            ],
        )?;

        Ok(Lease {
            id: LeaseId(conn.last_insert_rowid() as u64),
            land_id: lease.land_id,
            farmer_id: lease.farmer_id,
            annual_rent: lease.annual_rent,
            start_date: lease.start_date,
            end_date: lease.end_date,
            status: lease.status,
        })
    }

    fn list_leases_for_lands(&self, land_ids: &[LandId]) -> StoreResult<Vec<Lease>> {
        let conn = self.conn.lock().unwrap();
        let ids: Vec<u64> = land_ids.iter().map(|id| id.0).collect();
        query_in(&conn, LEASE_COLUMNS, "leases", "land_id", &ids, lease_from_row)
    }

    fn list_leases_by_farmer(&self, farmer_id: ProfileId) -> StoreResult<Vec<Lease>> {
        let conn = self.conn.lock().unwrap();
        query_in(&conn, LEASE_COLUMNS, "leases", "farmer_id", &[farmer_id.0], lease_from_row)
    }

    fn create_bid(&self, bid: NewBid) -> StoreResult<Bid> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO bids (land_id, farmer_id, amount, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                bid.land_id.0 as i64,
                bid.farmer_id.0 as i64,
                bid.amount,
                bid.status.as_str(),
                bid.created_at.to_rfc3339()
            ],
        )?;

        Ok(Bid {
            id: BidId(conn.last_insert_rowid() as u64),
            land_id: bid.land_id,
            farmer_id: bid.farmer_id,
            amount: bid.amount,
            status: bid.status,
            created_at: bid.created_at,
        })
    }

    fn list_bids_by_farmer(&self, farmer_id: ProfileId) -> StoreResult<Vec<Bid>> {
        let conn = self.conn.lock().unwrap();
        query_in(&conn, BID_COLUMNS, "bids", "farmer_id", &[farmer_id.0], bid_from_row)
    }

    fn create_payment(&self, payment: NewPayment) -> StoreResult<Payment> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO payments (lease_id, amount, status, paid_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                payment.lease_id.0 as i64,
                payment.amount,
                payment.status.as_str(),
                payment.paid_at.map(|t| t.to_rfc3339()),
                payment.created_at.to_rfc3339()
            ],
        )?;

        Ok(Payment {
            id: PaymentId(conn.last_insert_rowid() as u64),
            lease_id: payment.lease_id,
            amount: payment.amount,
            status: payment.status,
            paid_at: payment.paid_at,
            created_at: payment.created_at,
        })
    }

    fn list_payments_for_leases(&self, lease_ids: &[LeaseId]) -> StoreResult<Vec<Payment>> {
        let conn = self.conn.lock().unwrap();
        let ids: Vec<u64> = lease_ids.iter().map(|id| id.0).collect();
        query_in(&conn, PAYMENT_COLUMNS, "payments", "lease_id", &ids, payment_from_row)
    }
}

impl SessionStore for SqliteStore {
    fn create(&self, principal: Principal) -> StoreResult<Session> {
        let conn = self.conn.lock().unwrap();
        let session = Session {
            id: SessionId(Uuid::new_v4().to_string()),
            principal,
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO sessions (id, external_id, email, name, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.id.0,
                session.principal.external_id,
                session.principal.email,
                session.principal.name,
                session.created_at.to_rfc3339()
            ],
        )?;

        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        let conn = self.conn.lock().unwrap();

        Ok(conn
            .query_row(
                "SELECT id, external_id, email, name, created_at FROM sessions WHERE id = ?1",
                params![session_id.0],
                |row| {
                    Ok(Session {
                        id: SessionId(row.get(0)?),
                        principal: Principal {
                            external_id: row.get(1)?,
                            email: row.get(2)?,
                            name: row.get(3)?,
                        },
                        created_at: time_col(row, 4)?,
                    })
                },
            )
            .optional()?)
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id.0])?;
        Ok(())
    }
}
