//! Dashboard aggregators: read-only rollups over profiles, lands,
//! applications, leases, bids and payments.
//!
//! Sections are fetched one after another and each independently, so a
//! failed query leaves the rest of the page renderable.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use landlease_core::{ApplicationStatus, BidStatus, LandStatus, LeaseStatus, PaymentStatus};
use serde::Serialize;

use crate::error::AppError;
use crate::store::{
    land_status, FarmerProfile, Land, LandId, LandStore, LandownerProfile, Lease, ProfileId, User,
    UserId, UserStore, UserSummary,
};

pub const TREND_MONTHS: usize = 6;
pub const MAX_ACTIVITIES: usize = 10;
pub const MAX_PENDING_APPLICATIONS: usize = 5;

/// One independently fetched part of a dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Section<T> {
    Ready { data: T },
    Failed { error: String },
}

impl<T> Section<T> {
    fn from_result(section: &'static str, result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Section::Ready { data },
            Err(e) => {
                tracing::error!(section, error = %e, "Dashboard section failed");
                Section::Failed {
                    error: format!("Could not load {}", section.replace('_', " ")),
                }
            }
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Section::Ready { data } => Some(data),
            Section::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Section::Failed { .. })
    }
}

/// A user with contact details
#[derive(Debug, Clone, Serialize)]
pub struct UserDetails {
    #[serde(flatten)]
    pub summary: UserSummary,
    pub phone: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub bio: Option<String>,
}

impl From<&User> for UserDetails {
    fn from(u: &User) -> Self {
        UserDetails {
            summary: UserSummary::from(u),
            phone: u.phone.clone(),
            state: u.state.clone(),
            district: u.district.clone(),
            bio: u.bio.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FarmerUser {
    #[serde(flatten)]
    pub details: UserDetails,
    pub farmer_profile: FarmerProfile,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FarmerStats {
    pub total_applications: usize,
    pub pending_applications: usize,
    pub approved_applications: usize,
    pub active_leases: usize,
    pub leased_acres: f64,
    pub monthly_rent: f64,
    pub active_bids: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FarmerDashboard {
    pub user: FarmerUser,
    pub stats: Section<FarmerStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LandownerStats {
    pub total_lands: usize,
    pub available_lands: usize,
    pub active_leases: usize,
    pub total_acres: f64,
    pub pending_applications: usize,
    pub monthly_revenue: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LandView {
    #[serde(flatten)]
    pub land: Land,
    pub status: LandStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub id: u64,
    pub land_id: LandId,
    pub land_title: String,
    pub farmer_id: ProfileId,
    pub farmer_name: String,
    pub status: ApplicationStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenuePoint {
    /// `YYYY-MM`
    pub month: String,
    /// Short month name
    pub label: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Application,
    Lease,
    Payment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub id: u64,
    pub title: String,
    pub amount: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LandownerDashboard {
    pub user: UserDetails,
    pub profile: LandownerProfile,
    pub stats: Section<LandownerStats>,
    pub lands: Section<Vec<LandView>>,
    pub applications: Section<Vec<ApplicationView>>,
    pub revenue_trend: Section<Vec<RevenuePoint>>,
    pub recent_activities: Section<Vec<Activity>>,
}

fn monthly(annual_rent: f64) -> f64 {
    annual_rent / 12.0
}

fn load_user<U: UserStore>(users: &U, user_id: UserId) -> Result<User, AppError> {
    users.get_user(user_id)?.ok_or(AppError::NotFound("User"))
}

/// Farmer dashboard for an onboarded farmer
pub fn get_farmer_dashboard<U: UserStore, L: LandStore>(
    users: &U,
    lands: &L,
    user_id: UserId,
) -> Result<FarmerDashboard, AppError> {
    let user = load_user(users, user_id)?;
    let profile = users
        .get_farmer_profile(user_id)?
        .ok_or(AppError::NotFound("Farmer profile"))?;

    let stats = Section::from_result("stats", farmer_stats(lands, profile.id));

    Ok(FarmerDashboard {
        user: FarmerUser {
            details: UserDetails::from(&user),
            farmer_profile: profile,
        },
        stats,
    })
}

fn farmer_stats<L: LandStore>(lands: &L, farmer_id: ProfileId) -> Result<FarmerStats, AppError> {
    let applications = lands.list_applications_by_farmer(farmer_id)?;
    let leases = lands.list_leases_by_farmer(farmer_id)?;
    let bids = lands.list_bids_by_farmer(farmer_id)?;

    let active: Vec<&Lease> = leases
        .iter()
        .filter(|l| l.status == LeaseStatus::Active)
        .collect();

    let mut leased_acres = 0.0;
    for lease in &active {
        if let Some(land) = lands.get_land(lease.land_id)? {
            leased_acres += land.size_acres;
        }
    }

    let count = |status: ApplicationStatus| {
        applications
            .iter()
            .filter(|a| a.status == status)
            .count()
    };

    Ok(FarmerStats {
        total_applications: applications.len(),
        pending_applications: count(ApplicationStatus::Pending),
        approved_applications: count(ApplicationStatus::Approved),
        active_leases: active.len(),
        leased_acres,
        monthly_rent: active.iter().map(|l| monthly(l.annual_rent)).sum(),
        active_bids: bids.iter().filter(|b| b.status == BidStatus::Pending).count(),
    })
}

/// Landowner dashboard for an onboarded landowner
pub fn get_landowner_dashboard<U: UserStore, L: LandStore>(
    users: &U,
    lands: &L,
    user_id: UserId,
) -> Result<LandownerDashboard, AppError> {
    get_landowner_dashboard_at(users, lands, user_id, Utc::now())
}

/// Landowner dashboard as of `now` (drives the revenue trend window)
pub fn get_landowner_dashboard_at<U: UserStore, L: LandStore>(
    users: &U,
    lands: &L,
    user_id: UserId,
    now: DateTime<Utc>,
) -> Result<LandownerDashboard, AppError> {
    let user = load_user(users, user_id)?;
    let profile = users
        .get_landowner_profile(user_id)?
        .ok_or(AppError::NotFound("Landowner profile"))?;

    let owner = profile.id;
    let stats = Section::from_result("stats", landowner_stats(lands, owner));
    let land_views = Section::from_result("lands", land_views(lands, owner));
    let applications =
        Section::from_result("applications", pending_applications(users, lands, owner));
    let trend = Section::from_result(
        "revenue_trend",
        owned_leases(lands, owner).map(|(_, leases)| revenue_trend(&leases, now)),
    );
    let activities = Section::from_result("recent_activities", recent_activities(lands, owner));

    Ok(LandownerDashboard {
        user: UserDetails::from(&user),
        profile,
        stats,
        lands: land_views,
        applications,
        revenue_trend: trend,
        recent_activities: activities,
    })
}

fn owned_leases<L: LandStore>(
    lands: &L,
    owner: ProfileId,
) -> Result<(Vec<Land>, Vec<Lease>), AppError> {
    let owned = lands.list_lands_by_owner(owner)?;
    let ids: Vec<LandId> = owned.iter().map(|l| l.id).collect();
    let leases = lands.list_leases_for_lands(&ids)?;
    Ok((owned, leases))
}

fn landowner_stats<L: LandStore>(lands: &L, owner: ProfileId) -> Result<LandownerStats, AppError> {
    let (owned, leases) = owned_leases(lands, owner)?;
    let ids: Vec<LandId> = owned.iter().map(|l| l.id).collect();
    let applications = lands.list_applications_for_lands(&ids)?;
    let lease_ids: Vec<_> = leases.iter().map(|l| l.id).collect();
    let payments = lands.list_payments_for_leases(&lease_ids)?;

    let active_leases = owned
        .iter()
        .filter(|land| land_status(land, &leases) == LandStatus::Leased)
        .count();

    Ok(LandownerStats {
        total_lands: owned.len(),
        available_lands: owned.len() - active_leases,
        active_leases,
        total_acres: owned.iter().map(|l| l.size_acres).sum(),
        pending_applications: applications
            .iter()
            .filter(|a| a.status == ApplicationStatus::Pending)
            .count(),
        monthly_revenue: leases
            .iter()
            .filter(|l| l.status == LeaseStatus::Active)
            .map(|l| monthly(l.annual_rent))
            .sum(),
        total_revenue: payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Completed)
            .map(|p| p.amount)
            .sum(),
    })
}

fn land_views<L: LandStore>(lands: &L, owner: ProfileId) -> Result<Vec<LandView>, AppError> {
    let (owned, leases) = owned_leases(lands, owner)?;
    Ok(owned
        .into_iter()
        .map(|land| {
            let status = land_status(&land, &leases);
            LandView { land, status }
        })
        .collect())
}

fn pending_applications<U: UserStore, L: LandStore>(
    users: &U,
    lands: &L,
    owner: ProfileId,
) -> Result<Vec<ApplicationView>, AppError> {
    let owned = lands.list_lands_by_owner(owner)?;
    let titles: HashMap<LandId, &str> = owned.iter().map(|l| (l.id, l.title.as_str())).collect();
    let ids: Vec<LandId> = owned.iter().map(|l| l.id).collect();

    let mut pending: Vec<_> = lands
        .list_applications_for_lands(&ids)?
        .into_iter()
        .filter(|a| a.status == ApplicationStatus::Pending)
        .collect();
    pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    pending.truncate(MAX_PENDING_APPLICATIONS);

    let mut views = Vec::with_capacity(pending.len());
    for application in pending {
        let farmer_name = match users.get_farmer_profile_by_id(application.farmer_id)? {
            Some(profile) => users.get_user(profile.user_id)?.map(|u| u.name),
            None => None,
        };
        views.push(ApplicationView {
            id: application.id.0,
            land_id: application.land_id,
            land_title: titles
                .get(&application.land_id)
                .copied()
                .unwrap_or_default()
                .to_string(),
            farmer_id: application.farmer_id,
            farmer_name: farmer_name.unwrap_or_else(|| "Unknown farmer".to_string()),
            status: application.status,
            message: application.message,
            created_at: application.created_at,
        });
    }
    Ok(views)
}

/// Rent of leases starting in each of the last six calendar months
/// (the current one included), oldest first. Empty months report zero.
pub fn revenue_trend(leases: &[Lease], now: DateTime<Utc>) -> Vec<RevenuePoint> {
    let mut year = now.year();
    let mut month = now.month();
    let mut buckets = Vec::with_capacity(TREND_MONTHS);
    for _ in 0..TREND_MONTHS {
        buckets.push((year, month));
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    buckets.reverse();

    buckets
        .into_iter()
        .map(|(year, month)| {
            let revenue = leases
                .iter()
                .filter(|l| l.start_date.year() == year && l.start_date.month() == month)
                .map(|l| l.annual_rent)
                .sum();
            let label = NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.format("%b").to_string())
                .unwrap_or_default();
            RevenuePoint {
                month: format!("{:04}-{:02}", year, month),
                label,
                revenue,
            }
        })
        .collect()
}

fn recent_activities<L: LandStore>(lands: &L, owner: ProfileId) -> Result<Vec<Activity>, AppError> {
    let (owned, leases) = owned_leases(lands, owner)?;
    let titles: HashMap<LandId, &str> = owned.iter().map(|l| (l.id, l.title.as_str())).collect();
    let title = |id: &LandId| titles.get(id).copied().unwrap_or("a land");
    let ids: Vec<LandId> = owned.iter().map(|l| l.id).collect();
    let applications = lands.list_applications_for_lands(&ids)?;
    let lease_ids: Vec<_> = leases.iter().map(|l| l.id).collect();
    let payments = lands.list_payments_for_leases(&lease_ids)?;

    let mut activities: Vec<Activity> = applications
        .iter()
        .map(|a| Activity {
            kind: ActivityKind::Application,
            id: a.id.0,
            title: format!("New application for {}", title(&a.land_id)),
            amount: None,
            timestamp: a.created_at,
        })
        .chain(leases.iter().map(|l| Activity {
            kind: ActivityKind::Lease,
            id: l.id.0,
            title: format!("Lease started on {}", title(&l.land_id)),
            amount: Some(l.annual_rent),
            timestamp: l.start_date,
        }))
        .chain(payments.iter().map(|p| Activity {
            kind: ActivityKind::Payment,
            id: p.id.0,
            title: match p.status {
                PaymentStatus::Completed => "Payment received".to_string(),
                PaymentStatus::Pending => "Payment pending".to_string(),
                PaymentStatus::Failed => "Payment failed".to_string(),
            },
            amount: Some(p.amount),
            timestamp: p.paid_at.unwrap_or(p.created_at),
        }))
        .collect();

    activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    activities.truncate(MAX_ACTIVITIES);
    Ok(activities)
}
