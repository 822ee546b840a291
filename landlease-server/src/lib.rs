//! Landlease marketplace server
//!
//! HTTP surface of the land-leasing marketplace: the onboarding funnel
//! (gate, role selection, per-role completion), the identity webhook and
//! the role dashboards.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod identity;
pub mod onboarding;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::AppError;
pub use routes::{create_router, create_router_with_options, RouterOptions};
pub use state::AppState;
pub use store::{
    InMemoryLandStore, InMemorySessionStore, InMemoryUserStore, LandStore, SessionStore,
    SqliteStore, UserStore,
};
