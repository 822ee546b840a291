//! Landlease marketplace server

use std::sync::Arc;

use anyhow::{Context, Result};
use landlease_core::WebhookVerifier;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use landlease_server::{
    create_router_with_options, AppState, Config, InMemoryLandStore, InMemorySessionStore,
    InMemoryUserStore, LandStore, RouterOptions, SessionStore, SqliteStore, UserStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "landlease_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(?config, "Loaded configuration");

    let verifier = match &config.webhook_secret {
        Some(secret) => Some(WebhookVerifier::new(secret).context("invalid webhook secret")?),
        None => {
            tracing::warn!("No webhook secret configured; identity webhooks will be refused");
            None
        }
    };

    match &config.database_path {
        Some(path) => {
            let store = Arc::new(
                SqliteStore::open(path).with_context(|| format!("opening database {}", path))?,
            );
            tracing::info!(path = %path, "Using SQLite store");
            let state = AppState::from_shared(store.clone(), store.clone(), store, verifier);
            serve(state, &config).await
        }
        None => {
            tracing::warn!("DATABASE_PATH not set; data lives in memory only");
            let state = AppState::new(
                InMemoryUserStore::new(),
                InMemoryLandStore::new(),
                InMemorySessionStore::new(),
                verifier,
            );
            serve(state, &config).await
        }
    }
}

async fn serve<U, L, S>(state: AppState<U, L, S>, config: &Config) -> Result<()>
where
    U: UserStore + 'static,
    L: LandStore + 'static,
    S: SessionStore + 'static,
{
    let state = Arc::new(state.with_session_cookie(config.session_cookie.clone()));
    let app = create_router_with_options(
        state,
        RouterOptions {
            enable_test_routes: config.enable_test_routes,
        },
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Marketplace listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
