use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod demo;
mod error;
mod rate_limiter;
mod resolver;
mod routes;
mod state;
mod validation;

use common::backend::BackendConfig;
use common::gateway::HttpRecordGateway;
use common::schema::Schema;
use common::session::SessionManager;
use common::store::{self, StoreConfig};

use crate::demo::DemoDirectory;
use crate::rate_limiter::{RateLimiter, RateLimiterConfig};
use crate::resolver::AccessResolver;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting authentication service");

    // Shared state store
    let store_config = StoreConfig::from_env();
    let store = store::connect(&store_config).await?;
    if store.health_check().await? {
        info!("State store connection successful");
    } else {
        anyhow::bail!("Failed to connect to state store");
    }

    let backend = BackendConfig::from_env();
    if !backend.is_configured() {
        warn!("Record store credentials not set, only demo access codes will resolve");
    }

    let schema = Schema::from_env()?;
    let gateway = Arc::new(HttpRecordGateway::new());
    let resolver = AccessResolver::new(gateway, schema.identity, DemoDirectory::from_env());

    let operator_key = std::env::var("OPERATOR_KEY")
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty());
    if operator_key.is_none() {
        info!("OPERATOR_KEY not set, backend override endpoints are disabled");
    }

    let app_state = AppState {
        resolver,
        sessions: SessionManager::from_env(store.clone()),
        store,
        backend,
        operator_key,
        rate_limiter: RateLimiter::new(RateLimiterConfig::from_env()),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let addr = std::env::var("AUTH_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Authentication service listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
