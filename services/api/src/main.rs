use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod error;
mod fixtures;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;

use common::backend::BackendConfig;
use common::gateway::HttpRecordGateway;
use common::schema::Schema;
use common::session::SessionManager;
use common::store::{self, StoreConfig};

use crate::{repositories::StudentDataRepository, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting API service");

    // Shared state store, holding the sessions opened by the auth service
    let store_config = StoreConfig::from_env();
    let store = store::connect(&store_config).await?;
    if store.health_check().await? {
        info!("State store connection successful");
    } else {
        anyhow::bail!("Failed to connect to state store");
    }

    let backend = BackendConfig::from_env();
    if !backend.is_configured() {
        warn!("Record store credentials not set, serving demo data only");
    }

    let schema = Schema::from_env()?;
    let repository = StudentDataRepository::new(Arc::new(HttpRecordGateway::new()), schema);

    let app_state = AppState {
        repository,
        sessions: SessionManager::from_env(store.clone()),
        store,
        backend,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let addr = std::env::var("API_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
