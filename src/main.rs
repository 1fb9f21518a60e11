use anyhow::{anyhow, Context, Result};
use beaconmap::api::{self, AppState};
use beaconmap::config;
use beaconmap::resolver::GeoResolver;
use beaconmap::store::LocationStore;
use beaconmap::wigle::WigleClient;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beaconmap=info".into()),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "beaconmap.toml".to_string());
    let config = config::load_config(&config_path)
        .map_err(|e| anyhow!("Failed to load config '{}': {}", config_path, e))?;

    info!(db_path = %config.storage.db_path, "Opening location store");
    let store = Arc::new(LocationStore::open(&config.storage.db_path)?);
    let client = WigleClient::new(&config.wigle)?;
    let resolver = Arc::new(GeoResolver::new(Arc::clone(&store), client));

    let app = api::create_router(AppState { resolver, store });

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;
    info!(addr = %config.server.bind_addr, "beaconmap listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
