// Bulk cache pre-fill: downloads access-point locations around the
// configured center points and stores them in the location cache.

use anyhow::{anyhow, bail, Result};
use beaconmap::config;
use beaconmap::fetcher::AreaFetcher;
use beaconmap::store::LocationStore;
use beaconmap::wigle::WigleClient;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
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

    let centers = config.download.centers();
    if centers.is_empty() {
        bail!("No center points configured under [download]");
    }

    info!(
        db_path = %config.storage.db_path,
        centers = centers.len(),
        radius_m = config.download.radius_meters,
        "Starting bulk download"
    );

    let store = Arc::new(LocationStore::open(&config.storage.db_path)?);
    let client = WigleClient::new(&config.wigle)?;
    let fetcher = AreaFetcher::new(
        store,
        client,
        config.download.radius_meters,
        config.download.page_size,
        config.download.variance,
    );

    let reports = fetcher.fetch_all(&centers).await;

    let inserted: usize = reports.iter().map(|r| r.inserted).sum();
    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    info!(
        centers = reports.len(),
        failed,
        inserted,
        "Bulk download finished"
    );

    if failed == reports.len() {
        bail!("All {} center points failed", failed);
    }
    Ok(())
}
