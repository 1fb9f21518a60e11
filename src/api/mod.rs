//! HTTP API: scan ingestion and recent-position queries.

use crate::bssid::Bssid;
use crate::estimator::{self, EstimateError, WeightedObservation};
use crate::geo::{self, Coordinate};
use crate::resolver::GeoResolver;
use crate::store::LocationStore;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{Duration, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Concurrent WiGLE lookups per scan. Independent BSSIDs resolve in
/// parallel; the estimator is order-independent so completion order does
/// not matter.
const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<GeoResolver>,
    pub store: Arc<LocationStore>,
}

/// Inbound scan: one batch of access-point observations
#[derive(Deserialize)]
struct ScanRequest {
    scan_id: i64,
    aps: Vec<ScanEntry>,
}

/// One observation within a scan. Fields are validated per entry, not by
/// the deserializer, so one bad entry cannot reject the whole scan.
#[derive(Deserialize)]
struct ScanEntry {
    #[serde(default)]
    bssid: Option<String>,
    #[serde(default)]
    rssi: Option<f64>,
}

/// Per-entry resolution failure
#[derive(Serialize)]
struct EntryError {
    bssid: Option<String>,
    error: String,
}

/// Scan response
#[derive(Serialize)]
struct ScanResponse {
    status: String,
    estimate: Option<Coordinate>,
    errors: Vec<EntryError>,
}

/// Recent-positions response
#[derive(Serialize)]
struct PositionsResponse {
    points: Vec<PositionPoint>,
    /// Display box around the mean point, absent when there are no points
    bounds: Option<Bounds>,
}

#[derive(Serialize)]
struct PositionPoint {
    #[serde(rename = "scanId")]
    scan_id: i64,
    timestamp: String,
    lat: f64,
    lon: f64,
}

#[derive(Serialize)]
struct Bounds {
    #[serde(rename = "latMin")]
    lat_min: f64,
    #[serde(rename = "latMax")]
    lat_max: f64,
    #[serde(rename = "lonMin")]
    lon_min: f64,
    #[serde(rename = "lonMax")]
    lon_max: f64,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/scan", post(receive_scan))
        .route("/api/positions", get(recent_positions))
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// POST /api/scan - Resolve a scan's BSSIDs and estimate its position
///
/// Entries that fail validation or resolution are reported individually in
/// the response; only a malformed envelope rejects the whole request. A
/// successful estimate is appended to the position log.
async fn receive_scan(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ScanResponse>, AppError> {
    let request: ScanRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::MalformedRequest(e.to_string()))?;

    info!(
        scan_id = request.scan_id,
        entries = request.aps.len(),
        "Processing scan"
    );

    let mut errors = Vec::new();
    let mut pending = Vec::new();
    for entry in &request.aps {
        let Some(raw_bssid) = entry.bssid.as_deref() else {
            errors.push(EntryError {
                bssid: None,
                error: "missing bssid".to_string(),
            });
            continue;
        };
        let Some(rssi) = entry.rssi else {
            errors.push(EntryError {
                bssid: Some(raw_bssid.to_string()),
                error: "missing rssi".to_string(),
            });
            continue;
        };
        match Bssid::parse(raw_bssid) {
            Ok(bssid) => pending.push((bssid, rssi)),
            Err(e) => errors.push(EntryError {
                bssid: Some(raw_bssid.to_string()),
                error: e.to_string(),
            }),
        }
    }

    // Resolve independent BSSIDs concurrently; collection order is
    // unspecified and does not affect the weighted estimate
    let resolved: Vec<_> = futures::stream::iter(pending)
        .map(|(bssid, rssi)| {
            let resolver = Arc::clone(&state.resolver);
            async move {
                let result = resolver.resolve(&bssid).await;
                (bssid, rssi, result)
            }
        })
        .buffer_unordered(MAX_CONCURRENT_LOOKUPS)
        .collect()
        .await;

    let mut observations = Vec::new();
    for (bssid, rssi, result) in resolved {
        match result {
            Ok(position) => observations.push(WeightedObservation {
                position,
                rssi_dbm: rssi,
            }),
            Err(e) => errors.push(EntryError {
                bssid: Some(bssid.to_string()),
                error: e.to_string(),
            }),
        }
    }

    let (status, estimate) = match estimator::weighted_centroid(&observations) {
        Ok(position) => {
            state
                .store
                .append_estimate(request.scan_id, Utc::now(), position)
                .map_err(|e| {
                    error!(scan_id = request.scan_id, error = %e, "Failed to log estimate");
                    AppError::Storage(e.to_string())
                })?;
            info!(
                scan_id = request.scan_id,
                lat = position.lat,
                lon = position.lon,
                "Scan estimated"
            );
            ("success", Some(position))
        }
        Err(EstimateError::NoObservations) => ("no valid entries", None),
        Err(EstimateError::DegenerateWeights) => ("no valid weights", None),
    };

    Ok(Json(ScanResponse {
        status: status.to_string(),
        estimate,
        errors,
    }))
}

/// GET /api/positions - Position estimates from the last 24 hours
async fn recent_positions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PositionsResponse>, AppError> {
    let cutoff = Utc::now() - Duration::hours(24);
    let estimates = state
        .store
        .estimates_since(cutoff)
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let bounds = mean_point(&estimates).and_then(|mean| {
        // ±250 m display box; only undefined at polar latitudes
        geo::bounding_box(mean, 250.0).ok().map(|bbox| Bounds {
            lat_min: bbox.lat_min,
            lat_max: bbox.lat_max,
            lon_min: bbox.lon_min,
            lon_max: bbox.lon_max,
        })
    });

    let points = estimates
        .into_iter()
        .map(|estimate| PositionPoint {
            scan_id: estimate.scan_id,
            timestamp: estimate.timestamp.to_rfc3339(),
            lat: estimate.position.lat,
            lon: estimate.position.lon,
        })
        .collect();

    Ok(Json(PositionsResponse { points, bounds }))
}

fn mean_point(estimates: &[crate::store::PositionEstimate]) -> Option<Coordinate> {
    if estimates.is_empty() {
        return None;
    }
    let n = estimates.len() as f64;
    Some(Coordinate {
        lat: estimates.iter().map(|e| e.position.lat).sum::<f64>() / n,
        lon: estimates.iter().map(|e| e.position.lon).sum::<f64>() / n,
    })
}

/// Application error types
enum AppError {
    MalformedRequest(String),
    Storage(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::MalformedRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        let body = Json(ErrorResponse {
            error: error_message,
        });
        (status, body).into_response()
    }
}
