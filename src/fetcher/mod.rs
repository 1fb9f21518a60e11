//! Bulk area download pipeline.
//!
//! For each configured center point the fetcher queries the WiGLE area
//! search over a bounding box, pages through the results, keeps only
//! networks within the true circular radius, and bulk-inserts them into the
//! location cache. Survivors are inserted page by page so a failure on a
//! later page never discards progress already made.

use crate::bssid::Bssid;
use crate::geo::{self, Coordinate, GeoError};
use crate::store::{CacheEntry, EntryMetadata, LocationStore};
use crate::wigle::{NetworkResult, SearchOutcome, WigleClient, WigleError};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};


/// Why pagination for a center stopped early.
#[derive(Debug)]
pub enum FetchError {
    /// Bounding box undefined at this latitude
    Geo(GeoError),
    /// The request itself failed (HTTP or transport)
    Remote(WigleError),
    /// The API reported an application-level error
    Application(String),
    /// The continuation token did not advance between full pages
    RepeatedPageToken(String),
    /// Cache write failed
    Storage(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Geo(e) => write!(f, "{}", e),
            FetchError::Remote(e) => write!(f, "{}", e),
            FetchError::Application(msg) => write!(f, "WiGLE API error: {}", msg),
            FetchError::RepeatedPageToken(token) => {
                write!(f, "Continuation token '{}' did not advance", token)
            }
            FetchError::Storage(msg) => write!(f, "Location store error: {}", msg),
        }
    }
}

/// Outcome of fetching one center point.
#[derive(Debug)]
pub struct CenterReport {
    pub center: Coordinate,
    /// Requests issued, including the one that failed (if any)
    pub pages: u32,
    /// Results returned by the API before filtering
    pub fetched: usize,
    /// Results that were complete and within the inclusion radius
    pub kept: usize,
    /// Rows actually created in the cache
    pub inserted: usize,
    /// Set when pagination stopped early; inserts before the failure stand
    pub error: Option<FetchError>,
}

/// Downloads access-point locations around configured center points.
pub struct AreaFetcher {
    store: Arc<LocationStore>,
    client: WigleClient,
    radius_meters: f64,
    page_size: u32,
    variance: f64,
}

impl AreaFetcher {
    pub fn new(
        store: Arc<LocationStore>,
        client: WigleClient,
        radius_meters: f64,
        page_size: u32,
        variance: f64,
    ) -> Self {
        Self {
            store,
            client,
            radius_meters,
            page_size,
            variance,
        }
    }

    /// Fetch every center in order, isolating failures between them.
    ///
    /// A center that fails is reported in its `CenterReport` and processing
    /// moves on to the next center.
    pub async fn fetch_all(&self, centers: &[Coordinate]) -> Vec<CenterReport> {
        let mut reports = Vec::with_capacity(centers.len());
        for &center in centers {
            let report = self.fetch_center(center).await;
            match &report.error {
                None => info!(
                    lat = center.lat,
                    lon = center.lon,
                    pages = report.pages,
                    fetched = report.fetched,
                    kept = report.kept,
                    inserted = report.inserted,
                    "Center complete"
                ),
                Some(e) => error!(
                    lat = center.lat,
                    lon = center.lon,
                    inserted = report.inserted,
                    error = %e,
                    "Center aborted"
                ),
            }
            reports.push(report);
        }
        reports
    }

    /// Walk the paginated area search for one center.
    ///
    /// Stops on an empty page or a missing continuation token. A token that
    /// repeats after a full page round would loop forever against a
    /// misbehaving server, so it is treated as a protocol error instead.
    pub async fn fetch_center(&self, center: Coordinate) -> CenterReport {
        let mut report = CenterReport {
            center,
            pages: 0,
            fetched: 0,
            kept: 0,
            inserted: 0,
            error: None,
        };

        let bbox = match geo::bounding_box(center, self.radius_meters) {
            Ok(bbox) => bbox,
            Err(e) => {
                report.error = Some(FetchError::Geo(e));
                return report;
            }
        };

        let mut search_after: Option<String> = None;
        loop {
            let outcome = self
                .client
                .search_area(
                    &bbox,
                    self.page_size,
                    self.variance,
                    search_after.as_deref(),
                )
                .await;
            report.pages += 1;

            let (results, next_page) = match outcome {
                Ok(SearchOutcome::Success { results, next_page }) => (results, next_page),
                Ok(SearchOutcome::ApplicationError { message }) => {
                    report.error = Some(FetchError::Application(message));
                    break;
                }
                Err(e) => {
                    report.error = Some(FetchError::Remote(e));
                    break;
                }
            };

            if results.is_empty() {
                break;
            }
            report.fetched += results.len();

            let entries = self.filter_page(center, &results);
            report.kept += entries.len();

            match self.store.bulk_insert_if_absent(&entries) {
                Ok(count) => report.inserted += count,
                Err(e) => {
                    report.error = Some(FetchError::Storage(e.to_string()));
                    break;
                }
            }

            match next_page {
                None => break,
                Some(token) => {
                    if search_after.as_deref() == Some(token.as_str()) {
                        report.error = Some(FetchError::RepeatedPageToken(token));
                        break;
                    }
                    search_after = Some(token);
                }
            }
        }

        report
    }

    /// Keep results that are complete, parseable, and within the true
    /// circular radius of the center. The bounding box over-includes corner
    /// regions, so the haversine check is not optional.
    fn filter_page(&self, center: Coordinate, results: &[NetworkResult]) -> Vec<CacheEntry> {
        results
            .iter()
            .filter_map(|result| {
                let net_id = result.net_id.as_deref()?;
                let (lat, lon) = match (result.trilat, result.trilong) {
                    (Some(lat), Some(lon)) => (lat, lon),
                    _ => return None,
                };
                let bssid = match Bssid::parse(net_id) {
                    Ok(bssid) => bssid,
                    Err(e) => {
                        warn!(netid = net_id, error = %e, "Skipping unparseable BSSID");
                        return None;
                    }
                };

                let position = Coordinate { lat, lon };
                if geo::distance_meters(center, position) > self.radius_meters {
                    return None;
                }

                Some(CacheEntry {
                    bssid,
                    position,
                    metadata: EntryMetadata {
                        last_update: result.last_update.clone(),
                        road: result.road.clone(),
                        channel: result.channel,
                        house_number: result.house_number.clone(),
                    },
                })
            })
            .collect()
    }
}
