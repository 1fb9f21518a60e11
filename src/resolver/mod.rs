//! Cache-or-fetch BSSID resolution.
//!
//! A resolver call is terminal: cache hit, remote hit (cached for next
//! time), or a typed failure. Failures never write to the cache, so a
//! transient outage is not remembered as permanent absence. The resolver
//! never retries; callers that want resilience wrap it with their own
//! retry policy.

use crate::bssid::Bssid;
use crate::geo::Coordinate;
use crate::store::{CacheEntry, LocationStore};
use crate::wigle::{SearchOutcome, WigleClient, WigleError};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(test)]
mod tests;

/// Resolution failures
#[derive(Debug)]
pub enum ResolveError {
    /// The API answered but had no usable coordinates for this BSSID
    NoLocationData,
    /// The API reported an application-level error
    Application(String),
    /// Non-2xx HTTP status from the API
    Http { status: u16, body: String },
    /// Network-level failure reaching the API
    Transport(String),
    /// Cache read or write failed
    Storage(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NoLocationData => write!(f, "WiGLE returned no location data"),
            ResolveError::Application(msg) => write!(f, "WiGLE API error: {}", msg),
            ResolveError::Http { status, body } => write!(f, "WiGLE HTTP {}: {}", status, body),
            ResolveError::Transport(msg) => write!(f, "WiGLE request failed: {}", msg),
            ResolveError::Storage(msg) => write!(f, "Location store error: {}", msg),
        }
    }
}

impl From<WigleError> for ResolveError {
    fn from(e: WigleError) -> Self {
        match e {
            WigleError::Http { status, body } => ResolveError::Http { status, body },
            WigleError::Transport(msg) => ResolveError::Transport(msg),
            WigleError::Decode(msg) => ResolveError::Transport(format!("malformed response: {}", msg)),
        }
    }
}

/// Resolves BSSIDs to coordinates, cache first.
pub struct GeoResolver {
    store: Arc<LocationStore>,
    client: WigleClient,
}

impl GeoResolver {
    pub fn new(store: Arc<LocationStore>, client: WigleClient) -> Self {
        Self { store, client }
    }

    /// Resolve one BSSID.
    ///
    /// # Flow
    /// 1. Cache hit → return the stored coordinate, no network call
    /// 2. Cache miss → single-BSSID WiGLE lookup
    /// 3. Usable result → insert-if-absent into the cache, return it
    /// 4. Anything else → typed failure, cache untouched
    pub async fn resolve(&self, bssid: &Bssid) -> Result<Coordinate, ResolveError> {
        if let Some(position) = self
            .store
            .lookup(bssid)
            .map_err(|e| ResolveError::Storage(e.to_string()))?
        {
            debug!(bssid = %bssid, "Cache hit");
            return Ok(position);
        }

        let outcome = self.client.search_network(bssid).await?;
        let results = match outcome {
            SearchOutcome::Success { results, .. } => results,
            SearchOutcome::ApplicationError { message } => {
                return Err(ResolveError::Application(message));
            }
        };

        // The API orders results by relevance; only the first is considered.
        let position = results
            .first()
            .and_then(|r| match (r.trilat, r.trilong) {
                (Some(lat), Some(lon)) => Some(Coordinate { lat, lon }),
                _ => None,
            })
            .ok_or(ResolveError::NoLocationData)?;

        info!(bssid = %bssid, lat = position.lat, lon = position.lon, "Resolved via WiGLE");

        self.store
            .insert_if_absent(&CacheEntry::bare(bssid.clone(), position))
            .map_err(|e| ResolveError::Storage(e.to_string()))?;

        Ok(position)
    }
}
