//! HTTP client for the WiGLE network search API.
//!
//! Covers the two calls this service makes: single-BSSID lookup and
//! paginated area search. The API is treated as untrusted: responses are
//! decoded into typed structs with every field optional, then folded into
//! an explicit success/error outcome instead of being probed field by
//! field.

use crate::bssid::Bssid;
use crate::config::WigleConfig;
use crate::geo::BoundingBox;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// One network row from a search response. All fields optional.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkResult {
    #[serde(default, rename = "netid")]
    pub net_id: Option<String>,
    #[serde(default)]
    pub trilat: Option<f64>,
    #[serde(default)]
    pub trilong: Option<f64>,
    #[serde(default, rename = "lastupdt")]
    pub last_update: Option<String>,
    #[serde(default)]
    pub road: Option<String>,
    #[serde(default)]
    pub channel: Option<i64>,
    #[serde(default, rename = "housenumber")]
    pub house_number: Option<String>,
}

/// Raw wire shape of a search response.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    results: Option<Vec<NetworkResult>>,
    #[serde(default, rename = "searchAfter")]
    search_after: Option<String>,
}

/// Decoded outcome of a 2xx search response.
#[derive(Debug)]
pub enum SearchOutcome {
    /// The API answered; `next_page` is absent on the last page
    Success {
        results: Vec<NetworkResult>,
        next_page: Option<String>,
    },
    /// The API reported an application-level error (quota, bad query, ...)
    ApplicationError { message: String },
}

impl SearchResponse {
    fn into_outcome(self) -> SearchOutcome {
        if self.success {
            SearchOutcome::Success {
                results: self.results.unwrap_or_default(),
                next_page: self.search_after,
            }
        } else {
            SearchOutcome::ApplicationError {
                message: self
                    .message
                    .unwrap_or_else(|| "unknown error".to_string()),
            }
        }
    }
}

/// WiGLE request failures below the application level.
#[derive(Debug)]
pub enum WigleError {
    /// Non-2xx HTTP status
    Http { status: u16, body: String },
    /// Network-level failure (timeout, connection refused, DNS)
    Transport(String),
    /// 2xx response whose body did not decode as the expected JSON shape
    Decode(String),
}

impl fmt::Display for WigleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WigleError::Http { status, body } => write!(f, "WiGLE HTTP {}: {}", status, body),
            WigleError::Transport(msg) => write!(f, "WiGLE request failed: {}", msg),
            WigleError::Decode(msg) => write!(f, "WiGLE response malformed: {}", msg),
        }
    }
}

/// HTTP client for the WiGLE REST API.
///
/// Authenticates with HTTP Basic auth. Every request carries the timeout
/// from configuration, so a hung upstream cannot hang a scan.
pub struct WigleClient {
    http_client: Client,
    base_url: String,
    api_name: String,
    api_token: String,
}

impl WigleClient {
    pub fn new(config: &WigleConfig) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent("beaconmap/0.1")
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_name: config.api_name.clone(),
            api_token: config.api_token.clone(),
        })
    }

    /// Look up a single BSSID.
    pub async fn search_network(&self, bssid: &Bssid) -> Result<SearchOutcome, WigleError> {
        let url = format!("{}/api/v2/network/search", self.base_url);
        tracing::info!(bssid = %bssid, "WiGLE network lookup");

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.api_name, Some(&self.api_token))
            .header("Accept", "application/json")
            .query(&[
                ("netid", bssid.as_str()),
                ("onlymine", "false"),
                ("freenet", "false"),
                ("paynet", "false"),
            ])
            .send()
            .await
            .map_err(|e| WigleError::Transport(e.to_string()))?;

        Self::decode(response).await
    }

    /// Fetch one page of an area search.
    ///
    /// The same bounding box is sent on every page; only `search_after`
    /// changes. `variance` is passed through opaquely; its effect on result
    /// completeness is undocumented upstream.
    pub async fn search_area(
        &self,
        bbox: &BoundingBox,
        page_size: u32,
        variance: f64,
        search_after: Option<&str>,
    ) -> Result<SearchOutcome, WigleError> {
        let url = format!("{}/api/v2/network/search", self.base_url);

        let mut query: Vec<(&str, String)> = vec![
            ("latrange1", bbox.lat_min.to_string()),
            ("latrange2", bbox.lat_max.to_string()),
            ("longrange1", bbox.lon_min.to_string()),
            ("longrange2", bbox.lon_max.to_string()),
            ("onlymine", "false".to_string()),
            ("freenet", "false".to_string()),
            ("paynet", "false".to_string()),
            ("resultsPerPage", page_size.to_string()),
            ("variance", variance.to_string()),
        ];
        if let Some(token) = search_after {
            query.push(("searchAfter", token.to_string()));
        }

        tracing::info!(
            lat_min = bbox.lat_min,
            lat_max = bbox.lat_max,
            continuing = search_after.is_some(),
            "WiGLE area search"
        );

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.api_name, Some(&self.api_token))
            .header("Accept", "application/json")
            .query(&query)
            .send()
            .await
            .map_err(|e| WigleError::Transport(e.to_string()))?;

        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<SearchOutcome, WigleError> {
        let status = response.status();
        tracing::info!(status = status.as_u16(), "WiGLE response");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(WigleError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| WigleError::Decode(e.to_string()))?;
        Ok(parsed.into_outcome())
    }
}
