use crate::geo::Coordinate;
use serde::Deserialize;

/// Complete beaconmap configuration.
///
/// Loaded once at startup and passed by value into the components that need
/// it; nothing reads configuration from ambient state after construction.
#[derive(Debug, Clone, Deserialize)]
pub struct BeaconmapConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub wigle: WigleConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:5000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    "beaconmap.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// WiGLE API configuration. Credentials have no default, so the section is
/// required.
#[derive(Debug, Clone, Deserialize)]
pub struct WigleConfig {
    pub api_name: String,
    pub api_token: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request deadline in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://api.wigle.net".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Bulk download configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    /// Center points as [lat, lon] pairs
    #[serde(default)]
    pub center_points: Vec<[f64; 2]>,
    /// Search radius around each center (bounding box and inclusion filter)
    #[serde(default = "default_radius_meters")]
    pub radius_meters: f64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Opaque WiGLE search parameter, passed through unchanged
    #[serde(default = "default_variance")]
    pub variance: f64,
}

fn default_radius_meters() -> f64 {
    1000.0
}

fn default_page_size() -> u32 {
    100
}

fn default_variance() -> f64 {
    0.003
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            center_points: Vec::new(),
            radius_meters: default_radius_meters(),
            page_size: default_page_size(),
            variance: default_variance(),
        }
    }
}

impl DownloadConfig {
    pub fn centers(&self) -> Vec<Coordinate> {
        self.center_points
            .iter()
            .map(|&[lat, lon]| Coordinate::new(lat, lon))
            .collect()
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<BeaconmapConfig, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: BeaconmapConfig = toml::from_str(&contents)?;
    Ok(config)
}
