//! Application Configuration
//!
//! Tiling, service and geolocation settings stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::vision::TileFormat;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Tiled OCR settings
    pub tiler: TilerSettings,
    /// External service settings
    pub service: ServiceSettings,
    /// Address extraction settings
    pub geolocate: GeolocateSettings,
}

/// Tiled OCR settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TilerSettings {
    /// Largest encoded image the OCR service accepts, in megabytes
    pub max_size_mb: u64,
    /// Fraction of the split dimension shared by sibling tiles
    pub overlap: f64,
    /// Deepest allowed split
    pub max_depth: u32,
    /// Smallest dimension, along the split axis, that may still be split
    pub min_tile_dimension: u32,
    /// Encoding for split tiles
    pub tile_format: TileFormat,
    /// OCR sibling tiles concurrently
    pub concurrent_branches: bool,
    /// Most leaf OCR requests in flight at once
    pub max_concurrent_requests: usize,
}

impl Default for TilerSettings {
    fn default() -> Self {
        Self {
            max_size_mb: 20,
            overlap: 0.25,
            max_depth: 16,
            min_tile_dimension: 32,
            tile_format: TileFormat::Jpeg,
            concurrent_branches: true,
            max_concurrent_requests: 4,
        }
    }
}

impl TilerSettings {
    /// Size budget in bytes
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }
}

/// External service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// API key, overridden by `--api-key` / `GEOLOCALIZATION_API_KEY`
    pub api_key: Option<String>,
    /// Document text detection endpoint
    pub vision_endpoint: String,
    /// Entity analysis endpoint
    pub language_endpoint: String,
    /// Geocoding endpoint
    pub geocode_endpoint: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for transient failures
    pub max_retries: u32,
    /// First retry delay in milliseconds
    pub retry_min_delay_ms: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            vision_endpoint: "https://vision.googleapis.com/v1/images:annotate".to_string(),
            language_endpoint: "https://language.googleapis.com/v1/documents:analyzeEntities"
                .to_string(),
            geocode_endpoint: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
            timeout_secs: 60,
            max_retries: 3,
            retry_min_delay_ms: 250,
        }
    }
}

/// Address extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocateSettings {
    /// Paragraphs below this confidence are ignored
    pub confidence_threshold: f32,
    /// Entity types kept as address candidates
    pub entity_types: Vec<String>,
}

impl Default for GeolocateSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.9,
            entity_types: vec!["ADDRESS".to_string(), "LOCATION".to_string()],
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    let config: AppConfig =
        toml::from_str(&content).with_context(|| format!("Invalid config {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
