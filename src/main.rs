//! Map Geolocalizer - command line entry point
//!
//! Reads a raster map from a path, URL or storage URI, runs tiled OCR over it
//! and optionally resolves the addresses found on it to coordinates.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use map_geolocalizer::config::{self, AppConfig};
use map_geolocalizer::geolocate::{CloudLanguageClient, GeocodingClient, Geolocalizer};
use map_geolocalizer::vision::{CloudVisionClient, TiledOcr, TilingOptions};
use map_geolocalizer::{service, storage, ServiceError};

/// Map Geolocalizer - find where a raster map is from
#[derive(Parser, Debug)]
#[command(name = "map-geolocalizer")]
#[command(about = "Reads the text printed on a raster map and geocodes the addresses it finds")]
struct Args {
    /// Configuration file (defaults to config.toml in the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API key for the OCR, language and geocoding services
    #[arg(long, global = true, env = "GEOLOCALIZATION_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run tiled OCR and print the merged annotation as JSON
    Ocr {
        /// Image path, http(s) URL or gs://bucket/object URI
        uri: String,

        /// Size budget per OCR request in megabytes
        #[arg(long)]
        max_size_mb: Option<u64>,

        /// Fraction of each split dimension shared by sibling tiles
        #[arg(long)]
        overlap: Option<f64>,

        /// Write the JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Geolocalize a map and print the address text with candidate coordinates
    Geolocate {
        /// Image path, http(s) URL or gs://bucket/object URI
        uri: String,
    },
    /// Print the effective configuration
    Config {
        /// Save the effective configuration to the config path (API keys are not written)
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => storage::default_config_path()?,
    };
    let mut config = load_or_default_config(&config_path, args.config.is_some())?;
    if let Some(key) = args.api_key {
        config.service.api_key = Some(key);
    }

    match args.command {
        Command::Ocr {
            uri,
            max_size_mb,
            overlap,
            output,
        } => {
            if let Some(max_size_mb) = max_size_mb {
                config.tiler.max_size_mb = max_size_mb;
            }
            if let Some(overlap) = overlap {
                config.tiler.overlap = overlap;
            }
            run_ocr(&config, &uri, output.as_deref()).await
        }
        Command::Geolocate { uri } => run_geolocate(&config, &uri).await,
        Command::Config { write } => show_config(&config, &config_path, write),
    }
}

/// Load configuration from file or fall back to defaults
///
/// An explicitly requested file must exist and parse.
fn load_or_default_config(path: &Path, explicit: bool) -> Result<AppConfig> {
    if explicit || path.exists() {
        match config::load_config(path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                return Ok(config);
            }
            Err(e) if !explicit => warn!("Ignoring unreadable configuration: {:#}", e),
            Err(e) => return Err(e),
        }
    }
    info!("Using default configuration");
    Ok(AppConfig::default())
}

fn api_key(config: &AppConfig) -> Result<String, ServiceError> {
    config
        .service
        .api_key
        .clone()
        .filter(|key| !key.is_empty())
        .ok_or(ServiceError::MissingApiKey)
}

/// Run tiled OCR and emit the merged response
async fn run_ocr(config: &AppConfig, uri: &str, output: Option<&Path>) -> Result<()> {
    let api_key = api_key(config)?;
    let http = service::http_client(&config.service)?;
    let image = storage::load_source(uri, &http).await?;

    let client = CloudVisionClient::new(&config.service, api_key)?;
    let tiler = TiledOcr::new(client, TilingOptions::from(&config.tiler));
    let response = tiler.ocr(image).await?;

    let json = serde_json::to_string_pretty(&response)?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
            info!("Wrote OCR response to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Run the full geolocalization pipeline
async fn run_geolocate(config: &AppConfig, uri: &str) -> Result<()> {
    let api_key = api_key(config)?;
    let http = service::http_client(&config.service)?;
    let image = storage::load_source(uri, &http).await?;

    let geolocalizer = Geolocalizer::new(
        TiledOcr::new(
            CloudVisionClient::new(&config.service, api_key.clone())?,
            TilingOptions::from(&config.tiler),
        ),
        CloudLanguageClient::new(
            &config.service,
            api_key.clone(),
            config.geolocate.entity_types.clone(),
        )?,
        GeocodingClient::new(&config.service, api_key)?,
        config.geolocate.confidence_threshold,
    );

    let geolocation = geolocalizer.geolocalize(image).await?;
    println!("{}", serde_json::to_string_pretty(&geolocation)?);
    Ok(())
}

/// Print (and optionally save) the effective configuration
fn show_config(config: &AppConfig, path: &Path, write: bool) -> Result<()> {
    let mut shown = config.clone();
    if shown.service.api_key.is_some() {
        shown.service.api_key = Some("<redacted>".to_string());
    }

    println!("# {}", path.display());
    println!("{}", toml::to_string_pretty(&shown)?);

    if write {
        let mut saved = config.clone();
        saved.service.api_key = None;
        config::save_config(&saved, path)?;
        info!("Saved configuration to {:?}", path);
    }
    Ok(())
}
