//! Geolocalization pipeline
//!
//! Tiled OCR of a map image, address entity extraction from the recognized
//! text, then geocoding of the addresses into candidate coordinates.

pub mod geocoding;
pub mod language;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::extract_corpus;
use crate::error::{GeolocateError, ServiceError};
use crate::vision::{OcrClient, TiledOcr};

pub use geocoding::GeocodingClient;
pub use language::CloudLanguageClient;

/// Geographic coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Finds address-like entities in free text
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Matching entity names, each followed by a space; empty if none
    async fn addresses(&self, text: &str) -> Result<String, ServiceError>;
}

/// Resolves a textual query to candidate coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Vec<LatLng>, ServiceError>;
}

/// Outcome of geolocalizing a map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    /// Address text sent to the geocoder
    pub text: Option<String>,
    /// Candidate locations, best first
    pub candidates: Vec<LatLng>,
}

/// Runs the whole map → coordinates pipeline
pub struct Geolocalizer<O, E, G> {
    ocr: TiledOcr<O>,
    extractor: E,
    geocoder: G,
    confidence_threshold: f32,
}

impl<O, E, G> Geolocalizer<O, E, G>
where
    O: OcrClient,
    E: EntityExtractor,
    G: Geocoder,
{
    pub fn new(ocr: TiledOcr<O>, extractor: E, geocoder: G, confidence_threshold: f32) -> Self {
        Self {
            ocr,
            extractor,
            geocoder,
            confidence_threshold,
        }
    }

    /// Geolocalize an encoded map image
    pub async fn geolocalize(&self, image: Vec<u8>) -> Result<Geolocation, GeolocateError> {
        let response = self.ocr.ocr(image).await?;

        let Some(corpus) = extract_corpus(&response, self.confidence_threshold) else {
            info!("No confident text found on map");
            return Ok(Geolocation::default());
        };

        let addresses = self.extractor.addresses(&corpus).await?;
        if addresses.trim().is_empty() {
            info!("No address entities in {} characters of text", corpus.len());
            return Ok(Geolocation::default());
        }

        let candidates = self.geocoder.geocode(&addresses).await?;
        info!(
            "Geocoded \"{}\" to {} candidates",
            addresses.trim(),
            candidates.len()
        );

        Ok(Geolocation {
            text: Some(addresses),
            candidates,
        })
    }
}
