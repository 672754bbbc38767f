//! Map Geolocalizer - find where a raster map is from
//!
//! Recognizes the text on a scanned map through an external OCR service,
//! splitting images that exceed the service's size limit into overlapping
//! tiles and stitching the results back together, then extracts address
//! entities and geocodes them.

pub mod analysis;
pub mod config;
pub mod error;
pub mod geolocate;
pub mod service;
pub mod storage;
pub mod vision;

pub use config::AppConfig;
pub use error::{GeolocateError, ServiceError, TilerError};
pub use geolocate::{Geolocalizer, Geolocation, LatLng};
pub use vision::{OcrClient, OcrResponse, TiledOcr, TilingOptions};
