//! Vision/OCR Layer
//!
//! Extracts text from raster map images through an external OCR service.
//! Maps are frequently larger than the service accepts, so requests go
//! through [`TiledOcr`], which splits oversized images into overlapping tiles
//! and stitches the per-tile annotations back together.

pub mod annotation;
pub mod cloud_vision;
pub mod merge;
pub mod tiler;
pub mod tiling;

use async_trait::async_trait;

use crate::error::ServiceError;

pub use annotation::{
    Block, BoundingBox, BreakType, DetectedBreak, OcrResponse, Page, Paragraph, Symbol,
    TextProperty, Vertex, Word,
};
pub use cloud_vision::CloudVisionClient;
pub use merge::{merge, Translate};
pub use tiler::{TiledOcr, TilingOptions};
pub use tiling::{split, Axis, SplitPlan, SplitResult, Tile, TileFormat};

/// Document text detection backend
///
/// Takes encoded image bytes (already within the service's size limit) and
/// returns the full annotation, or an empty response when no text is found.
#[async_trait]
pub trait OcrClient: Send + Sync {
    async fn annotate(&self, image: &[u8]) -> Result<OcrResponse, ServiceError>;
}

