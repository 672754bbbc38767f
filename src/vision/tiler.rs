//! Recursive tiled OCR
//!
//! Images over the OCR service's size budget are split in two, each half is
//! recognized on its own (recursing while it is still too large), and the two
//! responses are merged back into the parent's coordinate space. Leaves are
//! the only external calls; every internal node is a pure merge.
//!
//! Tile buffers are owned by the recursion node that created them and are
//! dropped as soon as their subtree returns, on success or failure. A leaf
//! keeps only its encoded bytes while its request is in flight. A failed
//! leaf fails the whole call; no partial document is ever returned.

use futures_util::future::{self, BoxFuture, FutureExt};
use tokio::sync::Semaphore;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use super::merge::merge;
use super::tiling::{split, validate_overlap, Axis, SplitResult, Tile, TileFormat};
use super::{OcrClient, OcrResponse};
use crate::config::TilerSettings;
use crate::error::TilerError;

/// Limits and encoding used while tiling
#[derive(Debug, Clone)]
pub struct TilingOptions {
    /// Encoded images at or above this size are split
    pub max_size_bytes: u64,
    /// Fraction of the split dimension shared by both tiles, in (0, 1)
    pub overlap: f64,
    /// Deepest allowed split before giving up
    pub max_depth: u32,
    /// A tile narrower than this along its split axis is not split again
    pub min_tile_dimension: u32,
    /// Encoding for split tiles
    pub tile_format: TileFormat,
    /// OCR sibling tiles concurrently
    pub concurrent_branches: bool,
    /// Most leaf requests in flight at once
    pub max_concurrent_requests: usize,
}

impl Default for TilingOptions {
    fn default() -> Self {
        Self::from(&TilerSettings::default())
    }
}

impl From<&TilerSettings> for TilingOptions {
    fn from(settings: &TilerSettings) -> Self {
        Self {
            max_size_bytes: settings.max_size_bytes(),
            overlap: settings.overlap,
            max_depth: settings.max_depth,
            min_tile_dimension: settings.min_tile_dimension,
            tile_format: settings.tile_format,
            concurrent_branches: settings.concurrent_branches,
            max_concurrent_requests: settings.max_concurrent_requests,
        }
    }
}

impl TilingOptions {
    fn validate(&self) -> Result<(), TilerError> {
        validate_overlap(self.overlap)?;
        if self.max_size_bytes == 0 {
            return Err(TilerError::InvalidInput(
                "size budget must be greater than zero".to_string(),
            ));
        }
        if self.min_tile_dimension < 2 {
            return Err(TilerError::InvalidInput(
                "minimum tile dimension must be at least 2 pixels".to_string(),
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(TilerError::InvalidInput(
                "at least one concurrent request is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// OCR driver that keeps every request under the service's size budget
pub struct TiledOcr<C> {
    client: C,
    options: TilingOptions,
    requests: Semaphore,
}

impl<C: OcrClient> TiledOcr<C> {
    /// Create a driver around an OCR client
    pub fn new(client: C, options: TilingOptions) -> Self {
        let requests = Semaphore::new(options.max_concurrent_requests.max(1));
        Self {
            client,
            options,
            requests,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn options(&self) -> &TilingOptions {
        &self.options
    }

    /// Recognize all text in an encoded image
    ///
    /// Bounding boxes in the result are in the coordinates of the full image.
    pub async fn ocr(&self, encoded: Vec<u8>) -> Result<OcrResponse, TilerError> {
        self.options.validate()?;
        let tile = Tile::from_encoded(encoded)?;

        let span = info_span!("ocr", request_id = %Uuid::new_v4());
        async move {
            let (width, height) = tile.dimensions();
            info!(
                "Tiled OCR of {}x{} image ({} bytes, budget {} bytes)",
                width,
                height,
                tile.encoded_len(),
                self.options.max_size_bytes
            );

            let response = self.ocr_tile(tile, 0).await?;

            info!(
                "Tiled OCR complete: {} pages, {} characters",
                response.pages.len(),
                response.full_text.chars().count()
            );
            Ok(response)
        }
        .instrument(span)
        .await
    }

    fn ocr_tile(&self, tile: Tile, depth: u32) -> BoxFuture<'_, Result<OcrResponse, TilerError>> {
        async move {
            let (width, height) = tile.dimensions();

            if tile.encoded_len() < self.options.max_size_bytes {
                debug!(
                    "Leaf tile {}x{} ({} bytes) at depth {}",
                    width,
                    height,
                    tile.encoded_len(),
                    depth
                );
                let encoded = tile.into_encoded();
                let _permit = self
                    .requests
                    .acquire()
                    .await
                    .map_err(|_| TilerError::InvalidInput("request limiter closed".to_string()))?;
                return Ok(self.client.annotate(&encoded).await?);
            }

            let axis = Axis::for_dimensions(width, height);
            if depth >= self.options.max_depth
                || axis.extent(width, height) < self.options.min_tile_dimension
            {
                return Err(TilerError::TooLarge {
                    width,
                    height,
                    depth,
                });
            }

            let SplitResult {
                first,
                second,
                axis,
                offset,
            } = {
                let image = tile.into_image()?;
                split(&image, self.options.overlap)?
            };

            let first = Tile::from_image(first, self.options.tile_format)?;
            let second = Tile::from_image(second, self.options.tile_format)?;
            debug!(
                "Split {}x{} {:?} at offset {} (depth {}): {} + {} bytes",
                width,
                height,
                axis,
                offset,
                depth,
                first.encoded_len(),
                second.encoded_len()
            );

            let (first, second) = if self.options.concurrent_branches {
                future::try_join(
                    self.ocr_tile(first, depth + 1),
                    self.ocr_tile(second, depth + 1),
                )
                .await?
            } else {
                let first = self.ocr_tile(first, depth + 1).await?;
                let second = self.ocr_tile(second, depth + 1).await?;
                (first, second)
            };

            Ok(merge(offset, first, second, axis))
        }
        .boxed()
    }
}
