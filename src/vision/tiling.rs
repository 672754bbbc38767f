//! Tile splitting
//!
//! Oversized images are cut in two along their longer dimension. The halves
//! overlap so that a word sitting on the cut line appears whole in at least
//! one of them.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};

use crate::error::TilerError;

/// Dimension along which a split happens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Cut along x: left and right tiles
    Horizontal,
    /// Cut along y: top and bottom tiles
    Vertical,
}

impl Axis {
    /// Split axis for an image: the longer dimension, width on ties
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        if width >= height {
            Axis::Horizontal
        } else {
            Axis::Vertical
        }
    }

    /// Size of an image along this axis
    pub fn extent(self, width: u32, height: u32) -> u32 {
        match self {
            Axis::Horizontal => width,
            Axis::Vertical => height,
        }
    }
}

/// Encoding used for split tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileFormat {
    #[default]
    Jpeg,
    Png,
    Bmp,
}

impl TileFormat {
    fn image_format(self) -> ImageFormat {
        match self {
            TileFormat::Jpeg => ImageFormat::Jpeg,
            TileFormat::Png => ImageFormat::Png,
            TileFormat::Bmp => ImageFormat::Bmp,
        }
    }

    /// Encode an image in this format
    pub fn encode(self, image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        match self {
            // JPEG has no alpha channel
            TileFormat::Jpeg => {
                DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut cursor, ImageFormat::Jpeg)?
            }
            other => image.write_to(&mut cursor, other.image_format())?,
        }
        Ok(buffer)
    }
}

/// Bytes that would be sent for OCR, with the decoded pixels when known
///
/// A source image is only decoded once it has to be split; a tile cut from a
/// parent keeps the pixels it was encoded from.
#[derive(Debug)]
pub struct Tile {
    encoded: Vec<u8>,
    width: u32,
    height: u32,
    image: Option<DynamicImage>,
}

impl Tile {
    /// Wrap a source image, reading only its header
    pub fn from_encoded(encoded: Vec<u8>) -> Result<Self, TilerError> {
        if encoded.is_empty() {
            return Err(TilerError::InvalidInput("empty source image".to_string()));
        }
        let (width, height) = reader(&encoded)?.into_dimensions()?;
        check_area(width, height)?;
        Ok(Self {
            encoded,
            width,
            height,
            image: None,
        })
    }

    /// Encode a freshly cropped tile
    pub fn from_image(image: DynamicImage, format: TileFormat) -> Result<Self, TilerError> {
        let (width, height) = image.dimensions();
        check_area(width, height)?;
        let encoded = format.encode(&image)?;
        Ok(Self {
            encoded,
            width,
            height,
            image: Some(image),
        })
    }

    /// Encoded bytes as sent to the OCR service
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// Encoded size in bytes
    pub fn encoded_len(&self) -> u64 {
        self.encoded.len() as u64
    }

    /// Get tile dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Keep the encoded bytes, releasing any decoded pixels
    pub fn into_encoded(self) -> Vec<u8> {
        self.encoded
    }

    /// Keep the pixels, decoding the source if needed and releasing the bytes
    ///
    /// Map scans routinely decode to more than the `image` crate's default
    /// allocation limit, so sources are decoded without one.
    pub fn into_image(self) -> Result<DynamicImage, TilerError> {
        match self.image {
            Some(image) => Ok(image),
            None => Ok(reader(&self.encoded)?.decode()?),
        }
    }
}

fn reader(encoded: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, TilerError> {
    let mut reader = ImageReader::new(Cursor::new(encoded))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?;
    reader.no_limits();
    Ok(reader)
}

fn check_area(width: u32, height: u32) -> Result<(), TilerError> {
    if width == 0 || height == 0 {
        return Err(TilerError::InvalidInput(format!(
            "image has zero area ({}x{})",
            width, height
        )));
    }
    Ok(())
}

/// Where a split cuts, in the parent's coordinates along `axis`
///
/// The first tile spans `[0, first_end)`, the second `[second_start, extent)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPlan {
    pub axis: Axis,
    pub first_end: u32,
    pub second_start: u32,
}

impl SplitPlan {
    /// Compute the cut for an image of the given size
    pub fn new(width: u32, height: u32, overlap: f64) -> Result<Self, TilerError> {
        validate_overlap(overlap)?;
        if width == 0 || height == 0 {
            return Err(TilerError::InvalidInput(format!(
                "cannot split a zero-area image ({}x{})",
                width, height
            )));
        }

        let axis = Axis::for_dimensions(width, height);
        let extent = f64::from(axis.extent(width, height));
        let overlap_pixels = extent * overlap;

        Ok(Self {
            axis,
            first_end: ((extent + overlap_pixels) / 2.0).floor() as u32,
            second_start: ((extent - overlap_pixels) / 2.0).floor() as u32,
        })
    }

    /// Pixels shared by both tiles
    pub fn overlap_pixels(&self) -> u32 {
        self.first_end.saturating_sub(self.second_start)
    }
}

/// Two overlapping tiles cut from a parent image
#[derive(Debug)]
pub struct SplitResult {
    pub first: DynamicImage,
    pub second: DynamicImage,
    pub axis: Axis,
    /// Start of `second` along `axis`, in the parent's coordinates
    pub offset: u32,
}

/// Reject overlap fractions outside the open interval (0, 1)
pub fn validate_overlap(overlap: f64) -> Result<(), TilerError> {
    if overlap > 0.0 && overlap < 1.0 {
        Ok(())
    } else {
        Err(TilerError::InvalidInput(format!(
            "overlap fraction must be in (0, 1), got {}",
            overlap
        )))
    }
}

/// Split an image into two overlapping tiles along its longer dimension
pub fn split(image: &DynamicImage, overlap: f64) -> Result<SplitResult, TilerError> {
    let (width, height) = image.dimensions();
    let plan = SplitPlan::new(width, height, overlap)?;

    let (first, second) = match plan.axis {
        Axis::Horizontal => (
            image.crop_imm(0, 0, plan.first_end, height),
            image.crop_imm(plan.second_start, 0, width - plan.second_start, height),
        ),
        Axis::Vertical => (
            image.crop_imm(0, 0, width, plan.first_end),
            image.crop_imm(0, plan.second_start, width, height - plan.second_start),
        ),
    };

    Ok(SplitResult {
        first,
        second,
        axis: plan.axis,
        offset: plan.second_start,
    })
}
