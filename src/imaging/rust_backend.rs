//! Pure Rust image backend built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::load_from_memory` |
//! | Identify | `ImageReader::with_guessed_format` + `into_dimensions` |
//! | Downsample | `DynamicImage::resize_exact` with `Triangle` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Placeholders are only a handful of pixels wide and get blurred by the
//! browser anyway, so the cheap `Triangle` filter is used instead of the
//! `Lanczos3` a full-size resize would want.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::fit_to_width;
use super::params::PlaceholderParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
    // JPEG has no alpha channel; flatten everything to RGB8 first.
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| BackendError::Encode(e.to_string()))?;
    Ok(out)
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Dimensions { width, height })
    }

    fn downsample(
        &self,
        bytes: &[u8],
        params: &PlaceholderParams,
    ) -> Result<Vec<u8>, BackendError> {
        let img = decode(bytes)?;
        let (w, h) = fit_to_width((img.width(), img.height()), params.width);
        let small = if (w, h) == (img.width(), img.height()) {
            img
        } else {
            img.resize_exact(w, h, FilterType::Triangle)
        };
        encode_jpeg(&small, params.quality.value() as u8)
    }
}
