//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::load_from_memory` |
//! | Resize | `DynamicImage::resize` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (RGB8 only) |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//!
//! HEIC photos pass catalog validation but have no pure-Rust decoder; they
//! fail here and the sync run records the item as failed.

use super::backend::{BackendError, ImageBackend};
use super::calculations::fit_within;
use super::params::{EncodeParams, OutputFormat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

/// Pure Rust backend using the `image` crate.
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

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
    // JPEG has no alpha channel and no 16-bit mode.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}

fn encode_webp(img: &DynamicImage) -> Result<Vec<u8>, BackendError> {
    let normalized = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };
    let mut buf = Vec::new();
    let encoder = WebPEncoder::new_lossless(&mut buf);
    normalized
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {}", e)))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn load(&self, raw: &[u8], max_edge: u32) -> Result<DynamicImage, BackendError> {
        let img = image::load_from_memory(raw)
            .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode image: {}", e)))?;
        let (w, h) = img.dimensions();
        let (tw, th) = fit_within((w, h), max_edge);
        if (tw, th) == (w, h) {
            return Ok(img);
        }
        Ok(img.resize(tw, th, FilterType::Lanczos3))
    }

    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        match params.format {
            OutputFormat::Jpeg => encode_jpeg(image, params.quality.value()),
            OutputFormat::WebP => encode_webp(image),
        }
    }
}
