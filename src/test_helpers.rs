//! Shared test utilities for the crumb test suite.
//!
//! Provides synthetic image bytes, catalog builders, and a throwaway project
//! layout whose config points every path into a temp directory.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let project = TestProject::new();
//! let remote = MockRemote::new();
//! remote.put_file("menu.csv", &catalog_csv(&[
//!     catalog_line("Truffle Cake", "Cakes", "₹1,200", "truffle.jpg", "yes"),
//! ]));
//! remote.put_file("truffle.jpg", &synthetic_jpeg(64, 48));
//! ```

use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::Config;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageEncoder, RgbImage, RgbaImage};

// =========================================================================
// Synthetic images
// =========================================================================

/// Encode a smooth gradient as JPEG.
pub fn synthetic_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    encode_rgb_jpeg(&img)
}

/// Encode deterministic noise as JPEG. Noise compresses badly, so this is
/// the go-to input for byte-budget tests.
pub fn noisy_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x2545_f491;
    let img = RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xff) as u8
        };
        image::Rgb([next(), next(), next()])
    });
    encode_rgb_jpeg(&img)
}

/// Encode a half-transparent PNG.
pub fn synthetic_png_rgba(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| image::Rgba([200, 120, 40, (x % 256) as u8]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn encode_rgb_jpeg(img: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 95)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    buf
}

// =========================================================================
// Catalog builders
// =========================================================================

/// A catalog row with stock description, unit, and testimonials.
pub fn catalog_line(name: &str, category: &str, price: &str, image: &str, show: &str) -> Vec<String> {
    vec![
        name.to_string(),
        category.to_string(),
        "Baked fresh every morning.".to_string(),
        price.to_string(),
        String::new(),
        image.to_string(),
        "Delicious!|Ordered twice".to_string(),
        show.to_string(),
    ]
}

/// Serialize rows as catalog CSV with the standard header.
pub fn catalog_csv(rows: &[Vec<String>]) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(crate::catalog::REQUIRED_COLUMNS)
        .unwrap();
    for row in rows {
        writer.write_record(row).unwrap();
    }
    writer.into_inner().unwrap()
}

/// Write `menu.csv` into `dir` and return its path.
pub fn write_catalog(dir: &Path, rows: &[Vec<String>]) -> PathBuf {
    let path = dir.join("menu.csv");
    std::fs::write(&path, catalog_csv(rows)).unwrap();
    path
}

// =========================================================================
// Project layout
// =========================================================================

/// A temp project root with default config rooted inside it.
pub struct TestProject {
    pub tmp: TempDir,
    pub config: Config,
}

impl TestProject {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.root = tmp.path().to_path_buf();
        config.source.folder = "drive".to_string();
        Self { tmp, config }
    }

    /// Write the catalog where `generate`/`render` read it.
    pub fn write_local_catalog(&self, rows: &[Vec<String>]) -> PathBuf {
        let path = self.config.catalog_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, catalog_csv(rows)).unwrap();
        path
    }

    /// Put a web image where sync would have left it.
    pub fn write_web_image(&self, file: &str, bytes: &[u8]) {
        let dir = self.config.web_images_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file), bytes).unwrap();
    }
}
