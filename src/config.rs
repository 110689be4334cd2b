//! Project configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The user file in the
//! project root is sparse: it is merged key-by-key over the stock defaults, so
//! it only needs the values that differ.
//!
//! ## Configuration Options
//!
//! ```toml
//! [source]
//! folder = ""               # Remote folder holding the catalog and photos (required for sync)
//! catalog = "menu.csv"      # Catalog file name inside the folder
//! web_folder = "web"        # Sub-folder holding published web images
//! publish = false           # Upload regenerated web images to web_folder
//!
//! [paths]
//! catalog = "data/menu.csv"
//! raw_images = "data/images_raw"
//! web_images = "data/images_web"
//! manifest = "data/images_manifest.json"
//! content = "content"
//! site = "public"
//!
//! [images]
//! max_dimension = 1200      # Longest edge of web images, in pixels
//! max_bytes = 1048576       # Byte budget per web image
//! raw_warn_bytes = 4194304  # Warn when an original photo is larger than this
//! jpeg = true
//! webp = false
//! jpeg_quality = 85         # Starting quality for the JPEG search
//! webp_quality = 80         # Starting quality for the WebP search
//! quality_step = 5
//! quality_floor = 30
//!
//! [catalog]
//! categories = ["Cakes", "Cupcakes", "Cookies", "Brownies", "Breads", "Pastries", "Desserts"]
//! default_unit = "kg"
//! currency_symbols = ["₹"]
//! ```
//!
//! Unknown keys are rejected to catch typos early. Relative paths resolve
//! against the project root given on the command line.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::imaging::{FormatPlan, OutputFormat, Quality, TranscodeConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Missing required setting `{0}`")]
    Missing(&'static str),
}

/// Project configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where the catalog and photos come from.
    pub source: SourceConfig,
    /// Local working layout.
    pub paths: PathsConfig,
    /// Web image generation.
    pub images: ImagesConfig,
    /// Catalog validation rules.
    pub catalog: CatalogConfig,
    /// Project root all relative paths hang off. Set by [`load_config`].
    #[serde(skip)]
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub folder: String,
    pub catalog: String,
    pub web_folder: String,
    pub publish: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            folder: String::new(),
            catalog: "menu.csv".to_string(),
            web_folder: "web".to_string(),
            publish: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub catalog: String,
    pub raw_images: String,
    pub web_images: String,
    pub manifest: String,
    pub content: String,
    pub site: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            catalog: "data/menu.csv".to_string(),
            raw_images: "data/images_raw".to_string(),
            web_images: "data/images_web".to_string(),
            manifest: "data/images_manifest.json".to_string(),
            content: "content".to_string(),
            site: "public".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    pub max_dimension: u32,
    pub max_bytes: u64,
    pub raw_warn_bytes: u64,
    pub jpeg: bool,
    pub webp: bool,
    pub jpeg_quality: u32,
    pub webp_quality: u32,
    pub quality_step: u32,
    pub quality_floor: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1200,
            max_bytes: 1024 * 1024,
            raw_warn_bytes: 4 * 1024 * 1024,
            jpeg: true,
            webp: false,
            jpeg_quality: 85,
            webp_quality: 80,
            quality_step: 5,
            quality_floor: 30,
        }
    }
}

impl ImagesConfig {
    /// Formats to emit, in output order.
    pub fn formats(&self) -> Vec<OutputFormat> {
        let mut formats = Vec::new();
        if self.jpeg {
            formats.push(OutputFormat::Jpeg);
        }
        if self.webp {
            formats.push(OutputFormat::WebP);
        }
        formats
    }

    /// Build the transcoder settings from these values.
    pub fn transcode_config(&self) -> TranscodeConfig {
        let plans = self
            .formats()
            .into_iter()
            .map(|format| FormatPlan {
                format,
                start_quality: Quality::new(match format {
                    OutputFormat::Jpeg => self.jpeg_quality,
                    OutputFormat::WebP => self.webp_quality,
                }),
            })
            .collect();
        TranscodeConfig {
            max_dimension: self.max_dimension,
            max_bytes: self.max_bytes,
            plans,
            step: self.quality_step,
            floor: Quality::new(self.quality_floor),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Allowed categories, in menu display order.
    pub categories: Vec<String>,
    /// Unit used when a row leaves `weight_unit` blank.
    pub default_unit: String,
    /// Symbols stripped from prices before parsing. The first one is used
    /// when rendering prices.
    pub currency_symbols: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            categories: [
                "Cakes", "Cupcakes", "Cookies", "Brownies", "Breads", "Pastries", "Desserts",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            default_unit: "kg".to_string(),
            currency_symbols: vec!["₹".to_string()],
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let images = &self.images;
        if images.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "images.max_dimension must be non-zero".into(),
            ));
        }
        if images.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "images.max_bytes must be non-zero".into(),
            ));
        }
        for (key, value) in [
            ("images.jpeg_quality", images.jpeg_quality),
            ("images.webp_quality", images.webp_quality),
            ("images.quality_floor", images.quality_floor),
        ] {
            if !(1..=100).contains(&value) {
                return Err(ConfigError::Validation(format!("{key} must be 1-100")));
            }
        }
        if !(1..=100).contains(&images.quality_step) {
            return Err(ConfigError::Validation(
                "images.quality_step must be 1-100".into(),
            ));
        }
        if !images.jpeg && !images.webp {
            return Err(ConfigError::Validation(
                "at least one of images.jpeg or images.webp must be enabled".into(),
            ));
        }
        if self.catalog.categories.is_empty() {
            return Err(ConfigError::Validation(
                "catalog.categories must not be empty".into(),
            ));
        }
        if self.catalog.default_unit.trim().is_empty() {
            return Err(ConfigError::Validation(
                "catalog.default_unit must not be blank".into(),
            ));
        }
        Ok(())
    }

    /// The remote folder to sync from. Fails when it was never configured.
    pub fn source_folder(&self) -> Result<PathBuf, ConfigError> {
        let folder = self.source.folder.trim();
        if folder.is_empty() {
            return Err(ConfigError::Missing("source.folder"));
        }
        Ok(self.resolve(folder))
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.resolve(&self.paths.catalog)
    }

    pub fn raw_images_dir(&self) -> PathBuf {
        self.resolve(&self.paths.raw_images)
    }

    pub fn web_images_dir(&self) -> PathBuf {
        self.resolve(&self.paths.web_images)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.resolve(&self.paths.manifest)
    }

    pub fn content_dir(&self) -> PathBuf {
        self.resolve(&self.paths.content)
    }

    pub fn site_dir(&self) -> PathBuf {
        self.resolve(&self.paths.site)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(Config::default())
        .map_err(|e| ConfigError::Validation(format!("default config does not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the project config rooted at `root`.
pub fn load_config(root: &Path) -> Result<Config, ConfigError> {
    let overlay = load_raw_config(root)?;
    let mut config = resolve_config(overlay)?;
    config.root = root.to_path_buf();
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# crumb configuration
# ===================
# All options are optional except source.folder, which `sync` needs.
# Relative paths resolve against the project root (--root).

[source]
# Folder holding the menu catalog and the product photos. Point it at a
# locally synced copy of the shared drive folder.
folder = ""
# Catalog file name inside the folder, exported from the menu spreadsheet.
catalog = "menu.csv"
# Sub-folder holding published web images. Files found there replace the
# local web images, so hand-tuned uploads win.
web_folder = "web"
# Upload regenerated web images to web_folder (created when missing).
publish = false

[paths]
catalog = "data/menu.csv"
raw_images = "data/images_raw"
web_images = "data/images_web"
manifest = "data/images_manifest.json"
content = "content"
site = "public"

[images]
# Longest edge of web images, in pixels. Smaller photos are never upscaled.
max_dimension = 1200
# Byte budget per web image. Quality drops in quality_step increments until
# the image fits or quality_floor is reached; the floor result is kept.
max_bytes = 1048576
# Warn when an original photo is larger than this.
raw_warn_bytes = 4194304
jpeg = true
webp = false
jpeg_quality = 85
webp_quality = 80
quality_step = 5
quality_floor = 30

[catalog]
# Allowed categories, in the order the menu page lists them.
categories = ["Cakes", "Cupcakes", "Cookies", "Brownies", "Breads", "Pastries", "Desserts"]
# Unit used when a row leaves weight_unit blank.
default_unit = "kg"
# Stripped from prices before parsing; the first is used when rendering.
currency_symbols = ["₹"]
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.images.max_dimension, 1200);
        assert_eq!(config.images.max_bytes, 1_048_576);
        assert_eq!(config.images.formats(), vec![OutputFormat::Jpeg]);
    }

    #[test]
    fn stock_toml_parses_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(Some(value)).unwrap();
        let defaults = Config::default();
        assert_eq!(config.images.jpeg_quality, defaults.images.jpeg_quality);
        assert_eq!(config.catalog.categories, defaults.catalog.categories);
        assert_eq!(config.paths.manifest, defaults.paths.manifest);
        assert_eq!(config.source.catalog, defaults.source.catalog);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let overlay: toml::Value = toml::from_str(
            r#"
            [images]
            webp = true
            "#,
        )
        .unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        assert!(config.images.webp);
        assert!(config.images.jpeg);
        assert_eq!(config.images.quality_floor, 30);
        assert_eq!(
            config.images.formats(),
            vec![OutputFormat::Jpeg, OutputFormat::WebP]
        );
    }

    #[test]
    fn unknown_keys_rejected() {
        let overlay: toml::Value = toml::from_str(
            r#"
            [images]
            max_bytez = 10
            "#,
        )
        .unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn no_formats_enabled_is_invalid() {
        let mut config = Config::default();
        config.images.jpeg = false;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn quality_out_of_range_is_invalid() {
        let mut config = Config::default();
        config.images.jpeg_quality = 120;
        assert!(config.validate().is_err());
    }

    #[test]
    fn quality_step_is_bounded() {
        let mut config = Config::default();
        config.images.quality_step = 0;
        assert!(config.validate().is_err());
        config.images.quality_step = u32::MAX;
        assert!(config.validate().is_err());
        config.images.quality_step = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_source_folder_is_reported() {
        let config = Config::default();
        assert!(matches!(
            config.source_folder(),
            Err(ConfigError::Missing("source.folder"))
        ));
    }

    #[test]
    fn relative_paths_resolve_against_root() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("config.toml"),
            "[source]\nfolder = \"drive\"\n[paths]\nsite = \"/srv/www\"\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.source_folder().unwrap(), tmp.path().join("drive"));
        assert_eq!(config.catalog_path(), tmp.path().join("data/menu.csv"));
        assert_eq!(config.site_dir(), PathBuf::from("/srv/www"));
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.root, tmp.path());
        assert_eq!(config.catalog.default_unit, "kg");
    }

    #[test]
    fn transcode_config_follows_images_section() {
        let mut images = ImagesConfig::default();
        images.webp = true;
        let tc = images.transcode_config();
        assert_eq!(tc.plans.len(), 2);
        assert_eq!(tc.plans[0].start_quality.value(), 85);
        assert_eq!(tc.plans[1].start_quality.value(), 80);
        assert_eq!(tc.floor.value(), 30);
        assert_eq!(tc.step, 5);
    }

    #[test]
    fn merge_toml_overlays_nested_tables() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }
}
