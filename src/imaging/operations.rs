//! High-level image operations.
//!
//! [`transcode`] combines the pure calculations with backend execution: it
//! decodes once, then runs the budget search for every requested format and
//! writes the accepted encoding to `{stem}.{ext}`.

use super::backend::{BackendError, ImageBackend};
use super::calculations::quality_schedule;
use super::params::{EncodeParams, OutputFormat, Quality};
use std::collections::BTreeMap;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Starting point of the quality search for one format.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatPlan {
    pub format: OutputFormat,
    pub start_quality: Quality,
}

/// Settings for [`transcode`].
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeConfig {
    /// Longest allowed edge after resizing.
    pub max_dimension: u32,
    /// Byte budget per encoded file.
    pub max_bytes: u64,
    /// One entry per format to emit.
    pub plans: Vec<FormatPlan>,
    /// Quality decrement between attempts.
    pub step: u32,
    /// Lowest quality tried; its result is kept even when over budget.
    pub floor: Quality,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1200,
            max_bytes: 1024 * 1024,
            plans: vec![FormatPlan {
                format: OutputFormat::Jpeg,
                start_quality: Quality::new(85),
            }],
            step: 5,
            floor: Quality::new(30),
        }
    }
}

/// A web variant written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedVariant {
    /// File name inside the output directory.
    pub file: String,
    pub bytes: u64,
    /// Quality the search settled on.
    pub quality: Quality,
    /// False when even the floor quality overshot the budget.
    pub within_budget: bool,
}

/// Run the budget search for one format.
///
/// Returns the first encoding that fits, or the last one tried. Formats
/// whose output ignores quality get a single attempt.
pub fn encode_within_budget(
    backend: &impl ImageBackend,
    image: &image::DynamicImage,
    plan: &FormatPlan,
    config: &TranscodeConfig,
) -> Result<(Vec<u8>, Quality)> {
    let mut last = None;
    for quality in quality_schedule(plan.start_quality, config.step, config.floor) {
        let encoded = backend.encode(
            image,
            &EncodeParams {
                format: plan.format,
                quality,
            },
        )?;
        if encoded.len() as u64 <= config.max_bytes {
            return Ok((encoded, quality));
        }
        last = Some((encoded, quality));
        if !plan.format.honours_quality() {
            break;
        }
    }
    last.ok_or_else(|| BackendError::ProcessingFailed("empty quality schedule".to_string()))
}

/// Produce web variants of `raw` in `output_dir` as `{stem}.{ext}`.
///
/// Decode failures are returned as errors. Budget overshoot is not: the
/// floor-quality result is written and flagged via `within_budget`.
pub fn transcode(
    backend: &impl ImageBackend,
    raw: &[u8],
    output_dir: &Path,
    stem: &str,
    config: &TranscodeConfig,
) -> Result<BTreeMap<OutputFormat, EncodedVariant>> {
    let image = backend.load(raw, config.max_dimension)?;
    std::fs::create_dir_all(output_dir)?;

    let mut variants = BTreeMap::new();
    for plan in &config.plans {
        let (encoded, quality) = encode_within_budget(backend, &image, plan, config)?;
        let file = format!("{}.{}", stem, plan.format.extension());
        std::fs::write(output_dir.join(&file), &encoded)?;
        let bytes = encoded.len() as u64;
        variants.insert(
            plan.format,
            EncodedVariant {
                file,
                bytes,
                quality,
                within_budget: bytes <= config.max_bytes,
            },
        );
    }
    Ok(variants)
}
