//! Image transcoding in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Shrink** | Lanczos3 to fit the max dimension, never upscaling |
//! | **Encode** | JPEG with adaptive quality, lossless WebP |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math and the quality schedule
//! - **Parameters**: Data structures describing encode attempts
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`transcode`], the budget search over a backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use operations::{EncodedVariant, FormatPlan, TranscodeConfig, transcode};
pub use params::{EncodeParams, OutputFormat, Quality};
pub use rust_backend::RustBackend;
