//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the two operations the transcoder needs:
//! turning raw bytes into a bounded in-memory image, and encoding that image
//! once per quality attempt.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the pure-Rust
//! `image` crate.

use super::params::EncodeParams;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Decode raw bytes and shrink so neither edge exceeds `max_edge`.
    fn load(&self, raw: &[u8], max_edge: u32) -> Result<DynamicImage, BackendError>;

    /// Encode an image in memory.
    fn encode(&self, image: &DynamicImage, params: &EncodeParams)
    -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{OutputFormat, Quality};
    use std::sync::Mutex;

    /// Mock backend that records operations without doing pixel work.
    ///
    /// Encoded size is `quality × bytes_per_quality`, so tests can pin the
    /// exact point where the budget search stops.
    pub struct MockBackend {
        pub bytes_per_quality: usize,
        pub fail_load: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Load { raw_len: usize, max_edge: u32 },
        Encode { format: OutputFormat, quality: u8 },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::with_bytes_per_quality(10)
        }

        pub fn with_bytes_per_quality(bytes_per_quality: usize) -> Self {
            Self {
                bytes_per_quality,
                fail_load: false,
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                fail_load: true,
                ..Self::new()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn encoded_qualities(&self) -> Vec<u8> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Encode { quality, .. } => Some(quality),
                    _ => None,
                })
                .collect()
        }
    }

    impl ImageBackend for MockBackend {
        fn load(&self, raw: &[u8], max_edge: u32) -> Result<DynamicImage, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Load {
                raw_len: raw.len(),
                max_edge,
            });
            if self.fail_load {
                return Err(BackendError::ProcessingFailed(
                    "mock decode failure".to_string(),
                ));
            }
            Ok(DynamicImage::new_rgb8(4, 3))
        }

        fn encode(
            &self,
            _image: &DynamicImage,
            params: &EncodeParams,
        ) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                format: params.format,
                quality: params.quality.value(),
            });
            Ok(vec![0u8; params.quality.value() as usize * self.bytes_per_quality])
        }
    }

    #[test]
    fn mock_records_load_and_encode() {
        let backend = MockBackend::new();
        let img = backend.load(b"raw", 1200).unwrap();
        let out = backend
            .encode(
                &img,
                &EncodeParams {
                    format: OutputFormat::Jpeg,
                    quality: Quality::new(80),
                },
            )
            .unwrap();
        assert_eq!(out.len(), 800);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[0],
            RecordedOp::Load {
                raw_len: 3,
                max_edge: 1200
            }
        ));
        assert!(matches!(
            &ops[1],
            RecordedOp::Encode {
                format: OutputFormat::Jpeg,
                quality: 80
            }
        ));
    }

    #[test]
    fn failing_mock_errors_on_load() {
        let backend = MockBackend::failing();
        assert!(backend.load(b"raw", 1200).is_err());
    }
}
