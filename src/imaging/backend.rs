//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the seam between placeholder generation and
//! pixel work. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend); tests use the
//! recording [`tests::MockBackend`].

use super::params::PlaceholderParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Works on in-memory bytes: renditions come from the network and the
/// result is embedded inline, so nothing touches the filesystem.
pub trait ImageBackend: Send + Sync {
    /// Decode just enough of `bytes` to report its dimensions.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode `bytes`, shrink to `params.width` and re-encode as JPEG.
    fn downsample(&self, bytes: &[u8], params: &PlaceholderParams)
    -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::sync::Mutex;

    /// Mock backend that records operations and returns canned output.
    ///
    /// `downsample` returns the input bytes unchanged, which lets tests check
    /// that each placeholder came from the right source bytes. Inputs equal to
    /// [`MockBackend::CORRUPT`] fail to decode.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify { len: usize },
        Downsample { len: usize, width: u32, quality: u32 },
    }

    impl MockBackend {
        pub const CORRUPT: &'static [u8] = b"not an image";

        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify { len: bytes.len() });
            if bytes == Self::CORRUPT {
                return Err(BackendError::Decode("mock corrupt input".into()));
            }
            Ok(Dimensions {
                width: 8,
                height: 6,
            })
        }

        fn downsample(
            &self,
            bytes: &[u8],
            params: &PlaceholderParams,
        ) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Downsample {
                len: bytes.len(),
                width: params.width,
                quality: params.quality.value(),
            });
            if bytes == Self::CORRUPT {
                return Err(BackendError::Decode("mock corrupt input".into()));
            }
            Ok(bytes.to_vec())
        }
    }

    #[test]
    fn mock_records_downsample() {
        let backend = MockBackend::new();
        let out = backend
            .downsample(
                b"abc",
                &PlaceholderParams {
                    width: 8,
                    quality: Quality::new(70),
                },
            )
            .unwrap();
        assert_eq!(out, b"abc");

        let ops = backend.get_operations();
        assert_eq!(
            ops,
            vec![RecordedOp::Downsample {
                len: 3,
                width: 8,
                quality: 70
            }]
        );
    }

    #[test]
    fn mock_rejects_corrupt_input() {
        let backend = MockBackend::new();
        let result = backend.downsample(MockBackend::CORRUPT, &PlaceholderParams::default());
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }
}
