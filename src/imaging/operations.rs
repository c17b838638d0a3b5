//! High-level image operations.
//!
//! These functions combine the backend with the output representation the
//! rest of the crate wants.

use super::backend::{BackendError, ImageBackend};
use super::params::PlaceholderParams;
use crate::types::Placeholder;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Turn a fetched rendition into an inline blur placeholder.
///
/// The rendition is shrunk to `params.width` (the store normally already did
/// this), re-encoded as JPEG and wrapped as a base64 data URL.
pub fn encode_placeholder(
    backend: &impl ImageBackend,
    rendition: &[u8],
    params: &PlaceholderParams,
) -> Result<Placeholder> {
    let jpeg = backend.downsample(rendition, params)?;
    if jpeg.is_empty() {
        return Err(BackendError::Encode("encoder produced no data".into()));
    }
    Ok(Placeholder::from_jpeg(&jpeg))
}
