//! Shared types passed between the manifest builder, the placeholder
//! generator and the page renderer.
//!
//! [`AssetDescriptor`] is what ends up in the JSON manifest, so field names
//! here are part of the output format.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// MIME prefix of every placeholder data URL. Placeholders are always
/// re-encoded as JPEG regardless of the source format.
const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// One photo in the gallery.
///
/// `id` is the position in the manifest and doubles as the photo's URL id
/// (`/p/{id}`), so it must stay stable for a given set of store keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub id: u32,
    /// Asset key in the external store (Cloudinary `public_id`).
    pub public_id: String,
    /// Encoding of the stored original, e.g. `"jpg"`.
    pub format: String,
    pub width: u32,
    pub height: u32,
    /// Inline blur-up preview. `None` until placeholders have been generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur_data_url: Option<Placeholder>,
}

impl AssetDescriptor {
    /// File name the store delivers this asset under: `{public_id}.{format}`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.public_id, self.format)
    }
}

/// An inline `data:image/jpeg;base64,...` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Placeholder(String);

impl Placeholder {
    /// Wrap already-encoded JPEG bytes as a data URL.
    pub fn from_jpeg(bytes: &[u8]) -> Self {
        Self(format!("{JPEG_DATA_URL_PREFIX}{}", STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the base64 payload, excluding the `data:` prefix.
    pub fn payload_len(&self) -> usize {
        self.0.len().saturating_sub(JPEG_DATA_URL_PREFIX.len())
    }

    pub fn is_empty(&self) -> bool {
        self.payload_len() == 0
    }
}
