//! External asset store: the read-only service that holds the photos.
//!
//! [`AssetStore`] is the seam the manifest builder and placeholder generator
//! talk to. [`CloudinaryStore`] is the production implementation; tests use
//! an in-memory store from `test_helpers`.

pub mod cloudinary;

pub use cloudinary::CloudinaryStore;

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Store rejected credentials: {0}")]
    Auth(String),
    #[error("Asset not found: {0}")]
    NotFound(String),
    #[error("Store rejected query: {0}")]
    BadQuery(String),
    #[error("Store returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Malformed store response: {0}")]
    Decode(String),
}

/// Sort direction for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// A listing request against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Store search expression, e.g. `folder:gallery/*`.
    pub expression: String,
    pub sort_by: String,
    pub direction: SortDirection,
    pub max_results: u32,
}

impl SearchQuery {
    /// Everything under `namespace`, greatest key first, capped at `cap`.
    pub fn folder(namespace: &str, cap: u32) -> Self {
        Self {
            expression: format!("folder:{namespace}/*"),
            sort_by: "public_id".to_string(),
            direction: SortDirection::Desc,
            max_results: cap,
        }
    }
}

/// One asset as listed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub key: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
}

/// A derived rendition, expressed as a Cloudinary transformation segment.
///
/// Renders in a fixed order (`c`, `f`, `w`, `q`) so the same rendition
/// always maps to the same URL and hits the same CDN cache entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transformation {
    pub crop: Option<&'static str>,
    pub format: Option<&'static str>,
    pub width: Option<u32>,
    pub quality: Option<u32>,
}

impl Transformation {
    /// Tiny JPEG rendition used as a placeholder source.
    pub fn placeholder(width: u32, quality: u32) -> Self {
        Self {
            format: Some("jpg"),
            width: Some(width),
            quality: Some(quality),
            ..Self::default()
        }
    }

    /// Aspect-preserving scale to `width`, as used for grid and modal images.
    pub fn scale(width: u32) -> Self {
        Self {
            crop: Some("scale"),
            width: Some(width),
            ..Self::default()
        }
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(c) = self.crop {
            parts.push(format!("c_{c}"));
        }
        if let Some(fmt) = self.format {
            parts.push(format!("f_{fmt}"));
        }
        if let Some(w) = self.width {
            parts.push(format!("w_{w}"));
        }
        if let Some(q) = self.quality {
            parts.push(format!("q_{q}"));
        }
        f.write_str(&parts.join(","))
    }
}

/// Trait for external asset stores.
///
/// Both operations are read-only.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// List assets matching `query`, in the store's order.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<AssetRecord>, StoreError>;

    /// Fetch the raw bytes of `{key}.{format}` under `transformation`.
    async fn fetch(
        &self,
        key: &str,
        format: &str,
        transformation: &Transformation,
    ) -> Result<Bytes, StoreError>;
}
