//! Shared test utilities for the cloud-gal test suite.
//!
//! Provides an in-memory [`MockStore`], synthetic image encoders and small
//! builders for records and descriptors.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let store = MockStore::with_keys(&["gallery/c", "gallery/a", "gallery/b"]);
//! let descriptors = build_manifest(&store, &store_config(400)).await.unwrap();
//! assert_eq!(keys(&descriptors), vec!["gallery/c", "gallery/b", "gallery/a"]);
//! ```

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::config::StoreConfig;
use crate::store::{AssetRecord, AssetStore, SearchQuery, SortDirection, StoreError, Transformation};
use crate::types::AssetDescriptor;

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Encode a small gradient as JPEG.
pub fn synthetic_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Encode a small gradient as PNG.
pub fn synthetic_png(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut out = Cursor::new(Vec::new());
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out.into_inner()
}

// =========================================================================
// Builders
// =========================================================================

pub fn record(key: &str, width: u32, height: u32) -> AssetRecord {
    AssetRecord {
        key: key.to_string(),
        format: "jpg".to_string(),
        width,
        height,
    }
}

pub fn descriptor(id: u32, key: &str) -> AssetDescriptor {
    AssetDescriptor {
        id,
        public_id: key.to_string(),
        format: "jpg".to_string(),
        width: 4000,
        height: 3000,
        blur_data_url: None,
    }
}

pub fn store_config(cap: u32) -> StoreConfig {
    StoreConfig {
        namespace: "gallery".into(),
        account_id: "demo".into(),
        result_cap: cap,
        ..StoreConfig::default()
    }
}

/// All keys in manifest order.
pub fn keys(descriptors: &[AssetDescriptor]) -> Vec<&str> {
    descriptors.iter().map(|d| d.public_id.as_str()).collect()
}

/// All ids in manifest order.
pub fn ids(descriptors: &[AssetDescriptor]) -> Vec<u32> {
    descriptors.iter().map(|d| d.id).collect()
}

// =========================================================================
// MockStore
// =========================================================================

/// In-memory store that behaves like the search API: sorts, caps, and
/// serves per-key rendition bytes.
///
/// By default each key's rendition is its own name as bytes, which together
/// with [`MockBackend`](crate::imaging::backend::tests::MockBackend) makes the
/// resulting placeholder identify its source key.
#[derive(Default)]
pub struct MockStore {
    pub records: Vec<AssetRecord>,
    pub renditions: HashMap<String, Vec<u8>>,
    /// Keys whose fetch fails with `NotFound`.
    pub missing: HashSet<String>,
    /// Keys whose fetch sleeps before answering.
    pub delays: HashMap<String, Duration>,
    /// Reverse the capped result before returning it.
    pub scramble_order: bool,
    pub fail_search: bool,
    pub searches: Mutex<Vec<SearchQuery>>,
    pub fetches: Mutex<Vec<(String, String)>>,
}

impl MockStore {
    pub fn new(records: Vec<AssetRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn with_keys(keys: &[&str]) -> Self {
        Self::new(keys.iter().map(|k| record(k, 4000, 3000)).collect())
    }

    pub fn get_fetches(&self) -> Vec<(String, String)> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn get_searches(&self) -> Vec<SearchQuery> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetStore for MockStore {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<AssetRecord>, StoreError> {
        self.searches.lock().unwrap().push(query.clone());
        if self.fail_search {
            return Err(StoreError::Auth("invalid api key".into()));
        }

        let mut out = self.records.clone();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        if query.direction == SortDirection::Desc {
            out.reverse();
        }
        out.truncate(query.max_results as usize);
        if self.scramble_order {
            out.reverse();
        }
        Ok(out)
    }

    async fn fetch(
        &self,
        key: &str,
        format: &str,
        transformation: &Transformation,
    ) -> Result<Bytes, StoreError> {
        self.fetches
            .lock()
            .unwrap()
            .push((format!("{key}.{format}"), transformation.to_string()));

        if let Some(delay) = self.delays.get(key) {
            tokio::time::sleep(*delay).await;
        }
        if self.missing.contains(key) {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Ok(self
            .renditions
            .get(key)
            .cloned()
            .map(Bytes::from)
            .unwrap_or_else(|| Bytes::copy_from_slice(key.as_bytes())))
    }
}
