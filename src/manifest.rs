//! Manifest building.
//!
//! Lists the configured folder in the external store, orders the assets by
//! key (greatest first), caps the list and numbers it from 0. The resulting
//! ids end up in shareable photo URLs (`/p/{id}`) and in browser history
//! state, so the ordering must be reproducible from the keys alone:
//!
//! ```text
//! store:    b  c  a        (any raw order)
//! sorted:   c  b  a        (descending by key)
//! ids:      0  1  2
//! ```
//!
//! Assets beyond `result_cap` are dropped without error. That is a known
//! limit, not pagination waiting to happen.

use crate::config::{GalleryConfig, StoreConfig};
use crate::store::cloudinary::delivery_url;
use crate::store::{AssetRecord, AssetStore, SearchQuery, StoreError, Transformation};
use crate::types::AssetDescriptor;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Store query failed: {0}")]
    Store(#[from] StoreError),
    #[error("Invalid asset record {key}: {reason}")]
    InvalidRecord { key: String, reason: String },
}

/// Query the store and return the ordered, numbered descriptors.
///
/// Placeholders are not populated. Any store error is returned as-is; there
/// is no retry and no partial result.
pub async fn build_manifest(
    store: &impl AssetStore,
    config: &StoreConfig,
) -> Result<Vec<AssetDescriptor>, ManifestError> {
    let query = SearchQuery::folder(&config.namespace, config.result_cap);
    let records = store.search(&query).await?;
    debug!(returned = records.len(), "Store search complete");

    let descriptors = order_records(records, config.result_cap)?;
    info!(
        namespace = %config.namespace,
        count = descriptors.len(),
        "Manifest built"
    );
    Ok(descriptors)
}

/// Sort descending by key, truncate to `cap` and assign ids.
///
/// The store is asked to sort too; sorting again here means a store that
/// ignores the sort, or returns ties in a different order, can't change
/// the manifest.
pub fn order_records(
    mut records: Vec<AssetRecord>,
    cap: u32,
) -> Result<Vec<AssetDescriptor>, ManifestError> {
    records.sort_by(|a, b| b.key.cmp(&a.key));
    records.truncate(cap as usize);

    // Only records that make the cut are checked
    for record in &records {
        if record.width == 0 || record.height == 0 {
            return Err(ManifestError::InvalidRecord {
                key: record.key.clone(),
                reason: format!("dimensions {}x{}", record.width, record.height),
            });
        }
        if record.key.is_empty() {
            return Err(ManifestError::InvalidRecord {
                key: String::new(),
                reason: "empty key".into(),
            });
        }
    }

    Ok(records
        .into_iter()
        .enumerate()
        .map(|(i, r)| AssetDescriptor {
            id: i as u32,
            public_id: r.key,
            format: r.format,
            width: r.width,
            height: r.height,
            blur_data_url: None,
        })
        .collect())
}

/// Shareable URL path of a photo.
pub fn photo_path(id: u32) -> String {
    format!("/p/{id}")
}

/// Parse `/p/{id}` (optionally with a trailing slash) back to the id.
pub fn parse_photo_path(path: &str) -> Option<u32> {
    let rest = path.strip_prefix("/p/")?;
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

/// The finished gallery manifest handed to the page renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Cloud name for public image URLs.
    pub cloud_name: String,
    pub delivery_base: String,
    /// Width of the rendition shown in the grid.
    pub grid_width: u32,
    /// Width of the rendition shown in the modal viewer.
    pub full_width: u32,
    /// SHA-256 over every descriptor, for comparing builds.
    pub fingerprint: String,
    pub images: Vec<AssetDescriptor>,
}

impl Manifest {
    pub fn new(images: Vec<AssetDescriptor>, config: &GalleryConfig) -> Self {
        let fingerprint = fingerprint(&images);
        Self {
            cloud_name: config.store.public_cloud_name().to_string(),
            delivery_base: config.store.delivery_base.trim_end_matches('/').to_string(),
            grid_width: config.display.grid_width,
            full_width: config.display.full_width,
            fingerprint,
            images,
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Look up a photo by id.
    pub fn get(&self, id: u32) -> Option<&AssetDescriptor> {
        // ids are positions
        self.images.get(id as usize).filter(|d| d.id == id)
    }

    /// Resolve a shareable `/p/{id}` path to its photo.
    pub fn resolve_path(&self, path: &str) -> Option<&AssetDescriptor> {
        parse_photo_path(path).and_then(|id| self.get(id))
    }

    /// Previous and next ids for stepping through the viewer.
    pub fn neighbors(&self, id: u32) -> (Option<u32>, Option<u32>) {
        if self.get(id).is_none() {
            return (None, None);
        }
        let prev = id.checked_sub(1);
        let next = id.checked_add(1).filter(|n| (*n as usize) < self.images.len());
        (prev, next)
    }

    /// Public URL of `descriptor` scaled to `width`.
    pub fn image_url(&self, descriptor: &AssetDescriptor, width: u32) -> String {
        delivery_url(
            &self.delivery_base,
            &self.cloud_name,
            &descriptor.public_id,
            &descriptor.format,
            &Transformation::scale(width),
        )
    }

    pub fn grid_url(&self, descriptor: &AssetDescriptor) -> String {
        self.image_url(descriptor, self.grid_width)
    }

    pub fn full_url(&self, descriptor: &AssetDescriptor) -> String {
        self.image_url(descriptor, self.full_width)
    }
}

/// SHA-256 over id, key, format, dimensions and placeholder of every
/// descriptor, in order. Two builds with equal fingerprints produced the
/// same manifest.
pub fn fingerprint(images: &[AssetDescriptor]) -> String {
    let mut hasher = Sha256::new();
    for d in images {
        hasher.update(d.id.to_le_bytes());
        hasher.update(d.public_id.as_bytes());
        hasher.update(b"\0");
        hasher.update(d.format.as_bytes());
        hasher.update(b"\0");
        hasher.update(d.width.to_le_bytes());
        hasher.update(d.height.to_le_bytes());
        if let Some(p) = &d.blur_data_url {
            hasher.update(p.as_str().as_bytes());
        }
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use crate::types::Placeholder;

    // =========================================================================
    // build_manifest
    // =========================================================================

    #[tokio::test]
    async fn orders_by_key_descending() {
        let store = MockStore::with_keys(&["c", "a", "b"]);
        let descriptors = build_manifest(&store, &store_config(400)).await.unwrap();

        assert_eq!(keys(&descriptors), vec!["c", "b", "a"]);
        assert_eq!(ids(&descriptors), vec![0, 1, 2]);
        assert!(descriptors.iter().all(|d| d.blur_data_url.is_none()));
    }

    #[tokio::test]
    async fn cap_keeps_greatest_keys() {
        let store = MockStore::with_keys(&["a", "b", "c", "d", "e"]);
        let descriptors = build_manifest(&store, &store_config(2)).await.unwrap();

        assert_eq!(keys(&descriptors), vec!["e", "d"]);
        assert_eq!(ids(&descriptors), vec![0, 1]);
    }

    #[tokio::test]
    async fn count_is_min_of_assets_and_cap() {
        for (n, cap) in [(0, 5), (3, 5), (5, 5), (7, 5)] {
            let names: Vec<String> = (0..n).map(|i| format!("k{i:02}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let store = MockStore::with_keys(&refs);
            let descriptors = build_manifest(&store, &store_config(cap)).await.unwrap();
            assert_eq!(descriptors.len(), n.min(cap as usize), "n={n} cap={cap}");
        }
    }

    #[tokio::test]
    async fn raw_response_order_does_not_change_manifest() {
        let keys_in = ["gallery/03", "gallery/01", "gallery/02"];
        let sorted = build_manifest(&MockStore::with_keys(&keys_in), &store_config(400))
            .await
            .unwrap();

        let mut scrambled_store = MockStore::with_keys(&keys_in);
        scrambled_store.scramble_order = true;
        let scrambled = build_manifest(&scrambled_store, &store_config(400))
            .await
            .unwrap();

        assert_eq!(sorted, scrambled);
    }

    #[tokio::test]
    async fn sends_folder_query_with_cap() {
        let store = MockStore::with_keys(&["a"]);
        let mut config = store_config(123);
        config.namespace = "ee".into();
        build_manifest(&store, &config).await.unwrap();

        let searches = store.get_searches();
        assert_eq!(searches, vec![SearchQuery::folder("ee", 123)]);
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let mut store = MockStore::with_keys(&["a"]);
        store.fail_search = true;
        let result = build_manifest(&store, &store_config(400)).await;
        assert!(matches!(result, Err(ManifestError::Store(StoreError::Auth(_)))));
    }

    #[tokio::test]
    async fn carries_format_and_dimensions() {
        let store = MockStore::new(vec![AssetRecord {
            key: "gallery/a".into(),
            format: "png".into(),
            width: 1200,
            height: 800,
        }]);
        let descriptors = build_manifest(&store, &store_config(400)).await.unwrap();
        assert_eq!(descriptors[0].format, "png");
        assert_eq!((descriptors[0].width, descriptors[0].height), (1200, 800));
    }

    // =========================================================================
    // order_records
    // =========================================================================

    #[test]
    fn order_records_rejects_zero_dimensions() {
        let result = order_records(vec![record("a", 0, 10)], 10);
        assert!(matches!(result, Err(ManifestError::InvalidRecord { key, .. }) if key == "a"));
    }

    #[test]
    fn order_records_ignores_bad_record_beyond_cap() {
        let input = vec![record("a", 0, 0), record("c", 4, 3), record("b", 4, 3)];
        let descriptors = order_records(input, 2).unwrap();
        let keys: Vec<&str> = descriptors.iter().map(|d| d.public_id.as_str()).collect();
        assert_eq!(keys, vec!["c", "b"]);
    }

    #[test]
    fn order_records_rejects_bad_record_within_cap() {
        let input = vec![record("a", 4, 3), record("c", 4, 0), record("b", 4, 3)];
        let result = order_records(input, 2);
        assert!(matches!(result, Err(ManifestError::InvalidRecord { key, .. }) if key == "c"));
    }

    #[test]
    fn order_records_is_idempotent() {
        let input = vec![record("b", 1, 1), record("a", 1, 1), record("c", 1, 1)];
        let first = order_records(input.clone(), 10).unwrap();
        let second = order_records(input, 10).unwrap();
        assert_eq!(first, second);
    }

    // =========================================================================
    // Photo paths
    // =========================================================================

    #[test]
    fn photo_path_round_trip() {
        assert_eq!(photo_path(12), "/p/12");
        assert_eq!(parse_photo_path("/p/12"), Some(12));
        assert_eq!(parse_photo_path("/p/12/"), Some(12));
    }

    #[test]
    fn parse_photo_path_rejects_garbage() {
        assert_eq!(parse_photo_path("/p/"), None);
        assert_eq!(parse_photo_path("/p/-1"), None);
        assert_eq!(parse_photo_path("/p/+1"), None);
        assert_eq!(parse_photo_path("/x/1"), None);
        assert_eq!(parse_photo_path("/p/1a"), None);
    }

    // =========================================================================
    // Manifest
    // =========================================================================

    fn manifest_of(n: u32) -> Manifest {
        let images = (0..n).map(|i| descriptor(i, &format!("gallery/{i}"))).collect();
        let mut config = GalleryConfig::default();
        config.store.account_id = "demo".into();
        Manifest::new(images, &config)
    }

    #[test]
    fn get_and_resolve_path() {
        let m = manifest_of(3);
        assert_eq!(m.get(1).unwrap().public_id, "gallery/1");
        assert!(m.get(3).is_none());
        assert_eq!(m.resolve_path("/p/2").unwrap().id, 2);
        assert!(m.resolve_path("/p/9").is_none());
    }

    #[test]
    fn neighbors_stop_at_ends() {
        let m = manifest_of(3);
        assert_eq!(m.neighbors(0), (None, Some(1)));
        assert_eq!(m.neighbors(1), (Some(0), Some(2)));
        assert_eq!(m.neighbors(2), (Some(1), None));
        assert_eq!(m.neighbors(7), (None, None));
    }

    #[test]
    fn image_urls_use_public_cloud_name() {
        let mut m = manifest_of(1);
        m.cloud_name = "public".into();
        let d = m.images[0].clone();
        assert_eq!(
            m.grid_url(&d),
            "https://res.cloudinary.com/public/image/upload/c_scale,w_720/gallery/0.jpg"
        );
        assert_eq!(
            m.full_url(&d),
            "https://res.cloudinary.com/public/image/upload/c_scale,w_2560/gallery/0.jpg"
        );
    }

    #[test]
    fn fingerprint_changes_with_placeholder() {
        let plain = vec![descriptor(0, "a")];
        let mut with_placeholder = plain.clone();
        with_placeholder[0].blur_data_url = Some(Placeholder::from_jpeg(b"x"));

        assert_eq!(fingerprint(&plain), fingerprint(&plain.clone()));
        assert_ne!(fingerprint(&plain), fingerprint(&with_placeholder));
        assert_eq!(fingerprint(&plain).len(), 64);
    }

    #[test]
    fn manifest_json_shape() {
        let m = manifest_of(1);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["cloud_name"], "demo");
        assert_eq!(json["grid_width"], 720);
        assert_eq!(json["images"][0]["public_id"], "gallery/0");
        assert_eq!(json["images"][0]["id"], 0);
    }
}
