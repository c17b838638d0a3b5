//! Full build: list → generate placeholders → attach → manifest.
//!
//! ```text
//! build_manifest        descriptors (ids, keys, sizes)
//!        │
//! generate_all          one placeholder per descriptor, same order
//!        │
//! attach_placeholders   zip by position, check keys line up
//!        │
//! Manifest::new         + delivery info + fingerprint
//! ```
//!
//! Every failure aborts the build; there is no degraded output.

use crate::config::GalleryConfig;
use crate::imaging::ImageBackend;
use crate::manifest::{Manifest, ManifestError, build_manifest};
use crate::placeholder::{GeneratedPlaceholder, PlaceholderError, PlaceholderGenerator};
use crate::store::AssetStore;
use crate::types::AssetDescriptor;
use std::path::Path;
use thiserror::Error;
use tracing::{Instrument, info, info_span};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),
    #[error("Placeholder for id {id} was generated from {actual}, expected {expected}")]
    Mismatch {
        id: u32,
        expected: String,
        actual: String,
    },
    #[error("Expected {expected} placeholders, got {actual}")]
    Count { expected: usize, actual: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Run the whole build against `store`, decoding with `backend`.
pub async fn build(
    store: &impl AssetStore,
    backend: &impl ImageBackend,
    config: &GalleryConfig,
) -> Result<Manifest, PipelineError> {
    let descriptors = build_manifest(store, &config.store)
        .instrument(info_span!("manifest", namespace = %config.store.namespace))
        .await?;

    let generator = PlaceholderGenerator::new(store, backend, config);
    let generated = generator
        .generate_all(&descriptors)
        .instrument(info_span!("placeholders", count = descriptors.len()))
        .await?;

    let images = attach_placeholders(descriptors, generated)?;
    let manifest = Manifest::new(images, config);
    info!(
        images = manifest.len(),
        fingerprint = %manifest.fingerprint,
        "Build complete"
    );
    Ok(manifest)
}

/// Zip placeholders onto descriptors by position.
///
/// Each placeholder must come from the descriptor at the same position;
/// a key mismatch or length mismatch is an error rather than a silently
/// wrong preview.
pub fn attach_placeholders(
    descriptors: Vec<AssetDescriptor>,
    generated: Vec<GeneratedPlaceholder>,
) -> Result<Vec<AssetDescriptor>, PipelineError> {
    if descriptors.len() != generated.len() {
        return Err(PipelineError::Count {
            expected: descriptors.len(),
            actual: generated.len(),
        });
    }

    descriptors
        .into_iter()
        .zip(generated)
        .map(|(mut d, g)| {
            if d.public_id != g.key {
                return Err(PipelineError::Mismatch {
                    id: d.id,
                    expected: d.public_id,
                    actual: g.key,
                });
            }
            d.blur_data_url = Some(g.placeholder);
            Ok(d)
        })
        .collect()
}

/// Write `manifest` as pretty JSON, creating parent directories.
pub fn write_manifest(manifest: &Manifest, path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(path, json)?;
    Ok(())
}
