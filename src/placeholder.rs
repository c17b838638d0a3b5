//! Blur placeholder generation.
//!
//! For every descriptor, fetch a tiny JPEG rendition from the store
//! (`f_jpg,w_8,q_70` by default), run it through the image backend and
//! wrap the result as a `data:image/jpeg;base64,...` URL the page can inline.
//!
//! ## Concurrency
//!
//! [`PlaceholderGenerator::generate_all`] starts every fetch up front (or up
//! to `fetch.max_concurrent` at a time) and takes results in completion
//! order, so the first failure anywhere in the batch stops it. Dropping the
//! stream on error cancels the fetches still in flight, so a single missing
//! asset fails the batch without waiting on slower fetches ahead of it.
//! Successful results are returned in input order.
//!
//! There is no per-asset fallback. A gallery with a missing placeholder is
//! a failed build.

use crate::config::GalleryConfig;
use crate::imaging::{BackendError, ImageBackend, PlaceholderParams, Quality, encode_placeholder};
use crate::store::{AssetStore, StoreError, Transformation};
use crate::types::{AssetDescriptor, Placeholder};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PlaceholderError {
    #[error("Failed to fetch rendition of {key}: {source}")]
    Fetch {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("Failed to encode placeholder for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: BackendError,
    },
    #[error("Fetching rendition of {key} timed out after {timeout:?}")]
    Timeout { key: String, timeout: Duration },
}

/// A placeholder together with the key it was generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPlaceholder {
    pub key: String,
    pub placeholder: Placeholder,
}

/// Generates placeholders against one store with one backend.
pub struct PlaceholderGenerator<'a, S, B> {
    store: &'a S,
    backend: &'a B,
    params: PlaceholderParams,
    max_concurrent: Option<usize>,
    timeout: Option<Duration>,
}

impl<'a, S: AssetStore, B: ImageBackend> PlaceholderGenerator<'a, S, B> {
    pub fn new(store: &'a S, backend: &'a B, config: &GalleryConfig) -> Self {
        Self {
            store,
            backend,
            params: PlaceholderParams {
                width: config.placeholder.width,
                quality: Quality::new(config.placeholder.quality),
            },
            max_concurrent: config.fetch.concurrency_limit(),
            timeout: config.fetch.timeout(),
        }
    }

    /// Rendition requested from the store for every placeholder.
    pub fn transformation(&self) -> Transformation {
        Transformation::placeholder(self.params.width, self.params.quality.value())
    }

    /// Fetch and encode the placeholder for one descriptor.
    pub async fn generate(
        &self,
        descriptor: &AssetDescriptor,
    ) -> Result<GeneratedPlaceholder, PlaceholderError> {
        let key = &descriptor.public_id;
        let rendition = self.fetch_rendition(descriptor).await?;

        debug!(%key, bytes = rendition.len(), "Rendition fetched");

        let placeholder =
            encode_placeholder(self.backend, &rendition, &self.params).map_err(|source| {
                PlaceholderError::Encode {
                    key: key.clone(),
                    source,
                }
            })?;

        Ok(GeneratedPlaceholder {
            key: key.clone(),
            placeholder,
        })
    }

    /// Generate placeholders for every descriptor, in input order.
    ///
    /// Fails as soon as any single placeholder fails, whatever its position;
    /// no partial result. Results are collected as they complete and put
    /// back in input order at the end.
    pub async fn generate_all(
        &self,
        descriptors: &[AssetDescriptor],
    ) -> Result<Vec<GeneratedPlaceholder>, PlaceholderError> {
        let limit = self
            .max_concurrent
            .unwrap_or(descriptors.len())
            .max(1);

        info!(
            count = descriptors.len(),
            concurrency = limit,
            transformation = %self.transformation(),
            "Generating placeholders"
        );

        let mut generated: Vec<(usize, GeneratedPlaceholder)> =
            stream::iter(descriptors.iter().enumerate().map(|(i, d)| async move {
                self.generate(d).await.map(|g| (i, g))
            }))
            .buffer_unordered(limit)
            .try_collect()
            .await?;

        generated.sort_by_key(|(i, _)| *i);
        Ok(generated.into_iter().map(|(_, g)| g).collect())
    }

    async fn fetch_rendition(
        &self,
        descriptor: &AssetDescriptor,
    ) -> Result<bytes::Bytes, PlaceholderError> {
        let key = &descriptor.public_id;
        let transformation = self.transformation();
        let fetch = self
            .store
            .fetch(key, &descriptor.format, &transformation);

        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, fetch)
                .await
                .map_err(|_| PlaceholderError::Timeout {
                    key: key.clone(),
                    timeout,
                })?,
            None => fetch.await,
        };

        result.map_err(|source| PlaceholderError::Fetch {
            key: key.clone(),
            source,
        })
    }
}
