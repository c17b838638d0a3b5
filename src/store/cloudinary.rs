//! Cloudinary implementation of [`AssetStore`].
//!
//! - Listing uses the Search API:
//!   `POST {api_base}/{cloud}/resources/search` with HTTP basic auth.
//! - Renditions come from the delivery CDN:
//!   `GET {delivery_base}/{cloud}/image/upload/{transformation}/{key}.{format}`.

use super::{AssetRecord, AssetStore, SearchQuery, StoreError, Transformation};
use crate::config::{ConfigError, Credentials, StoreConfig};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("cloud-gal/", env!("CARGO_PKG_VERSION"));

/// Cloudinary Search + delivery client.
pub struct CloudinaryStore {
    client: Client,
    cloud_name: String,
    api_base: String,
    delivery_base: String,
    credentials: Credentials,
}

impl std::fmt::Debug for CloudinaryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryStore")
            .field("cloud_name", &self.cloud_name)
            .field("api_base", &self.api_base)
            .field("delivery_base", &self.delivery_base)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    expression: &'a str,
    sort_by: [BTreeMap<&'a str, &'static str>; 1],
    max_results: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    resources: Vec<Resource>,
    #[serde(default)]
    total_count: Option<u64>,
}

#[derive(Deserialize)]
struct Resource {
    public_id: String,
    format: String,
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

impl CloudinaryStore {
    /// Build a client for the account in `config`.
    ///
    /// `timeout` applies to every request, search and fetch alike.
    ///
    /// # Errors
    /// [`ConfigError::Missing`] when no account id is configured, or
    /// [`ConfigError::Validation`] if the HTTP client can't be built.
    pub fn new(
        config: &StoreConfig,
        credentials: Credentials,
        timeout: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        let cloud_name = config.require_account_id()?.to_string();

        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::Validation(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            cloud_name,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            delivery_base: config.delivery_base.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/{}/resources/search", self.api_base, self.cloud_name)
    }

    /// Delivery URL of `{key}.{format}` under `transformation`.
    pub fn delivery_url(&self, key: &str, format: &str, transformation: &Transformation) -> String {
        delivery_url(&self.delivery_base, &self.cloud_name, key, format, transformation)
    }
}

/// Build a delivery URL. Shared with the manifest's public URL helpers.
pub fn delivery_url(
    base: &str,
    cloud_name: &str,
    key: &str,
    format: &str,
    transformation: &Transformation,
) -> String {
    let segment = transformation.to_string();
    if segment.is_empty() {
        format!("{base}/{cloud_name}/image/upload/{key}.{format}")
    } else {
        format!("{base}/{cloud_name}/image/upload/{segment}/{key}.{format}")
    }
}

fn network_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Network("request timed out".into())
    } else if e.is_connect() {
        StoreError::Network(format!("failed to connect: {e}"))
    } else {
        StoreError::Network(e.to_string())
    }
}

/// Map a non-success response to a [`StoreError`], using Cloudinary's
/// `{"error": {"message": ...}}` body when there is one.
async fn error_from_response(response: reqwest::Response, what: &str) -> StoreError {
    let status = response.status();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => format!("HTTP {status}"),
    };
    warn!(status = status.as_u16(), %message, what, "Store request failed");

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Auth(message),
        StatusCode::NOT_FOUND => StoreError::NotFound(format!("{what}: {message}")),
        StatusCode::BAD_REQUEST => StoreError::BadQuery(message),
        _ => StoreError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl AssetStore for CloudinaryStore {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<AssetRecord>, StoreError> {
        let body = SearchRequest {
            expression: &query.expression,
            sort_by: [BTreeMap::from([(query.sort_by.as_str(), query.direction.as_str())])],
            max_results: query.max_results,
        };

        debug!(expression = %query.expression, max_results = query.max_results, "Searching store");

        let response = self
            .client
            .post(self.search_url())
            .basic_auth(&self.credentials.api_key, Some(&self.credentials.api_secret))
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response, &query.expression).await);
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("search response: {e}")))?;

        if let Some(total) = parsed.total_count {
            if total > parsed.resources.len() as u64 {
                debug!(
                    total,
                    returned = parsed.resources.len(),
                    "Search matched more assets than the result cap"
                );
            }
        }

        Ok(parsed
            .resources
            .into_iter()
            .map(|r| AssetRecord {
                key: r.public_id,
                format: r.format,
                width: r.width,
                height: r.height,
            })
            .collect())
    }

    async fn fetch(
        &self,
        key: &str,
        format: &str,
        transformation: &Transformation,
    ) -> Result<Bytes, StoreError> {
        let url = self.delivery_url(key, format, transformation);
        debug!(%url, "Fetching rendition");

        let response = self.client.get(&url).send().await.map_err(network_error)?;
        if !response.status().is_success() {
            return Err(error_from_response(response, key).await);
        }

        response.bytes().await.map_err(network_error)
    }
}
