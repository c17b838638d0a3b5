//! Gallery configuration module.
//!
//! Handles loading, validating and overriding `config.toml`. Stock defaults
//! are overridden by the user's file, and the environment overrides both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [store]
//! namespace = "gallery"      # Cloudinary folder listed by the build
//! account_id = ""            # Cloudinary cloud name used for the Admin API
//! # public_name = "..."      # Cloud name used in image URLs (defaults to account_id)
//! result_cap = 400           # Max assets per build; the rest are silently dropped
//! api_base = "https://api.cloudinary.com/v1_1"
//! delivery_base = "https://res.cloudinary.com"
//!
//! [placeholder]
//! width = 8                  # Placeholder width in pixels
//! quality = 70               # JPEG quality (1-100)
//!
//! [fetch]
//! max_concurrent = 16        # Parallel rendition fetches (0 = unbounded)
//! timeout_secs = 30          # Timeout for each fetch and the search (0 = wait forever)
//!
//! [display]
//! grid_width = 720           # Rendition width used in the masonry grid
//! full_width = 2560          # Rendition width used in the modal viewer
//! ```
//!
//! ## Environment
//!
//! | Variable | Overrides |
//! |---|---|
//! | `CLOUDINARY_FOLDER` | `store.namespace` |
//! | `CLOUDINARY_CLOUD_NAME` | `store.account_id` |
//! | `CLOUDINARY_PUBLIC_NAME`, `NEXT_PUBLIC_CLOUDINARY_CLOUD_NAME` | `store.public_name` |
//! | `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET` | [`Credentials`] (env only) |
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Cloudinary's search endpoint refuses `max_results` above this.
pub const MAX_RESULT_CAP: u32 = 500;

/// Largest placeholder width accepted. Anything wider stops being a
/// "tiny inline preview" and bloats the page payload.
pub const MAX_PLACEHOLDER_WIDTH: u32 = 64;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// Gallery configuration loaded from `config.toml`.
///
/// All fields have defaults; a config file need only specify what it
/// changes. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// External store: where to list assets and how many.
    pub store: StoreConfig,
    /// Blur placeholder size and quality.
    pub placeholder: PlaceholderConfig,
    /// Concurrency and timeout for rendition fetches.
    pub fetch: FetchConfig,
    /// Rendition widths the page renderer uses for image URLs.
    pub display: DisplayConfig,
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ns = &self.store.namespace;
        if ns.is_empty() {
            return Err(ConfigError::Validation(
                "store.namespace must not be empty".into(),
            ));
        }
        if ns.chars().any(char::is_whitespace) || ns.ends_with('/') {
            return Err(ConfigError::Validation(format!(
                "store.namespace must be a folder path without whitespace or trailing '/': {ns:?}"
            )));
        }
        if self.store.result_cap == 0 || self.store.result_cap > MAX_RESULT_CAP {
            return Err(ConfigError::Validation(format!(
                "store.result_cap must be 1-{MAX_RESULT_CAP}"
            )));
        }
        if self.placeholder.width == 0 || self.placeholder.width > MAX_PLACEHOLDER_WIDTH {
            return Err(ConfigError::Validation(format!(
                "placeholder.width must be 1-{MAX_PLACEHOLDER_WIDTH}"
            )));
        }
        if self.placeholder.quality == 0 || self.placeholder.quality > 100 {
            return Err(ConfigError::Validation(
                "placeholder.quality must be 1-100".into(),
            ));
        }
        if self.display.grid_width == 0 || self.display.full_width == 0 {
            return Err(ConfigError::Validation(
                "display widths must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// External store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Folder whose contents make up the gallery (`folder:{namespace}/*`).
    pub namespace: String,
    /// Cloud name used to reach the Admin/Search API.
    pub account_id: String,
    /// Cloud name used when building public image URLs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_name: Option<String>,
    /// Maximum number of assets per build. Excess assets are dropped.
    pub result_cap: u32,
    /// Base URL of the Admin API, without the cloud name.
    pub api_base: String,
    /// Base URL of the delivery CDN, without the cloud name.
    pub delivery_base: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: "gallery".to_string(),
            account_id: String::new(),
            public_name: None,
            result_cap: 400,
            api_base: "https://api.cloudinary.com/v1_1".to_string(),
            delivery_base: "https://res.cloudinary.com".to_string(),
        }
    }
}

impl StoreConfig {
    /// Cloud name for public URLs: `public_name` when set, else `account_id`.
    pub fn public_cloud_name(&self) -> &str {
        self.public_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.account_id)
    }

    /// The account id, or [`ConfigError::Missing`] when unset.
    pub fn require_account_id(&self) -> Result<&str, ConfigError> {
        if self.account_id.is_empty() {
            Err(ConfigError::Missing(
                "store.account_id (or CLOUDINARY_CLOUD_NAME)",
            ))
        } else {
            Ok(&self.account_id)
        }
    }
}

/// Blur placeholder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderConfig {
    /// Width of the rendition requested from the store, in pixels.
    pub width: u32,
    /// JPEG quality of both the requested rendition and the re-encode.
    pub quality: u32,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            width: 8,
            quality: 70,
        }
    }
}

/// Rendition fetch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Parallel fetches in flight. 0 means one per asset, all at once.
    pub max_concurrent: usize,
    /// Timeout in seconds for each rendition fetch and for the folder
    /// search. 0 disables the timeout.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 16,
            timeout_secs: 30,
        }
    }
}

impl FetchConfig {
    /// `None` when fetches are unbounded.
    pub fn concurrency_limit(&self) -> Option<usize> {
        (self.max_concurrent > 0).then_some(self.max_concurrent)
    }

    /// `None` when requests may wait forever.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Rendition widths used for public image URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    pub grid_width: u32,
    pub full_width: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            grid_width: 720,
            full_width: 2560,
        }
    }
}

/// Admin API credentials.
///
/// Only ever read from the environment so they never end up in a committed
/// `config.toml` or in the generated manifest.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read `CLOUDINARY_API_KEY` / `CLOUDINARY_API_SECRET` through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = non_empty(lookup("CLOUDINARY_API_KEY"))
            .ok_or(ConfigError::Missing("CLOUDINARY_API_KEY"))?;
        let api_secret = non_empty(lookup("CLOUDINARY_API_SECRET"))
            .ok_or(ConfigError::Missing("CLOUDINARY_API_SECRET"))?;
        Ok(Self {
            api_key,
            api_secret,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GalleryConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Apply environment overrides to a parsed config.
///
/// `lookup` is `std::env::var` in production and a map in tests. Empty
/// values are ignored so an exported-but-blank variable doesn't wipe a
/// setting from the file.
pub fn apply_env_overrides(config: &mut GalleryConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(ns) = non_empty(lookup("CLOUDINARY_FOLDER")) {
        config.store.namespace = ns;
    }
    if let Some(cloud) = non_empty(lookup("CLOUDINARY_CLOUD_NAME")) {
        config.store.account_id = cloud;
    }
    if let Some(public) = non_empty(lookup("CLOUDINARY_PUBLIC_NAME"))
        .or_else(|| non_empty(lookup("NEXT_PUBLIC_CLOUDINARY_CLOUD_NAME")))
    {
        config.store.public_name = Some(public);
    }
}

/// Merge an optional overlay onto the stock defaults, apply environment
/// overrides, then deserialize and validate.
pub fn resolve_config(
    overlay: Option<toml::Value>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let mut config: GalleryConfig = merged.try_into()?;
    apply_env_overrides(&mut config, lookup);
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when the file
/// doesn't exist, with the process environment applied on top.
pub fn load_config(path: &Path) -> Result<GalleryConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    resolve_config(overlay, |k| std::env::var(k).ok())
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Cloud Gal Configuration
# ========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.
#
# Environment variables override this file:
#   CLOUDINARY_FOLDER       -> store.namespace
#   CLOUDINARY_CLOUD_NAME   -> store.account_id
#   CLOUDINARY_PUBLIC_NAME  -> store.public_name
# API credentials are read from CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET
# and cannot be set here.

# ---------------------------------------------------------------------------
# External store
# ---------------------------------------------------------------------------
[store]
# Folder to list. Every asset matching folder:<namespace>/* is included.
namespace = "gallery"

# Cloud name used for the search API.
account_id = ""

# Cloud name used in public image URLs. Defaults to account_id.
# public_name = ""

# Maximum number of assets in the gallery (1-500). Assets beyond the cap
# are dropped without error, keeping the lexically greatest keys.
result_cap = 400

api_base = "https://api.cloudinary.com/v1_1"
delivery_base = "https://res.cloudinary.com"

# ---------------------------------------------------------------------------
# Blur placeholders
# ---------------------------------------------------------------------------
[placeholder]
# Width in pixels of the inline preview (1-64).
width = 8

# JPEG quality (1-100).
quality = 70

# ---------------------------------------------------------------------------
# Rendition fetching
# ---------------------------------------------------------------------------
[fetch]
# Parallel fetches in flight. 0 fetches every rendition at once.
max_concurrent = 16

# Timeout in seconds for each rendition fetch. Also bounds the folder
# search request. 0 waits forever.
timeout_secs = 30

# ---------------------------------------------------------------------------
# Public image URLs
# ---------------------------------------------------------------------------
[display]
# Width of the rendition shown in the masonry grid.
grid_width = 720

# Width of the rendition shown in the full-screen viewer.
full_width = 2560
"##
}
