//! # Cloud Gal
//!
//! Build-time data for a single-page photo gallery whose photos live in
//! Cloudinary. The page itself (masonry grid, modal viewer, history sync)
//! is rendered elsewhere; this crate produces the JSON it renders from.
//!
//! # Architecture: Two Steps and a Zip
//!
//! ```text
//! 1. List       folder:<namespace>/*  →  descriptors   (sorted, capped, numbered)
//! 2. Preview    descriptors           →  placeholders  (one tiny fetch each, concurrent)
//! 3. Attach     zip by position       →  images.json   (keys checked, fingerprinted)
//! ```
//!
//! Nothing is cached between builds. Every build re-lists the folder and
//! regenerates every placeholder, and any failure fails the whole build.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`manifest`] | Step 1: query the store, order by key, assign ids; URL and id helpers |
//! | [`placeholder`] | Step 2: fetch renditions and encode blur placeholders, bounded fan-out |
//! | [`pipeline`] | Step 3: run both, attach placeholders, write the manifest |
//! | [`store`] | [`store::AssetStore`] trait and the Cloudinary HTTP client |
//! | [`imaging`] | Pure-Rust decode / downsample / JPEG encode |
//! | [`config`] | `config.toml` loading, env overrides, validation |
//! | [`types`] | `AssetDescriptor` and `Placeholder`, as serialized into the manifest |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Ids Are Positions in a Key-Sorted List
//!
//! Photo ids appear in shareable URLs (`/p/3`) and in browser history, so
//! they are derived from the keys alone: sort descending by `public_id`,
//! number from 0. The store is asked for that order and the result is
//! sorted again locally, so a reshuffled response gives the same ids.
//!
//! ## Silent Cap
//!
//! `store.result_cap` (default 400) bounds the listing. Extra assets are
//! dropped, keeping the greatest keys. There is no pagination.
//!
//! ## All-or-Nothing Placeholders
//!
//! Placeholder fetches run concurrently (bounded by `fetch.max_concurrent`,
//! each with `fetch.timeout_secs`). The first failure cancels the rest and
//! fails the build; a gallery is never published with missing previews.
//!
//! ## Inline JPEG Data URLs
//!
//! The store is asked for an 8px-wide JPEG rendition, which is decoded and
//! re-encoded locally with the `image` crate and embedded as a base64
//! `data:` URL. The encoder is deterministic, so unchanged photos give
//! byte-identical manifests and an unchanged [`manifest::Manifest::fingerprint`].

pub mod config;
pub mod imaging;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod placeholder;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
