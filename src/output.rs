//! CLI output formatting.
//!
//! Every photo is shown by its id and store key, with format, size and
//! placeholder weight as indented context lines.
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! Images (3)
//! 000 gallery/c
//!     jpg 4000x3000
//! 001 gallery/b
//!     png 1200x800
//! ```
//!
//! ## Build
//!
//! ```text
//! Images (2)
//! 000 gallery/c
//!     jpg 4000x3000, placeholder 420 B
//! 001 gallery/b
//!     png 1200x800, placeholder 388 B
//!
//! Fingerprint: 9f2c…
//! Wrote 2 images → dist/images.json
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::config::GalleryConfig;
use crate::manifest::Manifest;
use crate::types::AssetDescriptor;
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format an id as 3-digit zero-padded.
fn format_index(id: u32) -> String {
    format!("{:0>3}", id)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn image_header(d: &AssetDescriptor) -> String {
    format!("{} {}", format_index(d.id), d.public_id)
}

fn image_detail(d: &AssetDescriptor) -> String {
    let base = format!("{} {}x{}", d.format, d.width, d.height);
    match &d.blur_data_url {
        Some(p) => format!("{}, placeholder {} B", base, p.payload_len()),
        None => base,
    }
}

fn image_lines(images: &[AssetDescriptor]) -> Vec<String> {
    let mut lines = vec![format!("Images ({})", images.len())];
    for d in images {
        lines.push(image_header(d));
        lines.push(format!("{}{}", indent(1), image_detail(d)));
    }
    lines
}

// ============================================================================
// list
// ============================================================================

/// Format the ordered listing produced by the manifest builder.
pub fn format_list_output(descriptors: &[AssetDescriptor]) -> Vec<String> {
    image_lines(descriptors)
}

/// Print list output to stdout.
pub fn print_list_output(descriptors: &[AssetDescriptor]) {
    for line in format_list_output(descriptors) {
        println!("{}", line);
    }
}

// ============================================================================
// build
// ============================================================================

/// Format the result of a full build.
pub fn format_build_output(manifest: &Manifest, output_path: &Path) -> Vec<String> {
    let mut lines = image_lines(&manifest.images);

    let total: usize = manifest
        .images
        .iter()
        .filter_map(|d| d.blur_data_url.as_ref())
        .map(|p| p.payload_len())
        .sum();

    lines.push(String::new());
    lines.push(format!("Placeholders: {} B total", total));
    lines.push(format!("Fingerprint: {}", manifest.fingerprint));
    lines.push(format!(
        "Wrote {} images → {}",
        manifest.len(),
        output_path.display()
    ));
    lines
}

/// Print build output to stdout.
pub fn print_build_output(manifest: &Manifest, output_path: &Path) {
    for line in format_build_output(manifest, output_path) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

/// Format the effective configuration.
pub fn format_config_output(config: &GalleryConfig) -> Vec<String> {
    let store = &config.store;
    let account = if store.account_id.is_empty() {
        "(unset)"
    } else {
        store.account_id.as_str()
    };
    let concurrency = match config.fetch.concurrency_limit() {
        Some(n) => n.to_string(),
        None => "unbounded".to_string(),
    };
    let timeout = match config.fetch.timeout() {
        Some(t) => format!("{}s", t.as_secs()),
        None => "none".to_string(),
    };

    vec![
        "Store".to_string(),
        format!("{}Folder: folder:{}/*", indent(1), store.namespace),
        format!("{}Account: {}", indent(1), account),
        format!("{}Public name: {}", indent(1), store.public_cloud_name()),
        format!("{}Result cap: {}", indent(1), store.result_cap),
        "Placeholder".to_string(),
        format!(
            "{}{}px, quality {}",
            indent(1),
            config.placeholder.width,
            config.placeholder.quality
        ),
        "Fetch".to_string(),
        format!("{}Concurrency: {}", indent(1), concurrency),
        format!("{}Timeout: {}", indent(1), timeout),
        "Display".to_string(),
        format!(
            "{}Grid {}px, full {}px",
            indent(1),
            config.display.grid_width,
            config.display.full_width
        ),
    ]
}

/// Print config output to stdout.
pub fn print_config_output(config: &GalleryConfig) {
    for line in format_config_output(config) {
        println!("{}", line);
    }
}
