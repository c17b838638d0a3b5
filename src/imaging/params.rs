//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. The backend decides
//! how to decode, resample and encode.
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 70). Clamped on construction.
//! - [`PlaceholderParams`]: target width and quality of a blur placeholder.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(70)
    }
}

/// Parameters for one placeholder encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderParams {
    /// Maximum width in pixels. Height follows the source aspect ratio.
    pub width: u32,
    pub quality: Quality,
}

impl Default for PlaceholderParams {
    fn default() -> Self {
        Self {
            width: 8,
            quality: Quality::default(),
        }
    }
}
