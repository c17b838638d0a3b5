//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale `source` down so its width is at most `max_width`, keeping the
/// aspect ratio.
///
/// Never upscales. Both edges stay at least 1px, so extreme panoramas still
/// produce a valid image.
///
/// # Examples
/// ```
/// # use cloud_gal::imaging::fit_to_width;
/// assert_eq!(fit_to_width((4000, 3000), 8), (8, 6));
/// assert_eq!(fit_to_width((6, 4), 8), (6, 4));
/// ```
pub fn fit_to_width(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w <= max_width || src_w == 0 {
        return source;
    }

    let scale = max_width as f64 / src_w as f64;
    let h = (src_h as f64 * scale).round().max(1.0) as u32;
    (max_width.max(1), h)
}
