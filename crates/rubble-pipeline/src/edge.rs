//! Canny edge detection.
//!
//! Wraps [`imageproc::edges::canny`] to detect edges in a blurred
//! grayscale image. Returns a binary image where white pixels (255) are
//! edges and black pixels (0) are background.

use image::GrayImage;

/// Floor applied to both Canny thresholds.
///
/// A low threshold of zero treats every pixel with any gradient as a
/// potential edge, producing an edge map so dense that every particle
/// merges into one blob.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Trace particle rims with the Canny detector.
///
/// The result is a mask: 255 on rim pixels, 0 elsewhere.
///
/// Pixels with gradient magnitude above `high_threshold` are definite
/// edges; those between `low_threshold` and `high_threshold` are edges
/// only if connected to a definite edge.
///
/// Thresholds below [`MIN_THRESHOLD`] are raised to it, and a low
/// threshold above the high one is lowered to match.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: u8, high_threshold: u8) -> GrayImage {
    let high = f32::from(high_threshold).max(MIN_THRESHOLD);
    let low = f32::from(low_threshold).max(MIN_THRESHOLD).min(high);
    imageproc::edges::canny(image, low, high)
}
