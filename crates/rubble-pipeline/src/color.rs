//! HSV conversion and hue/saturation/value range masking.
//!
//! HSV values use the common 8-bit layout: hue in `0..=180` (degrees
//! halved so a full turn fits a byte), saturation and value in `0..=255`.
//! Configured ranges are written in this layout.

use image::{GrayImage, RgbImage};
use palette::{FromColor, Hsv, Srgb};
use serde::{Deserialize, Serialize};

use crate::types::PipelineError;

/// Largest hue value in the 8-bit layout.
pub const MAX_HUE: u8 = 180;

/// An image whose three channels hold hue, saturation, and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HsvImage(RgbImage);

impl HsvImage {
    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// `[h, s, v]` at `(x, y)`.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        self.0.get_pixel(x, y).0
    }

    /// Iterate over all `[h, s, v]` triples in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.0.pixels().map(|p| p.0)
    }
}

/// Convert one sRGB pixel to 8-bit HSV.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let color = Srgb::new(rgb[0], rgb[1], rgb[2]).into_format::<f32>();
    let hsv: Hsv = Hsv::from_color(color);

    // Values are clamped into range before the casts.
    let hue = (hsv.hue.into_positive_degrees() / 2.0)
        .round()
        .clamp(0.0, f32::from(MAX_HUE)) as u8;
    let saturation = (hsv.saturation * 255.0).round().clamp(0.0, 255.0) as u8;
    let value = (hsv.value * 255.0).round().clamp(0.0, 255.0) as u8;
    [hue, saturation, value]
}

/// Convert an RGB image to HSV.
#[must_use = "returns the HSV image"]
pub fn to_hsv(image: &RgbImage) -> HsvImage {
    HsvImage(RgbImage::from_fn(image.width(), image.height(), |x, y| {
        image::Rgb(rgb_to_hsv(image.get_pixel(x, y).0))
    }))
}

/// An inclusive box in HSV space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    /// Lower corner `[h, s, v]`, inclusive.
    pub lower: [u8; 3],
    /// Upper corner `[h, s, v]`, inclusive.
    pub upper: [u8; 3],
}

impl HsvRange {
    /// Create a new range.
    #[must_use]
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Returns `true` if `hsv` lies inside the range on every channel.
    #[must_use]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }

    /// Check that the range is well-formed.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if a hue bound exceeds
    /// [`MAX_HUE`] or a lower bound exceeds its upper bound.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.lower[0] > MAX_HUE || self.upper[0] > MAX_HUE {
            return Err(PipelineError::InvalidConfig(format!(
                "HSV hue bounds must be at most {MAX_HUE}, got {:?}..{:?}",
                self.lower, self.upper,
            )));
        }
        if (0..3).any(|c| self.lower[c] > self.upper[c]) {
            return Err(PipelineError::InvalidConfig(format!(
                "HSV range lower bound {:?} exceeds upper bound {:?}",
                self.lower, self.upper,
            )));
        }
        Ok(())
    }
}

/// Build a binary mask of pixels inside any of `ranges`.
///
/// Returns 255 where at least one range matches, 0 elsewhere. An empty
/// range list produces an all-zero mask.
#[must_use = "returns the range mask"]
pub fn range_mask<'a>(hsv: &HsvImage, ranges: impl IntoIterator<Item = &'a HsvRange>) -> GrayImage {
    let ranges: Vec<&HsvRange> = ranges.into_iter().collect();
    GrayImage::from_fn(hsv.width(), hsv.height(), |x, y| {
        let px = hsv.get(x, y);
        if ranges.iter().any(|r| r.contains(px)) {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    })
}
