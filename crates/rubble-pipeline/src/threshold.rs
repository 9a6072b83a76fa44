//! Binary thresholding of grayscale images.

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// How the binary threshold level is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// A fixed gray level.
    Fixed(u8),
    /// Otsu's method: the level that maximizes between-class variance.
    Otsu,
}

impl Default for ThresholdMode {
    fn default() -> Self {
        Self::Fixed(127)
    }
}

impl ThresholdMode {
    /// Resolve the gray level used for `image`.
    #[must_use]
    pub fn level(self, image: &GrayImage) -> u8 {
        match self {
            Self::Fixed(level) => level,
            Self::Otsu => imageproc::contrast::otsu_level(image),
        }
    }
}

/// Binarize: pixels strictly brighter than `level` become 255, all
/// others 0.
#[must_use = "returns the binary mask"]
pub fn binarize(image: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y).0[0] > level {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    })
}

/// Count pixels with a non-zero value.
#[must_use]
pub fn count_foreground(mask: &GrayImage) -> u64 {
    mask.pixels().map(|p| u64::from(p.0[0] > 0)).sum()
}
