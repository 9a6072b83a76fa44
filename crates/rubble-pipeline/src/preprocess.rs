//! Shared preprocessing: grayscale, blur, threshold, and edge masks.
//!
//! Both contour populations come from the same source image: the binary
//! threshold mask of the unblurred grayscale feeds the full-hierarchy
//! overview, the Canny edge mask of the blurred image feeds edge-based
//! particle detection.

use image::{DynamicImage, GrayImage};

use crate::blur::gaussian_blur;
use crate::config::AnalysisConfig;
use crate::edge::canny;
use crate::grayscale::to_grayscale;
use crate::threshold::binarize;

/// Intermediate images produced by [`preprocess`].
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Single-channel source.
    pub grayscale: GrayImage,
    /// Gaussian-blurred grayscale.
    pub blurred: GrayImage,
    /// Gray level used for [`binary`](Self::binary).
    pub threshold_level: u8,
    /// Binary threshold mask of the unblurred grayscale.
    pub binary: GrayImage,
    /// Canny edge mask of the blurred image.
    pub edges: GrayImage,
}

/// Run every preprocessing step on `image`.
#[must_use = "returns the preprocessed images"]
pub fn preprocess(image: &DynamicImage, config: &AnalysisConfig) -> Preprocessed {
    let grayscale = to_grayscale(image);
    let blurred = gaussian_blur(&grayscale, config.blur_kernel);
    let threshold_level = config.threshold.level(&grayscale);
    let binary = binarize(&grayscale, threshold_level);
    let edges = canny(&blurred, config.canny_low, config.canny_high);
    Preprocessed {
        grayscale,
        blurred,
        threshold_level,
        binary,
        edges,
    }
}
