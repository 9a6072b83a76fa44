//! Automatic strategy selection from the image's color profile.
//!
//! Strongly and variously colored samples segment well by color;
//! near-gray samples only have luminance edges to go on; everything in
//! between runs both.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::color::{HsvImage, to_hsv};
use crate::strategy::StrategyKind;

/// Decision thresholds for [`select_strategy`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorThresholds {
    /// Mean saturation above which color segmentation is considered.
    pub color_saturation: f64,
    /// Hue variance above which color segmentation is considered.
    pub hue_variance: f64,
    /// Mean saturation below which edge detection is chosen.
    pub gray_saturation: f64,
}

impl Default for SelectorThresholds {
    fn default() -> Self {
        Self {
            color_saturation: 50.0,
            hue_variance: 200.0,
            gray_saturation: 30.0,
        }
    }
}

/// Color statistics that drive strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorProfile {
    /// Mean saturation (0..=255).
    pub mean_saturation: f64,
    /// Population variance of hue (hue in 0..=180).
    pub hue_variance: f64,
}

impl ColorProfile {
    /// Measure an HSV image.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn of(hsv: &HsvImage) -> Self {
        let n = u64::from(hsv.width()) * u64::from(hsv.height());
        if n == 0 {
            return Self::default();
        }
        let n = n as f64;

        let (mut hue_sum, mut sat_sum) = (0.0, 0.0);
        for [h, s, _] in hsv.pixels() {
            hue_sum += f64::from(h);
            sat_sum += f64::from(s);
        }
        let hue_mean = hue_sum / n;
        let hue_variance = hsv
            .pixels()
            .map(|[h, _, _]| (f64::from(h) - hue_mean).powi(2))
            .sum::<f64>()
            / n;

        Self {
            mean_saturation: sat_sum / n,
            hue_variance,
        }
    }

    /// Pick a strategy for this profile.
    #[must_use]
    pub fn choose(&self, thresholds: &SelectorThresholds) -> StrategyKind {
        if self.mean_saturation > thresholds.color_saturation
            && self.hue_variance > thresholds.hue_variance
        {
            StrategyKind::ColorSegmentation
        } else if self.mean_saturation < thresholds.gray_saturation {
            StrategyKind::EdgeDetection
        } else {
            StrategyKind::Hybrid
        }
    }
}

/// Choose a detection strategy for `image`, returning the measured
/// profile alongside the choice.
#[must_use]
pub fn select_strategy(
    image: &RgbImage,
    thresholds: &SelectorThresholds,
) -> (StrategyKind, ColorProfile) {
    let profile = ColorProfile::of(&to_hsv(image));
    let kind = profile.choose(thresholds);
    tracing::debug!(
        mean_saturation = profile.mean_saturation,
        hue_variance = profile.hue_variance,
        strategy = %kind,
        "selected detection strategy",
    );
    (kind, profile)
}
