//! Analysis configuration.
//!
//! A configuration is created once (defaults, a JSON document, or CLI
//! flags) and consumed read-only by every run. Missing JSON fields take
//! their defaults, so saved configurations survive new fields.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::HsvRange;
use crate::dedup::SimilarityCriteria;
use crate::maintenance::MaintenanceRules;
use crate::rank::SecondRank;
use crate::selector::SelectorThresholds;
use crate::strategy::StrategyKind;
use crate::threshold::ThresholdMode;
use crate::types::PipelineError;

/// Which detection strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmChoice {
    /// Pick from the image's color profile.
    #[default]
    Auto,
    /// Always use Canny edge detection.
    EdgeDetection,
    /// Always use HSV color segmentation.
    ColorSegmentation,
    /// Always run both and merge.
    Hybrid,
}

impl AlgorithmChoice {
    /// The fixed strategy, or `None` for [`Self::Auto`].
    #[must_use]
    pub const fn fixed(self) -> Option<StrategyKind> {
        match self {
            Self::Auto => None,
            Self::EdgeDetection => Some(StrategyKind::EdgeDetection),
            Self::ColorSegmentation => Some(StrategyKind::ColorSegmentation),
            Self::Hybrid => Some(StrategyKind::Hybrid),
        }
    }
}

impl fmt::Display for AlgorithmChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fixed() {
            None => f.pad("auto"),
            Some(kind) => fmt::Display::fmt(&kind, f),
        }
    }
}

/// Parameters for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Contours with area at or below this many square pixels are dropped.
    pub min_contour_area: u32,

    /// Gaussian blur kernel size. Even sizes round up to the next odd
    /// size; 0 or 1 disables blurring.
    pub blur_kernel: u32,

    /// Canny hysteresis low threshold.
    pub canny_low: u8,

    /// Canny hysteresis high threshold. Must exceed `canny_low`.
    pub canny_high: u8,

    /// Side of the square structuring element for edge-mask cleanup. Even
    /// sizes round up to the next odd size; 1 disables cleanup and 0 is
    /// rejected.
    pub morphology_kernel: u32,

    /// Side of the square structuring element for color-mask cleanup. Even
    /// sizes round up to the next odd size; 1 disables cleanup and 0 is
    /// rejected.
    pub color_morphology_kernel: u32,

    /// Detection strategy.
    pub strategy: AlgorithmChoice,

    /// How the binary threshold for the overview pass is chosen.
    pub threshold: ThresholdMode,

    /// Which ranked contour is reported as the second particle.
    pub second_rank: SecondRank,

    /// HSV sub-ranges recognized as red particles.
    pub red_hsv_ranges: Vec<HsvRange>,

    /// HSV sub-ranges recognized as blue particles.
    pub blue_hsv_ranges: Vec<HsvRange>,

    /// When contours from different detectors are the same particle.
    pub similarity: SimilarityCriteria,

    /// Automatic strategy selection thresholds.
    pub selector: SelectorThresholds,

    /// Crusher health heuristic thresholds.
    pub maintenance: MaintenanceRules,
}

impl AnalysisConfig {
    /// Default minimum contour area in square pixels.
    pub const DEFAULT_MIN_CONTOUR_AREA: u32 = 50;
    /// Default blur kernel size.
    pub const DEFAULT_BLUR_KERNEL: u32 = 5;
    /// Default Canny low threshold.
    pub const DEFAULT_CANNY_LOW: u8 = 50;
    /// Default Canny high threshold.
    pub const DEFAULT_CANNY_HIGH: u8 = 150;
    /// Default edge-mask structuring element side.
    pub const DEFAULT_MORPHOLOGY_KERNEL: u32 = 3;
    /// Default color-mask structuring element side.
    pub const DEFAULT_COLOR_MORPHOLOGY_KERNEL: u32 = 5;

    /// Default red ranges: both ends of the hue circle.
    #[must_use]
    pub fn default_red_ranges() -> Vec<HsvRange> {
        vec![
            HsvRange::new([0, 30, 30], [15, 255, 255]),
            HsvRange::new([165, 30, 30], [180, 255, 255]),
        ]
    }

    /// Default blue range.
    #[must_use]
    pub fn default_blue_ranges() -> Vec<HsvRange> {
        vec![HsvRange::new([90, 30, 30], [140, 255, 255])]
    }

    /// All configured HSV ranges, red first.
    pub fn hsv_ranges(&self) -> impl Iterator<Item = &HsvRange> + '_ {
        self.red_hsv_ranges.iter().chain(&self.blue_hsv_ranges)
    }

    /// Minimum contour area as `f64`.
    #[must_use]
    pub fn min_area(&self) -> f64 {
        f64::from(self.min_contour_area)
    }

    /// Check that every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] describing the first
    /// invalid parameter.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.canny_low >= self.canny_high {
            return Err(PipelineError::InvalidConfig(format!(
                "canny_low ({}) must be less than canny_high ({})",
                self.canny_low, self.canny_high,
            )));
        }
        if self.morphology_kernel == 0 {
            return Err(PipelineError::InvalidConfig(
                "morphology_kernel must be at least 1".to_owned(),
            ));
        }
        if self.color_morphology_kernel == 0 {
            return Err(PipelineError::InvalidConfig(
                "color_morphology_kernel must be at least 1".to_owned(),
            ));
        }
        for range in self.hsv_ranges() {
            range.validate()?;
        }
        self.similarity.validate()?;
        self.maintenance.validate()?;
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_contour_area: Self::DEFAULT_MIN_CONTOUR_AREA,
            blur_kernel: Self::DEFAULT_BLUR_KERNEL,
            canny_low: Self::DEFAULT_CANNY_LOW,
            canny_high: Self::DEFAULT_CANNY_HIGH,
            morphology_kernel: Self::DEFAULT_MORPHOLOGY_KERNEL,
            color_morphology_kernel: Self::DEFAULT_COLOR_MORPHOLOGY_KERNEL,
            strategy: AlgorithmChoice::default(),
            threshold: ThresholdMode::default(),
            second_rank: SecondRank::default(),
            red_hsv_ranges: Self::default_red_ranges(),
            blue_hsv_ranges: Self::default_blue_ranges(),
            similarity: SimilarityCriteria::default(),
            selector: SelectorThresholds::default(),
            maintenance: MaintenanceRules::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_contour_area, 50);
        assert_eq!(config.blur_kernel, 5);
        assert_eq!((config.canny_low, config.canny_high), (50, 150));
        assert_eq!(config.morphology_kernel, 3);
        assert_eq!(config.strategy, AlgorithmChoice::Auto);
        assert_eq!(config.red_hsv_ranges.len(), 2);
        assert_eq!(config.blue_hsv_ranges.len(), 1);
    }

    #[test]
    fn crossed_canny_thresholds_are_invalid() {
        let config = AnalysisConfig {
            canny_low: 150,
            canny_high: 150,
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn zero_morphology_kernel_is_invalid() {
        let config = AnalysisConfig {
            morphology_kernel: 0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_hsv_range_is_invalid() {
        let config = AnalysisConfig {
            blue_hsv_ranges: vec![HsvRange::new([140, 30, 30], [90, 255, 255])],
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn serde_round_trip() {
        let config = AnalysisConfig {
            strategy: AlgorithmChoice::Hybrid,
            threshold: ThresholdMode::Otsu,
            second_rank: SecondRank::Adjacent,
            ..AnalysisConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"min_contour_area": 120, "strategy": "edge_detection"}"#)
                .unwrap();
        assert_eq!(config.min_contour_area, 120);
        assert_eq!(config.strategy, AlgorithmChoice::EdgeDetection);
        assert_eq!(config.canny_high, AnalysisConfig::DEFAULT_CANNY_HIGH);
        assert_eq!(config.blue_hsv_ranges, AnalysisConfig::default_blue_ranges());
    }

    #[test]
    fn hsv_ranges_json_shape() {
        let json = serde_json::to_value(HsvRange::new([90, 30, 30], [140, 255, 255])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"lower": [90, 30, 30], "upper": [140, 255, 255]})
        );
    }

    #[test]
    fn algorithm_choice_display() {
        assert_eq!(AlgorithmChoice::Auto.to_string(), "auto");
        assert_eq!(AlgorithmChoice::Hybrid.to_string(), "hybrid");
    }
}
