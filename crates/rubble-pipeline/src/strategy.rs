//! Particle detection strategies.
//!
//! This module defines the [`Strategy`] trait for pluggable detection
//! algorithms and the [`StrategyKind`] enum for selecting which one to
//! run.
//!
//! # Strategy pattern
//!
//! Each strategy turns a source image into a filtered set of particle
//! outlines plus a confidence score in `[0, 1]`. The enum dispatches to
//! the implementation, so selection stays a plain value that can be
//! serialized into records and chosen automatically by
//! [`select_strategy`](crate::selector::select_strategy).

use std::fmt;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::color::{range_mask, to_hsv};
use crate::config::AnalysisConfig;
use crate::contour::{RetrievalMode, find_contours};
use crate::dedup::merge_contours;
use crate::morphology::{close, fill_holes, open};
use crate::preprocess::preprocess;
use crate::rank::filter_by_area;
use crate::threshold::count_foreground;
use crate::types::{Contour, PipelineError};

/// Contour count at which edge detection reports full confidence.
pub const EDGE_FULL_CONFIDENCE_COUNT: usize = 20;

/// Foreground fraction multiplier for color confidence: a mask covering
/// a tenth of the image reports full confidence.
pub const COLOR_CONFIDENCE_GAIN: f64 = 10.0;

/// Selects which detection algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Canny edges, morphological cleanup, external contours.
    #[default]
    EdgeDetection,
    /// HSV range masking for red and blue particles.
    ColorSegmentation,
    /// Both of the above, merged when the more confident one finds
    /// fewer than two particles.
    Hybrid,
}

impl StrategyKind {
    /// Stable snake-case name, matching the serialized form.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::EdgeDetection => "edge_detection",
            Self::ColorSegmentation => "color_segmentation",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// What a strategy found.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Particle outlines that passed the minimum area filter.
    pub contours: Vec<Contour>,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Foreground pixels in the final mask the contours were traced from.
    pub foreground_pixels: u64,
    /// Total pixels in that mask.
    pub total_pixels: u64,
}

/// Trait for particle detection strategies.
pub trait Strategy {
    /// Detect particle outlines in `image`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if a parameter the
    /// strategy depends on is malformed.
    fn analyze(&self, image: &DynamicImage, config: &AnalysisConfig) -> Result<Detection, PipelineError>;
}

impl Strategy for StrategyKind {
    fn analyze(&self, image: &DynamicImage, config: &AnalysisConfig) -> Result<Detection, PipelineError> {
        match *self {
            Self::EdgeDetection => detect_edges(image, config),
            Self::ColorSegmentation => detect_color(image, config),
            Self::Hybrid => detect_hybrid(image, config),
        }
    }
}

/// Edge-detection confidence: saturates at
/// [`EDGE_FULL_CONFIDENCE_COUNT`] contours.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn edge_confidence(contour_count: usize) -> f64 {
    (contour_count as f64 / EDGE_FULL_CONFIDENCE_COUNT as f64).min(1.0)
}

/// Color-segmentation confidence from the mask's foreground fraction.
///
/// Zero when nothing survived filtering, however much of the mask is lit.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn color_confidence(contour_count: usize, foreground: u64, total: u64) -> f64 {
    if contour_count == 0 || total == 0 {
        return 0.0;
    }
    (COLOR_CONFIDENCE_GAIN * foreground as f64 / total as f64).min(1.0)
}

/// Canny, close, fill enclosed regions, open, external contours, filter.
///
/// The opening runs on filled silhouettes, never on bare outlines.
fn detect_edges(image: &DynamicImage, config: &AnalysisConfig) -> Result<Detection, PipelineError> {
    if config.canny_low >= config.canny_high {
        return Err(PipelineError::InvalidConfig(format!(
            "canny_low ({}) must be less than canny_high ({})",
            config.canny_low, config.canny_high,
        )));
    }

    let pre = preprocess(image, config);
    let closed = close(&pre.edges, config.morphology_kernel);
    let filled = fill_holes(&closed);
    let mask = open(&filled, config.morphology_kernel);

    let traced = find_contours(&mask, RetrievalMode::ExternalOnly).into_contours();
    let contours = filter_by_area(traced, config.min_area());
    let confidence = edge_confidence(contours.len());

    Ok(Detection {
        confidence,
        foreground_pixels: count_foreground(&mask),
        total_pixels: u64::from(mask.width()) * u64::from(mask.height()),
        contours,
    })
}

/// HSV range mask, close, open, external contours, filter.
fn detect_color(image: &DynamicImage, config: &AnalysisConfig) -> Result<Detection, PipelineError> {
    for range in config.hsv_ranges() {
        range.validate()?;
    }

    let hsv = to_hsv(&image.to_rgb8());
    let raw = range_mask(&hsv, config.hsv_ranges());
    let closed = close(&raw, config.color_morphology_kernel);
    let mask = open(&closed, config.color_morphology_kernel);

    let traced = find_contours(&mask, RetrievalMode::ExternalOnly).into_contours();
    let contours = filter_by_area(traced, config.min_area());

    let foreground_pixels = count_foreground(&mask);
    let total_pixels = u64::from(mask.width()) * u64::from(mask.height());
    let confidence = color_confidence(contours.len(), foreground_pixels, total_pixels);

    Ok(Detection {
        contours,
        confidence,
        foreground_pixels,
        total_pixels,
    })
}

/// Run both strategies and keep the more confident one, topping it up
/// from the other when it found fewer than two particles.
///
/// Ties go to edge detection.
fn detect_hybrid(image: &DynamicImage, config: &AnalysisConfig) -> Result<Detection, PipelineError> {
    let edge = detect_edges(image, config)?;
    let color = detect_color(image, config)?;

    let (primary, secondary, primary_kind) = if color.confidence > edge.confidence {
        (color, edge, StrategyKind::ColorSegmentation)
    } else {
        (edge, color, StrategyKind::EdgeDetection)
    };

    if primary.contours.len() >= 2 {
        tracing::debug!(
            primary = %primary_kind,
            confidence = primary.confidence,
            contours = primary.contours.len(),
            "hybrid kept primary detection",
        );
        return Ok(primary);
    }

    let primary_count = primary.contours.len();
    let secondary_count = secondary.contours.len();
    let merged = merge_contours(primary.contours, secondary.contours, &config.similarity);
    let contours = filter_by_area(merged, config.min_area());
    tracing::debug!(
        primary = %primary_kind,
        primary_count,
        secondary_count,
        merged_count = contours.len(),
        "hybrid merged detections",
    );

    Ok(Detection {
        contours,
        confidence: primary.confidence,
        foreground_pixels: primary.foreground_pixels,
        total_pixels: primary.total_pixels,
    })
}
