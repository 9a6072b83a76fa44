//! The analysis service: strategy resolution, detection, ranking, and
//! record assembly.
//!
//! Invalid input is rejected up front. Once the stages start, a failure
//! never escapes: it is logged and turned into a zero-valued record
//! tagged with the strategy that was attempted and the time spent.

use image::DynamicImage;

use crate::config::AnalysisConfig;
use crate::contour::{ContourSet, RetrievalMode, find_contours};
use crate::diagnostics::{AnalysisDiagnostics, Clock, StageDiagnostics, StageMetrics};
use crate::grayscale::{check_size, decode_image};
use crate::preprocess::preprocess;
use crate::rank::{RankedResult, filter_and_rank};
use crate::record::AnalysisResult;
use crate::selector::select_strategy;
use crate::stats::AreaStatistics;
use crate::strategy::{Strategy, StrategyKind};
use crate::types::PipelineError;

/// Everything produced by [`analyze_staged`].
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// The terminal record.
    pub record: AnalysisResult,
    /// Ranked particle contours (empty when a stage failed).
    pub ranked: RankedResult,
    /// Full-hierarchy contours of the binary threshold mask, for drawing.
    pub overview: ContourSet,
    /// Per-stage diagnostics (`None` when a stage failed).
    pub diagnostics: Option<AnalysisDiagnostics>,
}

/// Analyze an image and return its record.
///
/// # Errors
///
/// Returns [`PipelineError::ImageTooSmall`] for images below the minimum
/// size. Failures after that point produce a zero-valued record instead.
pub fn analyze<C: Clock>(
    image: &DynamicImage,
    config: &AnalysisConfig,
    clock: &C,
) -> Result<AnalysisResult, PipelineError> {
    analyze_staged(image, config, clock).map(|outcome| outcome.record)
}

/// Decode image bytes and analyze them.
///
/// # Errors
///
/// Returns the [`decode_image`] errors for empty, corrupt, or undersized
/// input.
pub fn analyze_bytes<C: Clock>(
    bytes: &[u8],
    config: &AnalysisConfig,
    clock: &C,
) -> Result<AnalysisOutcome, PipelineError> {
    let image = decode_image(bytes)?;
    analyze_staged(&image, config, clock)
}

/// Analyze an image, keeping the ranked contours, the threshold overview,
/// and per-stage diagnostics alongside the record.
///
/// # Errors
///
/// Returns [`PipelineError::ImageTooSmall`] for images below the minimum
/// size.
pub fn analyze_staged<C: Clock>(
    image: &DynamicImage,
    config: &AnalysisConfig,
    clock: &C,
) -> Result<AnalysisOutcome, PipelineError> {
    check_size(image)?;

    let start = clock.now();
    let (kind, selection) = resolve_strategy(image, config, clock);
    let overview = overview(image, config);

    let outcome = match run_stages(image, config, clock, kind) {
        Ok((ranked, confidence, detection, ranking, statistics)) => {
            let total_duration = clock.elapsed(&start);
            let mut record = AnalysisResult::from_ranked(
                &ranked,
                kind,
                confidence,
                &config.maintenance,
                clock.wall_time(),
            );
            record.processing_time_seconds = total_duration.as_secs_f64();
            tracing::info!(
                strategy = %kind,
                contours = record.contour_count,
                area_ratio = record.area_ratio,
                seconds = record.processing_time_seconds,
                "analysis complete",
            );
            AnalysisOutcome {
                record,
                ranked,
                overview,
                diagnostics: Some(AnalysisDiagnostics {
                    selection,
                    detection,
                    ranking,
                    statistics,
                    total_duration,
                    image_width: image.width(),
                    image_height: image.height(),
                }),
            }
        }
        Err(e) => {
            tracing::warn!(strategy = %kind, error = %e, "analysis stage failed");
            let mut record = AnalysisResult::empty(kind, clock.wall_time());
            record.processing_time_seconds = clock.elapsed(&start).as_secs_f64();
            record.error = Some(e.to_string());
            AnalysisOutcome {
                record,
                ranked: RankedResult::default(),
                overview,
                diagnostics: None,
            }
        }
    };
    Ok(outcome)
}

/// Full-hierarchy contours of the binary threshold mask.
///
/// This population is never area-filtered; it exists for drawing.
#[must_use = "returns the overview contours"]
pub fn overview(image: &DynamicImage, config: &AnalysisConfig) -> ContourSet {
    let pre = preprocess(image, config);
    find_contours(&pre.binary, RetrievalMode::FullHierarchy)
}

/// Resolve `auto` to a concrete strategy, timing the selection.
fn resolve_strategy<C: Clock>(
    image: &DynamicImage,
    config: &AnalysisConfig,
    clock: &C,
) -> (StrategyKind, Option<StageDiagnostics>) {
    if let Some(kind) = config.strategy.fixed() {
        return (kind, None);
    }

    let t = clock.now();
    let (kind, profile) = select_strategy(&image.to_rgb8(), &config.selector);
    let diag = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Selection {
            mean_saturation: profile.mean_saturation,
            hue_variance: profile.hue_variance,
            chosen: kind,
        },
    };
    (kind, Some(diag))
}

/// Stage outputs: ranked contours, confidence, and per-stage diagnostics.
type StageOutputs = (RankedResult, f64, StageDiagnostics, StageDiagnostics, StageDiagnostics);

/// Validate, detect, rank, and measure.
fn run_stages<C: Clock>(
    image: &DynamicImage,
    config: &AnalysisConfig,
    clock: &C,
    kind: StrategyKind,
) -> Result<StageOutputs, PipelineError> {
    config.validate()?;

    let t = clock.now();
    let detection = kind.analyze(image, config)?;
    let detection_diag = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Detection {
            strategy: kind,
            contour_count: detection.contours.len(),
            confidence: detection.confidence,
            foreground_pixels: detection.foreground_pixels,
            total_pixels: detection.total_pixels,
        },
    };
    let confidence = detection.confidence;

    let t = clock.now();
    let ranked = filter_and_rank(detection.contours, config.min_area(), config.second_rank);
    let ranking_diag = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Ranking {
            retained: ranked.count(),
            total_area: ranked.total_area(),
            area_ratio: ranked.area_ratio(),
            second_index: ranked.second_index(),
        },
    };

    let t = clock.now();
    let stats = AreaStatistics::from_areas(&ranked.areas());
    let statistics_diag = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Statistics {
            mean_area: stats.mean,
            std_dev: stats.std_dev,
        },
    };

    Ok((ranked, confidence, detection_diag, ranking_diag, statistics_diag))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::{DateTime, TimeZone, Utc};
    use image::{GrayImage, RgbImage};

    use super::*;
    use crate::config::AlgorithmChoice;
    use crate::maintenance::EquipmentStatus;

    /// Clock that advances one millisecond per reading.
    struct StepClock(std::cell::Cell<u64>);

    impl StepClock {
        fn new() -> Self {
            Self(std::cell::Cell::new(0))
        }
    }

    impl Clock for StepClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }

        fn wall_time(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
        }
    }

    fn gray_particles() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(120, 100, |x, y| {
            let (px, py) = (f64::from(x), f64::from(y));
            let a = (px - 30.0).powi(2) + (py - 30.0).powi(2) <= 144.0;
            let b = (px - 85.0).powi(2) + (py - 60.0).powi(2) <= 64.0;
            if a || b {
                image::Rgb([220, 220, 220])
            } else {
                image::Rgb([40, 40, 40])
            }
        }))
    }

    #[test]
    fn undersized_image_is_invalid_input() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(40, 400));
        let result = analyze(&img, &AnalysisConfig::default(), &StepClock::new());
        assert!(matches!(result, Err(PipelineError::ImageTooSmall { .. })));
    }

    #[test]
    fn auto_picks_edge_detection_for_gray_image() {
        let outcome =
            analyze_staged(&gray_particles(), &AnalysisConfig::default(), &StepClock::new()).unwrap();
        assert_eq!(outcome.record.algorithm_used, StrategyKind::EdgeDetection);
        assert_eq!(outcome.record.contour_count, 2);
        let diagnostics = outcome.diagnostics.unwrap();
        assert!(diagnostics.selection.is_some());
        assert!(outcome.record.processing_time_seconds > 0.0);
        assert_eq!(
            outcome.record.timestamp,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn auto_selection_diagnostics_match_selector() {
        let img = gray_particles();
        let config = AnalysisConfig::default();
        let (kind, profile) = select_strategy(&img.to_rgb8(), &config.selector);

        let outcome = analyze_staged(&img, &config, &StepClock::new()).unwrap();
        let selection = outcome.diagnostics.unwrap().selection.unwrap();
        assert_eq!(
            selection.metrics,
            StageMetrics::Selection {
                mean_saturation: profile.mean_saturation,
                hue_variance: profile.hue_variance,
                chosen: kind,
            }
        );
        assert_eq!(outcome.record.algorithm_used, kind);
    }

    #[test]
    fn blank_image_is_degenerate_not_error() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(80, 80, image::Luma([100])));
        let config = AnalysisConfig {
            strategy: AlgorithmChoice::EdgeDetection,
            ..AnalysisConfig::default()
        };
        let record = analyze(&img, &config, &StepClock::new()).unwrap();
        assert_eq!(record.contour_count, 0);
        assert!(record.total_area.abs() < f64::EPSILON);
        assert!(record.area_ratio.abs() < f64::EPSILON);
        assert_eq!(record.assessment.status, EquipmentStatus::Abnormal);
        assert!(record.error.is_none());
    }

    #[test]
    fn stage_failure_yields_tagged_zero_record() {
        let config = AnalysisConfig {
            strategy: AlgorithmChoice::ColorSegmentation,
            red_hsv_ranges: vec![crate::color::HsvRange::new([20, 0, 0], [10, 255, 255])],
            ..AnalysisConfig::default()
        };
        let outcome = analyze_staged(&gray_particles(), &config, &StepClock::new()).unwrap();
        assert_eq!(outcome.record.algorithm_used, StrategyKind::ColorSegmentation);
        assert_eq!(outcome.record.contour_count, 0);
        assert!(outcome.record.processing_time_seconds > 0.0);
        assert!(outcome.record.error.is_some());
        assert!(outcome.diagnostics.is_none());
        assert!(outcome.ranked.is_empty());
    }

    #[test]
    fn overview_contains_threshold_population() {
        let outcome =
            analyze_staged(&gray_particles(), &AnalysisConfig::default(), &StepClock::new()).unwrap();
        assert_eq!(outcome.overview.len(), 2);
        assert_eq!(outcome.overview.presentation().count(), 2);
    }

    #[test]
    fn analyze_bytes_rejects_empty_input() {
        let result = analyze_bytes(&[], &AnalysisConfig::default(), &StepClock::new());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }
}
