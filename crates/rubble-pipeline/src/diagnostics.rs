//! Analysis diagnostics: timing, counts, and other metrics for each stage.
//!
//! Every call to [`analyze_staged`](crate::analyze_staged) collects
//! diagnostics alongside the result. Time is read through the [`Clock`]
//! trait, so the pipeline itself never touches a system clock and tests
//! can drive it with a fixed one.
//!
//! Durations travel through JSON as fractional seconds.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::strategy::StrategyKind;

/// Source of time for a run.
pub trait Clock {
    /// Opaque monotonic instant.
    type Instant;

    /// Current monotonic instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;

    /// Current wall-clock time, stamped onto analysis records.
    fn wall_time(&self) -> DateTime<Utc>;
}

/// `Duration` as an `f64` number of seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "stage duration must be a non-negative number of seconds",
            )
        })
    }
}

/// Per-stage timings and metrics for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDiagnostics {
    /// Automatic strategy selection (only when the strategy is `auto`).
    pub selection: Option<StageDiagnostics>,
    /// Particle detection by the chosen strategy.
    pub detection: StageDiagnostics,
    /// Area filtering and ranking.
    pub ranking: StageDiagnostics,
    /// Shape descriptors, statistics, and the health heuristic.
    pub statistics: StageDiagnostics,
    /// Whole run, selection through record assembly.
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Analyzed image width.
    pub image_width: u32,
    /// Analyzed image height.
    pub image_height: u32,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Time spent in the stage.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Strategy selection metrics.
    Selection {
        /// Mean HSV saturation.
        mean_saturation: f64,
        /// HSV hue variance.
        hue_variance: f64,
        /// Strategy chosen.
        chosen: StrategyKind,
    },
    /// Detection metrics.
    Detection {
        /// Strategy that ran.
        strategy: StrategyKind,
        /// Contours that passed the area filter.
        contour_count: usize,
        /// Strategy confidence.
        confidence: f64,
        /// Foreground pixels in the final mask.
        foreground_pixels: u64,
        /// Total pixels in the final mask.
        total_pixels: u64,
    },
    /// Ranking metrics.
    Ranking {
        /// Contours retained.
        retained: usize,
        /// Sum of retained areas.
        total_area: f64,
        /// Largest area as a percentage of the total.
        area_ratio: f64,
        /// Rank index of the second contour.
        second_index: Option<usize>,
    },
    /// Statistics metrics.
    Statistics {
        /// Mean particle area.
        mean_area: f64,
        /// Population standard deviation of particle areas.
        std_dev: f64,
    },
}

impl AnalysisDiagnostics {
    /// Stages that ran, in execution order, with their display names.
    pub fn stages(&self) -> impl Iterator<Item = (&'static str, &StageDiagnostics)> + '_ {
        self.selection
            .iter()
            .map(|s| ("Selection", s))
            .chain([
                ("Detection", &self.detection),
                ("Ranking", &self.ranking),
                ("Statistics", &self.statistics),
            ])
    }

    /// Human-readable timing table, one row per stage.
    #[must_use]
    pub fn report(&self) -> String {
        let total_ms = millis(self.total_duration);
        let mut lines = vec![
            format!("Analysis Diagnostics Report\n{}", "=".repeat(60)),
            format!(
                "Image: {}x{}   total {total_ms:.3}ms",
                self.image_width, self.image_height
            ),
            String::new(),
            format!("{:<12} {:>11} {:>7}  {}", "Stage", "Time", "Share", "Metrics"),
            "-".repeat(72),
        ];

        for (name, stage) in self.stages() {
            let ms = millis(stage.duration);
            let share = if total_ms > 0.0 { ms / total_ms * 100.0 } else { 0.0 };
            lines.push(format!(
                "{name:<12} {ms:>9.3}ms {share:>6.1}%  {}",
                describe(&stage.metrics),
            ));
        }

        lines.join("\n")
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// One-line summary of a stage's metrics.
fn describe(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Selection {
            mean_saturation,
            hue_variance,
            chosen,
        } => format!("sat={mean_saturation:.1} hue_var={hue_variance:.1} -> {chosen}"),
        StageMetrics::Detection {
            strategy,
            contour_count,
            confidence,
            foreground_pixels,
            total_pixels,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let coverage = if *total_pixels > 0 {
                *foreground_pixels as f64 / *total_pixels as f64 * 100.0
            } else {
                0.0
            };
            format!(
                "{strategy}: {contour_count} contours, confidence={confidence:.2}, mask {coverage:.1}%",
            )
        }
        StageMetrics::Ranking {
            retained,
            total_area,
            area_ratio,
            second_index,
        } => {
            let second = second_index.map_or_else(|| "-".to_owned(), |i| format!("#{}", i + 1));
            format!("{retained} kept, total={total_area:.1}px², largest={area_ratio:.1}%, second={second}")
        }
        StageMetrics::Statistics { mean_area, std_dev } => {
            format!("mean={mean_area:.1}px² std={std_dev:.1}px²")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> AnalysisDiagnostics {
        AnalysisDiagnostics {
            selection: None,
            detection: StageDiagnostics {
                duration: Duration::from_millis(8),
                metrics: StageMetrics::Detection {
                    strategy: StrategyKind::EdgeDetection,
                    contour_count: 2,
                    confidence: 0.1,
                    foreground_pixels: 2250,
                    total_pixels: 240_000,
                },
            },
            ranking: StageDiagnostics {
                duration: Duration::from_millis(1),
                metrics: StageMetrics::Ranking {
                    retained: 2,
                    total_area: 2250.0,
                    area_ratio: 80.0,
                    second_index: Some(1),
                },
            },
            statistics: StageDiagnostics {
                duration: Duration::from_millis(1),
                metrics: StageMetrics::Statistics {
                    mean_area: 1125.0,
                    std_dev: 675.0,
                },
            },
            total_duration: Duration::from_millis(10),
            image_width: 600,
            image_height: 400,
        }
    }

    #[test]
    fn stages_skip_missing_selection() {
        let names: Vec<&str> = sample().stages().map(|(name, _)| name).collect();
        assert_eq!(names, ["Detection", "Ranking", "Statistics"]);
    }

    #[test]
    fn detection_reports_mask_coverage() {
        let line = describe(&sample().detection.metrics);
        assert_eq!(line, "edge_detection: 2 contours, confidence=0.10, mask 0.9%");
    }

    #[test]
    fn report_lists_every_stage() {
        let report = sample().report();
        assert!(report.contains("Analysis Diagnostics Report"));
        assert!(report.contains("Image: 600x400   total 10.000ms"));
        assert!(report.contains("edge_detection: 2 contours"));
        assert!(report.contains("second=#2"));
        assert!(!report.contains("Selection"));
    }

    #[test]
    fn serde_round_trip() {
        let diag = sample();
        let json = serde_json::to_string(&diag).unwrap();
        let back: AnalysisDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.image_width, 600);
        assert_eq!(back.detection.metrics, diag.detection.metrics);
        assert!((back.total_duration.as_secs_f64() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["total_duration"] = serde_json::json!(-1.0);
        assert!(serde_json::from_value::<AnalysisDiagnostics>(json).is_err());
    }
}
