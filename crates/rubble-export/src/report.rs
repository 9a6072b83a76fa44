//! Plain-text reports for one record or a batch of records.

use std::fmt::Write;

use rubble_pipeline::AnalysisResult;

use crate::csv::ScaleRatio;

/// Area ratio above which the size distribution counts as highly uneven.
pub const HIGH_HETEROGENEITY_RATIO: f64 = 15.0;

/// Area ratio above which the size distribution counts as moderately uneven.
pub const MODERATE_HETEROGENEITY_RATIO: f64 = 8.0;

/// Units used when printing measurements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Units {
    /// Raw pixel measurements.
    Pixels,
    /// Millimeters via a linear scale ratio.
    Millimeters(ScaleRatio),
}

impl Units {
    fn length(self, px: f64) -> f64 {
        match self {
            Self::Pixels => px,
            Self::Millimeters(scale) => scale.length_mm(px),
        }
    }

    fn area(self, px: f64) -> f64 {
        match self {
            Self::Pixels => px,
            Self::Millimeters(scale) => scale.area_mm2(px),
        }
    }

    const fn length_suffix(self) -> &'static str {
        match self {
            Self::Pixels => "px",
            Self::Millimeters(_) => "mm",
        }
    }

    const fn area_suffix(self) -> &'static str {
        match self {
            Self::Pixels => "px²",
            Self::Millimeters(_) => "mm²",
        }
    }
}

/// Qualitative label for how dominant the largest particle is.
#[must_use]
pub fn heterogeneity(area_ratio: f64) -> &'static str {
    if area_ratio > HIGH_HETEROGENEITY_RATIO {
        "high"
    } else if area_ratio > MODERATE_HETEROGENEITY_RATIO {
        "moderate"
    } else {
        "low"
    }
}

/// Render a human-readable report of one analysis record.
#[must_use = "returns the report text"]
pub fn text_report(record: &AnalysisResult, units: Units) -> String {
    let l = units.length_suffix();
    let a = units.area_suffix();
    let mut out = String::new();

    let _ = writeln!(out, "Particle Analysis Report");
    let _ = writeln!(out, "{}", "=".repeat(60));
    if let Some(ref path) = record.image_path {
        let _ = writeln!(out, "{:<28} {path}", "Image:");
    }
    let _ = writeln!(out, "{:<28} {}", "Timestamp:", record.timestamp.to_rfc3339());
    let _ = writeln!(
        out,
        "{:<28} {} (confidence {:.2})",
        "Algorithm:", record.algorithm_used, record.confidence,
    );
    let _ = writeln!(
        out,
        "{:<28} {:.3}s",
        "Processing time:", record.processing_time_seconds,
    );
    if let Some(ref error) = record.error {
        let _ = writeln!(out, "{:<28} {error}", "Error:");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{:<28} {}", "Particles:", record.contour_count);
    let _ = writeln!(
        out,
        "{:<28} {:.2} {a}",
        "Total area:",
        units.area(record.total_area),
    );
    let _ = writeln!(
        out,
        "{:<28} {:.2} {a} (perimeter {:.2} {l})",
        "Largest particle:",
        units.area(record.largest_area),
        units.length(record.largest_perimeter),
    );
    if let Some(ref shape) = record.largest_shape {
        let _ = writeln!(
            out,
            "{:<28} {:.2} {l}",
            "  Equivalent diameter:",
            units.length(shape.equivalent_diameter),
        );
    }
    let _ = writeln!(
        out,
        "{:<28} {:.2} {a} (perimeter {:.2} {l})",
        "Second particle:",
        units.area(record.second_largest_area),
        units.length(record.second_largest_perimeter),
    );
    if let Some(ref shape) = record.second_shape {
        let _ = writeln!(
            out,
            "{:<28} {:.2} {l}",
            "  Equivalent diameter:",
            units.length(shape.equivalent_diameter),
        );
    }
    let _ = writeln!(out, "{:<28} {:.2}%", "Largest area ratio:", record.area_ratio);
    let _ = writeln!(
        out,
        "{:<28} {:.2}%",
        "Second area ratio:",
        record.second_area_ratio(),
    );
    let _ = writeln!(
        out,
        "{:<28} {}",
        "Heterogeneity:",
        heterogeneity(record.area_ratio),
    );

    let stats = &record.area_statistics;
    if stats.count > 0 {
        let _ = writeln!(
            out,
            "{:<28} mean {:.2}, median {:.2}, std dev {:.2} {a}",
            "Area distribution:",
            units.area(stats.mean),
            units.area(stats.median),
            units.area(stats.std_dev),
        );
        let _ = writeln!(
            out,
            "{:<28} {:.1}%",
            "Area variation (CV):",
            stats.coefficient_of_variation() * 100.0,
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<28} {:.0}%",
        "Crushing efficiency:", record.assessment.crushing_efficiency,
    );
    let _ = writeln!(out, "{:<28} {}", "Equipment status:", record.assessment.status);
    let _ = writeln!(
        out,
        "{:<28} {}",
        "Recommendation:", record.assessment.recommendation,
    );
    let _ = write!(out, "{}", "=".repeat(60));
    out
}

/// Aggregate over a batch of records.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary<'a> {
    records: &'a [AnalysisResult],
}

impl<'a> BatchSummary<'a> {
    /// Summarize `records` in the order they were analyzed.
    #[must_use]
    pub const fn new(records: &'a [AnalysisResult]) -> Self {
        Self { records }
    }

    /// Number of files in the batch.
    #[must_use]
    pub const fn files(&self) -> usize {
        self.records.len()
    }

    /// Mean particle count per file, 0 for an empty batch.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_contour_count(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let total: usize = self.records.iter().map(|r| r.contour_count).sum();
        total as f64 / self.records.len() as f64
    }

    /// Mean largest-particle area per file, 0 for an empty batch.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_largest_area(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let total: f64 = self.records.iter().map(|r| r.largest_area).sum();
        total / self.records.len() as f64
    }

    /// The record holding the single largest particle of the batch.
    ///
    /// Ties go to the earliest record.
    #[must_use]
    pub fn largest_particle(&self) -> Option<&'a AnalysisResult> {
        self.records.iter().fold(None, |best, r| match best {
            Some(b) if b.largest_area >= r.largest_area => Some(b),
            _ => Some(r),
        })
    }

    /// Render the summary with one line per file.
    #[must_use = "returns the summary text"]
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Batch Summary");
        let _ = writeln!(out, "{}", "=".repeat(60));
        let _ = writeln!(out, "{:<28} {}", "Files:", self.files());
        let _ = writeln!(
            out,
            "{:<28} {:.1}",
            "Mean particle count:",
            self.mean_contour_count(),
        );
        let _ = writeln!(
            out,
            "{:<28} {:.2} px²",
            "Mean largest area:",
            self.mean_largest_area(),
        );
        if let Some(best) = self.largest_particle() {
            let _ = writeln!(
                out,
                "{:<28} {} ({:.2} px²)",
                "Largest particle in:",
                display_name(best),
                best.largest_area,
            );
        }
        let _ = writeln!(out, "{}", "-".repeat(60));
        let _ = writeln!(
            out,
            "{:<30} {:>8} {:>12} {:>7}",
            "File", "Count", "Largest", "Ratio"
        );
        for r in self.records {
            let _ = writeln!(
                out,
                "{:<30} {:>8} {:>12.2} {:>6.2}%",
                display_name(r),
                r.contour_count,
                r.largest_area,
                r.area_ratio,
            );
        }
        let _ = write!(out, "{}", "=".repeat(60));
        out
    }
}

fn display_name(record: &AnalysisResult) -> &str {
    record.image_path.as_deref().unwrap_or("<unnamed>")
}
