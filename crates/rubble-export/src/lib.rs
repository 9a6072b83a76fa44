//! rubble-export: Pure report serializers (sans-IO)
//!
//! Turns analysis records into per-contour CSV, plain-text reports, batch
//! summaries, and annotated overlay images. Nothing here touches the
//! filesystem.

pub mod annotate;
pub mod csv;
pub mod report;

pub use annotate::annotate;
pub use csv::{CSV_HEADER, ScaleRatio, to_csv};
pub use report::{BatchSummary, Units, heterogeneity, text_report};

/// Errors from building export parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExportError {
    /// Pixel-to-millimeter scale is zero, negative, or not finite.
    #[error("scale ratio must be finite and positive, got {0}")]
    InvalidScale(f64),
}
