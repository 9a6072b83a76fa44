//! Pure contour analysis pipeline for photographs of crushed stone.
//!
//! Turns a color or grayscale image into ranked particle outlines with
//! area, perimeter, and shape statistics, and estimates crusher health
//! from the size distribution. No I/O: callers hand in decoded images
//! (or raw bytes) and a [`Clock`](diagnostics::Clock), and get back an
//! [`AnalysisResult`].
//!
//! # Example
//!
//! ```no_run
//! # use rubble_pipeline::{AnalysisConfig, PipelineError, diagnostics::Clock};
//! # fn run<C: Clock>(bytes: &[u8], clock: &C) -> Result<(), PipelineError> {
//! let image = rubble_pipeline::decode_image(bytes)?;
//! let record = rubble_pipeline::analyze(&image, &AnalysisConfig::default(), clock)?;
//! println!("{} particles, largest {:.1}px²", record.contour_count, record.largest_area);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod blur;
pub mod color;
pub mod config;
pub mod contour;
pub mod dedup;
pub mod diagnostics;
pub mod edge;
pub mod grayscale;
pub mod history;
pub mod maintenance;
pub mod morphology;
pub mod preprocess;
pub mod rank;
pub mod record;
pub mod selector;
pub mod shape;
pub mod stats;
pub mod strategy;
pub mod threshold;
pub mod types;

pub use analysis::{AnalysisOutcome, analyze, analyze_bytes, analyze_staged, overview};
pub use color::HsvRange;
pub use config::{AlgorithmChoice, AnalysisConfig};
pub use contour::{BorderKind, ContourSet, RetrievalMode, TracedContour, find_contours};
pub use dedup::SimilarityCriteria;
pub use grayscale::{MIN_IMAGE_SIDE, decode_image};
pub use history::History;
pub use maintenance::{Assessment, EquipmentStatus, MaintenanceRules, assess};
pub use preprocess::{Preprocessed, preprocess};
pub use rank::{ContourRecord, RankedContour, RankedResult, SecondRank, filter_and_rank};
pub use record::AnalysisResult;
pub use selector::{SelectorThresholds, select_strategy};
pub use shape::ShapeDescriptors;
pub use stats::AreaStatistics;
pub use strategy::{Detection, Strategy, StrategyKind};
pub use threshold::ThresholdMode;
pub use types::*;
