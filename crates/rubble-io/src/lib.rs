//! rubble-io: Filesystem persistence for rubble.
//!
//! Keeps the current analysis configuration and the bounded analysis
//! history as JSON files in a data directory, and loads and saves raster
//! images with the pipeline's minimum-size check applied on load.
//!
//! There are no durability guarantees: files are written in place with
//! no fsync, atomic rename, or locking.

use std::path::PathBuf;

pub mod raster;
pub mod store;

pub use raster::{load_image, save_image};
pub use store::{CONFIG_FILE, DataStore, HISTORY_FILE};

/// Errors from reading or writing persisted state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or produced.
    #[error("{}: invalid JSON: {source}", path.display())]
    Json {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },

    /// The loaded image was rejected by the pipeline.
    #[error(transparent)]
    Pipeline(#[from] rubble_pipeline::PipelineError),

    /// Image encoding failed.
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}
