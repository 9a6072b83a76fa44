//! JSON-backed data directory for configuration and history.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rubble_pipeline::{AnalysisConfig, AnalysisResult, History};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::StoreError;

/// File holding the current [`AnalysisConfig`].
pub const CONFIG_FILE: &str = "config.json";

/// File holding the analysis history as a JSON array.
pub const HISTORY_FILE: &str = "analysis_history.json";

/// A data directory holding `config.json` and `analysis_history.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    /// Open a data directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    /// The data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the configuration file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Path of the history file.
    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.root.join(HISTORY_FILE)
    }

    /// Load the stored configuration, or the defaults if none is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] or [`StoreError::Json`] if the file
    /// exists but cannot be read or parsed.
    pub fn load_config(&self) -> Result<AnalysisConfig, StoreError> {
        Ok(read_json(&self.config_path())?.unwrap_or_default())
    }

    /// Replace the stored configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be written.
    pub fn save_config(&self, config: &AnalysisConfig) -> Result<(), StoreError> {
        write_json(&self.config_path(), config)
    }

    /// Remove the stored configuration so the defaults apply again.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be removed.
    pub fn reset_config(&self) -> Result<(), StoreError> {
        remove_if_present(&self.config_path())
    }

    /// Load the history, or an empty one if none is stored.
    ///
    /// A stored array longer than [`History::CAPACITY`] keeps only its
    /// most recent entries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] or [`StoreError::Json`] if the file
    /// exists but cannot be read or parsed.
    pub fn load_history(&self) -> Result<History, StoreError> {
        Ok(read_json(&self.history_path())?.unwrap_or_default())
    }

    /// Append one record to the stored history and return the new length.
    ///
    /// # Errors
    ///
    /// Returns the [`load_history`](Self::load_history) errors, and
    /// [`StoreError::Io`] if the file cannot be written.
    pub fn append(&self, record: AnalysisResult) -> Result<usize, StoreError> {
        let mut history = self.load_history()?;
        history.push(record);
        write_json(&self.history_path(), &history)?;
        tracing::debug!(entries = history.len(), "history updated");
        Ok(history.len())
    }

    /// Delete the stored history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be removed.
    pub fn clear_history(&self) -> Result<(), StoreError> {
        remove_if_present(&self.history_path())
    }
}

/// Read a JSON document, `Ok(None)` if the file does not exist.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn remove_if_present(path: &Path) -> Result<(), StoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
