use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::autosave::DEFAULT_AUTOSAVE_DELAY;
use crate::error::{NotebookError, Result};
use crate::storage::{FileStorage, SqliteStorage, Storage};

pub const DEFAULT_DATA_DIR: &str = ".notebooks";
pub const CONFIG_FILE: &str = "config.json";

/// Which storage backend holds the notebook records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    File,
    Sqlite,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::File => write!(f, "file"),
            Backend::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for Backend {
    type Err = NotebookError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Backend::File),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(NotebookError::InvalidArgument(format!(
                "unknown backend '{}' (expected file or sqlite)",
                other
            ))),
        }
    }
}

/// Store configuration, read from `<data_dir>/config.json` when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding records; never read from the file itself.
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub backend: Backend,
    /// Auto-save quiet window in milliseconds.
    pub autosave_ms: u64,
    /// Title given to a fresh notebook, followed by its id.
    pub title_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            backend: Backend::File,
            autosave_ms: DEFAULT_AUTOSAVE_DELAY.as_millis() as u64,
            title_prefix: "Notebook".to_string(),
        }
    }
}

impl StoreConfig {
    /// Load the configuration for `data_dir`, falling back to defaults when
    /// no config file exists.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let text = fs::read_to_string(&path)?;
            serde_json::from_str::<StoreConfig>(&text)?
        } else {
            StoreConfig::default()
        };
        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_ms)
    }

    /// Title of a notebook created for `id`.
    pub fn default_title(&self, id: &str) -> String {
        format!("{} {}", self.title_prefix, id)
    }

    /// Open the configured storage backend.
    pub fn open_storage(&self) -> Result<Box<dyn Storage>> {
        tracing::debug!(backend = %self.backend, dir = %self.data_dir.display(), "opening storage");
        Ok(match self.backend {
            Backend::File => Box::new(FileStorage::open(&self.data_dir)?),
            Backend::Sqlite => Box::new(SqliteStorage::open(&self.data_dir)?),
        })
    }
}
