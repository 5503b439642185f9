use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotebookError {
    #[error("Malformed record: {0}")]
    Decode(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Page index {index} out of range (notebook has {len} pages)")]
    PageOutOfRange { index: usize, len: usize },

    #[error("Storage error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl NotebookError {
    /// True for failures of the underlying storage layer.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            NotebookError::Persistence(_) | NotebookError::Io(_) | NotebookError::Sqlite(_)
        )
    }

    /// True for caller contract violations.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            NotebookError::InvalidArgument(_) | NotebookError::PageOutOfRange { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, NotebookError>;
