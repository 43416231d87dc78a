use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the notebooklet crates.
#[derive(Error, Debug)]
pub enum NotebookletError {
    /// A required run parameter was empty or absent.
    #[error("Required parameter missing: {0}")]
    MissingParameter(String),

    /// The event-export directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NotebookletError {
    /// Shorthand for the missing-parameter case.
    pub fn missing(param: &str) -> Self {
        Self::MissingParameter(param.to_string())
    }
}

/// Convenience alias used throughout the notebooklet crates.
pub type Result<T> = std::result::Result<T, NotebookletError>;
