use docbot_archive::ArchiveError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    ArchiveError(#[from] ArchiveError),

    #[error("Archive not loaded: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid archive directory: {0}")]
    InvalidPath(String),

    #[error("Watcher error: {0}")]
    Watch(String),

    #[error("{0}")]
    Other(String),
}

/// A query matched more than one class; the caller has to ask which one was meant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("\"{query}\" matches {} classes: {}", .candidates.len(), .candidates.join(", "))]
pub struct AmbiguousNameError {
    pub query: String,
    /// Fully-qualified candidates, sorted
    pub candidates: Vec<String>,
}
