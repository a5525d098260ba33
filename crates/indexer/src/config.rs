use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

/// Default archive extension, matched case-insensitively
pub const DEFAULT_ARCHIVE_EXTENSION: &str = "zip";

/// Where archives live and how parsed documents are kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Directory holding the documentation archives (not searched recursively)
    pub archive_dir: PathBuf,

    /// Archive file extension without the dot
    pub extension: String,

    /// Maximum number of parsed documents kept in memory (unbounded when unset)
    pub cache_capacity: Option<NonZeroUsize>,
}

impl LookupConfig {
    pub fn new(archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            archive_dir: archive_dir.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    #[must_use]
    pub const fn with_cache_capacity(mut self, capacity: Option<NonZeroUsize>) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            archive_dir: PathBuf::from("javadocs"),
            extension: DEFAULT_ARCHIVE_EXTENSION.to_string(),
            cache_capacity: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WatcherConfig {
    /// Capacity of the channel between the notify backend and the watcher task
    pub event_buffer: usize,
    /// Poll interval used when notify falls back to its polling backend
    pub notify_poll_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            event_buffer: 1024,
            notify_poll_interval: Duration::from_secs(2),
        }
    }
}
