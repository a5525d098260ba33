use anyhow::{Context, Result};
use docbot_indexer::{LookupConfig, WatcherConfig};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub(crate) const ARCHIVE_DIR_ENV: &str = "DOCBOT_ARCHIVE_DIR";

/// Contents of the optional `--config` TOML file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub archive_dir: Option<PathBuf>,
    pub extension: Option<String>,
    pub cache_capacity: Option<NonZeroUsize>,
    pub watcher: WatcherSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WatcherSection {
    pub event_buffer: Option<usize>,
    pub poll_interval_ms: Option<u64>,
}

impl FileConfig {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }
}

/// Effective settings after layering file, environment and flags
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub lookup: LookupConfig,
    pub watcher: WatcherConfig,
}

impl Settings {
    pub(crate) fn resolve(
        config_path: Option<&Path>,
        env_archive_dir: Option<PathBuf>,
        flag_archive_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let file = match config_path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::layer(file, env_archive_dir, flag_archive_dir))
    }

    fn layer(
        file: FileConfig,
        env_archive_dir: Option<PathBuf>,
        flag_archive_dir: Option<PathBuf>,
    ) -> Self {
        let mut lookup = LookupConfig::default();
        if let Some(dir) = file.archive_dir {
            lookup.archive_dir = dir;
        }
        if let Some(extension) = file.extension {
            lookup.extension = extension.trim_start_matches('.').to_string();
        }
        lookup.cache_capacity = file.cache_capacity;
        if let Some(dir) = env_archive_dir.filter(|dir| !dir.as_os_str().is_empty()) {
            lookup.archive_dir = dir;
        }
        if let Some(dir) = flag_archive_dir {
            lookup.archive_dir = dir;
        }

        let mut watcher = WatcherConfig::default();
        if let Some(buffer) = file.watcher.event_buffer {
            watcher.event_buffer = buffer.max(1);
        }
        if let Some(ms) = file.watcher.poll_interval_ms {
            watcher.notify_poll_interval = Duration::from_millis(ms);
        }

        Self { lookup, watcher }
    }
}
