use crate::config::LookupConfig;
use crate::error::{AmbiguousNameError, IndexerError, Result};
use crate::index::{ArchiveSummary, DocIndex, LoadedArchive};
use crate::scanner::{is_archive_path, ArchiveScanner};
use crate::stats::IndexStats;
use docbot_archive::{ArchiveOpener, ClassDoc, ZipArchiveOpener};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// A change to one file of the archive directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveEvent {
    Created(PathBuf),
    Removed(PathBuf),
    Modified(PathBuf),
}

impl ArchiveEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(path) | Self::Removed(path) | Self::Modified(path) => path,
        }
    }
}

/// What applying an [`ArchiveEvent`] did to the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveAction {
    Added,
    Removed,
    Reloaded,
    /// Not an archive, or a removal of an archive that was never loaded
    Ignored,
}

/// Class documentation lookup over a directory of archives.
///
/// Registry, aliases and cache sit behind one lock: every mutation and every lookup holds
/// it for its whole duration, so readers never see a half-loaded or half-removed archive.
/// Share it with `Arc`; the directory watcher drives the same mutation methods.
pub struct DocLookup {
    config: LookupConfig,
    opener: Arc<dyn ArchiveOpener>,
    index: Mutex<DocIndex>,
}

impl DocLookup {
    /// Load every zip archive of `config.archive_dir`.
    pub fn open(config: LookupConfig) -> Result<Self> {
        Self::open_with(config, Arc::new(ZipArchiveOpener))
    }

    /// Load every archive of `config.archive_dir` through a custom opener.
    ///
    /// Archives that fail to load are logged and skipped.
    pub fn open_with(mut config: LookupConfig, opener: Arc<dyn ArchiveOpener>) -> Result<Self> {
        if !config.archive_dir.is_dir() {
            return Err(IndexerError::InvalidPath(format!(
                "{} is not a directory",
                config.archive_dir.display()
            )));
        }
        config.archive_dir = std::fs::canonicalize(&config.archive_dir)?;

        let lookup = Self::empty(config, opener);
        let stats = lookup.load_all();
        info!(
            "Loaded {} archives ({} classes) in {}ms",
            stats.archives, stats.classes, stats.time_ms
        );
        Ok(lookup)
    }

    /// An engine with nothing loaded yet
    pub fn empty(config: LookupConfig, opener: Arc<dyn ArchiveOpener>) -> Self {
        let index = DocIndex::new(config.cache_capacity);
        Self {
            config,
            opener,
            index: Mutex::new(index),
        }
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    pub fn archive_dir(&self) -> &Path {
        &self.config.archive_dir
    }

    /// Scan the directory and load every archive found.
    pub fn load_all(&self) -> IndexStats {
        let started = Instant::now();
        let mut errors = Vec::new();
        for path in self.scanner().scan() {
            if let Err(err) = self.apply_event(&ArchiveEvent::Created(path.clone())) {
                warn!("Could not load archive {}: {err}", path.display());
                errors.push(format!("{}: {err}", path.display()));
            }
        }
        self.finish_stats(started, errors)
    }

    /// Open an archive and make its classes visible in one step.
    ///
    /// Returns the number of classes it declares. An archive already loaded under the same
    /// file name is replaced.
    pub fn add_archive(&self, path: &Path) -> Result<usize> {
        info!("Loading archive {}...", path.display());
        let loaded = LoadedArchive::open(self.opener.as_ref(), path)?;
        let classes = loaded.len();
        self.lock().insert_archive(loaded);
        info!("Archive {} loaded ({classes} classes)", path.display());
        Ok(classes)
    }

    /// Drop the loaded archive whose file name matches `path`.
    pub fn remove_archive(&self, path: &Path) -> Result<ArchiveSummary> {
        info!("Removing archive {}...", path.display());
        let removed = self
            .lock()
            .remove_archive(path)
            .ok_or_else(|| IndexerError::NotFound(path.to_path_buf()))?;
        info!("Archive {} removed", path.display());
        Ok(removed)
    }

    /// Replace an archive with its current on-disk content.
    ///
    /// The new content is read before the lock is taken; the swap itself is atomic. When the
    /// new content cannot be loaded the old archive is still dropped.
    pub fn reload_archive(&self, path: &Path) -> Result<usize> {
        info!("Reloading archive {}...", path.display());
        match LoadedArchive::open(self.opener.as_ref(), path) {
            Ok(loaded) => {
                let classes = loaded.len();
                let mut index = self.lock();
                index.remove_archive(path);
                index.insert_archive(loaded);
                drop(index);
                info!("Archive {} reloaded ({classes} classes)", path.display());
                Ok(classes)
            }
            Err(err) => {
                if self.lock().remove_archive(path).is_some() {
                    warn!(
                        "Archive {} is no longer readable and was removed",
                        path.display()
                    );
                }
                Err(err.into())
            }
        }
    }

    /// Apply one directory change. Startup loading and the watcher share this path.
    ///
    /// Removing an archive that is not loaded is a no-op; load failures are returned for
    /// the caller to log.
    pub fn apply_event(&self, event: &ArchiveEvent) -> Result<ArchiveAction> {
        let path = event.path();
        if !is_archive_path(path, &self.config.extension) {
            return Ok(ArchiveAction::Ignored);
        }

        match event {
            ArchiveEvent::Created(_) => {
                self.add_archive(path)?;
                Ok(ArchiveAction::Added)
            }
            ArchiveEvent::Removed(_) => match self.remove_archive(path) {
                Ok(_) => Ok(ArchiveAction::Removed),
                Err(IndexerError::NotFound(_)) => {
                    warn!(
                        "Tried to remove archive {}, but it was not loaded",
                        path.display()
                    );
                    Ok(ArchiveAction::Ignored)
                }
                Err(err) => Err(err),
            },
            ArchiveEvent::Modified(_) => {
                self.reload_archive(path)?;
                Ok(ArchiveAction::Reloaded)
            }
        }
    }

    /// Bring the index back in line with the directory after missed notifications.
    ///
    /// Loaded archives missing on disk are removed and unloaded archives on disk are added.
    /// Archives rewritten in place while notifications were lost keep their old content.
    pub fn resync(&self) -> IndexStats {
        let started = Instant::now();
        let on_disk: HashSet<PathBuf> = self.scanner().scan().into_iter().collect();
        let loaded = self.lock().archive_paths();

        for path in &loaded {
            let still_there = on_disk
                .iter()
                .any(|candidate| candidate.file_name() == path.file_name());
            if !still_there {
                let _ = self.remove_archive(path);
            }
        }

        let mut errors = Vec::new();
        let mut pending: Vec<&PathBuf> = on_disk
            .iter()
            .filter(|path| !self.lock().contains_archive(path))
            .collect();
        pending.sort();
        for path in pending {
            if let Err(err) = self.add_archive(path) {
                warn!("Could not load archive {}: {err}", path.display());
                errors.push(format!("{}: {err}", path.display()));
            }
        }
        self.finish_stats(started, errors)
    }

    /// Documentation for a simple or fully-qualified class name.
    ///
    /// The exact spelling is tried first and the lower-cased query only when that finds
    /// nothing. `Ok(None)` means no such class, or its document could not be read (logged).
    pub fn class_info(
        &self,
        query: &str,
    ) -> std::result::Result<Option<Arc<ClassDoc>>, AmbiguousNameError> {
        self.lock().class_info(query)
    }

    /// Canonical names a query resolves to, sorted
    pub fn resolve(&self, query: &str) -> Vec<String> {
        self.lock().resolve(query)
    }

    pub fn is_cached(&self, full_name: &str) -> bool {
        self.lock().is_cached(full_name)
    }

    /// Live archives in load order
    pub fn archives(&self) -> Vec<ArchiveSummary> {
        self.lock().archives()
    }

    pub fn stats(&self) -> IndexStats {
        self.lock().stats()
    }

    fn scanner(&self) -> ArchiveScanner {
        ArchiveScanner::new(&self.config.archive_dir, self.config.extension.clone())
    }

    fn finish_stats(&self, started: Instant, errors: Vec<String>) -> IndexStats {
        let mut stats = self.stats();
        stats.time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        for error in errors {
            stats.add_error(error);
        }
        stats
    }

    // A panicking caller must not take lookups down with it.
    fn lock(&self) -> MutexGuard<'_, DocIndex> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
