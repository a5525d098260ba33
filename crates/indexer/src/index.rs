use crate::alias::AliasIndex;
use crate::cache::DocCache;
use crate::error::AmbiguousNameError;
use crate::registry::{ArchiveRegistry, RegistryEntry};
use crate::stats::IndexStats;
use docbot_archive::{ArchiveOpener, ClassDoc, ClassName, DocArchive, LibraryInfo};
use log::warn;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An archive opened and enumerated, ready to be swapped into the index in one step
pub(crate) struct LoadedArchive {
    archive: Arc<dyn DocArchive>,
    classes: Vec<ClassName>,
}

impl LoadedArchive {
    pub(crate) fn open(opener: &dyn ArchiveOpener, path: &Path) -> docbot_archive::Result<Self> {
        let archive = opener.open(path)?;
        // alias bookkeeping keys on (simple, full) pairs, so simple names are re-derived
        let classes = archive
            .classes()
            .map(|class| ClassName::from_full(class.full))
            .collect();
        Ok(Self { archive, classes })
    }

    pub(crate) fn len(&self) -> usize {
        self.classes.len()
    }
}

/// Summary of one live archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub file_name: String,
    pub classes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<LibraryInfo>,
}

impl ArchiveSummary {
    fn from_entry(entry: &RegistryEntry) -> Self {
        let path = entry.path().to_path_buf();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            file_name,
            classes: entry.full_names.len(),
            library: entry.archive.library().cloned(),
        }
    }
}

/// Registry, alias index and document cache.
///
/// The three structures only change together, through `insert_archive` and
/// `remove_archive`, and the owner keeps this value behind a single lock.
pub(crate) struct DocIndex {
    registry: ArchiveRegistry,
    aliases: AliasIndex,
    cache: DocCache,
}

impl DocIndex {
    pub(crate) fn new(cache_capacity: Option<NonZeroUsize>) -> Self {
        Self {
            registry: ArchiveRegistry::default(),
            aliases: AliasIndex::new(),
            cache: DocCache::new(cache_capacity),
        }
    }

    /// Make an archive visible. An archive already registered under the same file name is
    /// replaced.
    pub(crate) fn insert_archive(&mut self, loaded: LoadedArchive) {
        let LoadedArchive { archive, classes } = loaded;
        for class in &classes {
            self.aliases.insert(class);
            // last loaded wins: cached documents may come from an older contributor
            self.cache.evict(&class.full);
        }
        if let Some(replaced) = self.registry.insert(archive, classes) {
            self.purge(&replaced);
        }
    }

    /// Drop an archive and everything only it contributed.
    pub(crate) fn remove_archive(&mut self, path: &Path) -> Option<ArchiveSummary> {
        let entry = self.registry.remove(path)?;
        self.purge(&entry);
        Some(ArchiveSummary::from_entry(&entry))
    }

    /// Remove aliases no remaining archive contributes.
    ///
    /// Cached documents of the dropped archive are evicted even when another archive still
    /// declares the class: the cached copy may have been parsed from the dropped one.
    fn purge(&mut self, entry: &RegistryEntry) {
        for class in &entry.classes {
            self.cache.evict(&class.full);
            if !self.registry.contributes_pair(class) {
                self.aliases.remove_simple(class);
            }
            if !self.registry.contributes(&class.full) {
                self.aliases.remove_full(class);
            }
        }
    }

    pub(crate) fn resolve(&self, query: &str) -> Vec<String> {
        self.aliases.resolve(query).into_iter().collect()
    }

    pub(crate) fn class_info(
        &mut self,
        query: &str,
    ) -> Result<Option<Arc<ClassDoc>>, AmbiguousNameError> {
        let mut names = self.resolve(query);
        if names.len() > 1 {
            return Err(AmbiguousNameError {
                query: query.to_string(),
                candidates: names,
            });
        }
        let Some(name) = names.pop() else {
            return Ok(None);
        };

        if let Some(doc) = self.cache.get(&name) {
            return Ok(Some(doc));
        }

        for archive in self.registry.contributors(&name) {
            match archive.class_doc(&name) {
                Ok(Some(doc)) => {
                    let doc = Arc::new(doc);
                    self.cache.put(name, Arc::clone(&doc));
                    return Ok(Some(doc));
                }
                Ok(None) => warn!(
                    "{name} is indexed for {} but the archive does not contain it",
                    archive.path().display()
                ),
                Err(err) if err.is_parse_error() => {
                    warn!("Malformed documentation for {name}: {err}");
                }
                Err(err) => warn!(
                    "Failed to read {name} from {}: {err}",
                    archive.path().display()
                ),
            }
        }

        Ok(None)
    }

    pub(crate) fn contains_archive(&self, path: &Path) -> bool {
        self.registry.contains(path)
    }

    pub(crate) fn is_cached(&self, name: &str) -> bool {
        self.cache.contains(name)
    }

    pub(crate) fn archives(&self) -> Vec<ArchiveSummary> {
        self.registry
            .entries()
            .into_iter()
            .map(ArchiveSummary::from_entry)
            .collect()
    }

    pub(crate) fn archive_paths(&self) -> Vec<PathBuf> {
        self.registry
            .entries()
            .into_iter()
            .map(|entry| entry.path().to_path_buf())
            .collect()
    }

    /// Current sizes; `time_ms` and `errors` are left for the caller to fill in.
    pub(crate) fn stats(&self) -> IndexStats {
        IndexStats {
            archives: self.registry.len(),
            classes: self.registry.class_count(),
            aliases: self.aliases.len(),
            cached_docs: self.cache.len(),
            ..IndexStats::new()
        }
    }
}
