use docbot_archive::{ClassName, DocArchive};
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

/// One live archive and the classes it contributes
pub(crate) struct RegistryEntry {
    pub(crate) archive: Arc<dyn DocArchive>,
    pub(crate) classes: HashSet<ClassName>,
    pub(crate) full_names: HashSet<String>,
    /// Load order; the newest contributor of a name is its current source
    pub(crate) seq: u64,
}

impl RegistryEntry {
    pub(crate) fn path(&self) -> &Path {
        self.archive.path()
    }
}

/// Live archives keyed by file name.
///
/// The archive directory is watched non-recursively, so a file name identifies an archive.
#[derive(Default)]
pub(crate) struct ArchiveRegistry {
    entries: HashMap<OsString, RegistryEntry>,
    next_seq: u64,
}

impl ArchiveRegistry {
    /// Register an archive, returning the entry it replaced under the same file name.
    pub(crate) fn insert(
        &mut self,
        archive: Arc<dyn DocArchive>,
        classes: Vec<ClassName>,
    ) -> Option<RegistryEntry> {
        let key = file_name_key(archive.path());
        let full_names = classes.iter().map(|class| class.full.clone()).collect();
        let entry = RegistryEntry {
            archive,
            classes: classes.into_iter().collect(),
            full_names,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.insert(key, entry)
    }

    /// Remove the archive whose file name matches `path`'s file name.
    pub(crate) fn remove(&mut self, path: &Path) -> Option<RegistryEntry> {
        self.entries.remove(&file_name_key(path))
    }

    pub(crate) fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(&file_name_key(path))
    }

    /// Whether any live archive still declares exactly this (simple, full) pair
    pub(crate) fn contributes_pair(&self, class: &ClassName) -> bool {
        self.entries
            .values()
            .any(|entry| entry.classes.contains(class))
    }

    /// Whether any live archive still declares this canonical name
    pub(crate) fn contributes(&self, full_name: &str) -> bool {
        self.entries
            .values()
            .any(|entry| entry.full_names.contains(full_name))
    }

    /// Live archives declaring `full_name`, newest first
    pub(crate) fn contributors(&self, full_name: &str) -> Vec<Arc<dyn DocArchive>> {
        let mut found: Vec<&RegistryEntry> = self
            .entries
            .values()
            .filter(|entry| entry.full_names.contains(full_name))
            .collect();
        found.sort_by(|a, b| b.seq.cmp(&a.seq));
        found
            .into_iter()
            .map(|entry| Arc::clone(&entry.archive))
            .collect()
    }

    /// Entries in load order
    pub(crate) fn entries(&self) -> Vec<&RegistryEntry> {
        let mut entries: Vec<&RegistryEntry> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }

    /// Number of distinct canonical names across all live archives
    pub(crate) fn class_count(&self) -> usize {
        self.entries
            .values()
            .flat_map(|entry| entry.full_names.iter())
            .collect::<HashSet<_>>()
            .len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

fn file_name_key(path: &Path) -> OsString {
    path.file_name()
        .unwrap_or_else(|| path.as_os_str())
        .to_os_string()
}
