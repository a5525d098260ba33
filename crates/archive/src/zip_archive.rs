use crate::types::ClassEntry;
use crate::{ArchiveError, ArchiveOpener, ClassDoc, ClassName, DocArchive, LibraryInfo, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zip::result::ZipError;
use zip::ZipArchive;

/// Name of the optional library metadata entry
pub const INFO_ENTRY: &str = "info.json";

const CLASS_ENTRY_SUFFIX: &str = ".json";

/// Archive backed by a zip file holding one JSON document per class.
///
/// The class list is read once when the archive is opened. Documents are read on demand by
/// reopening the file, so no file handle is kept between lookups.
#[derive(Debug)]
pub struct ZipDocArchive {
    path: PathBuf,
    library: Option<LibraryInfo>,
    classes: Vec<ClassName>,
    entries: HashMap<String, String>,
}

impl ZipDocArchive {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut archive = open_zip(&path)?;

        let mut library = None;
        let mut classes = Vec::new();
        let mut entries = HashMap::new();

        for idx in 0..archive.len() {
            let mut entry = archive
                .by_index(idx)
                .map_err(|source| ArchiveError::zip(&path, source))?;
            if !entry.is_file() {
                continue;
            }

            let name = entry.name().to_string();
            if name == INFO_ENTRY {
                let mut raw = String::new();
                entry
                    .read_to_string(&mut raw)
                    .map_err(|source| ArchiveError::io(&path, source))?;
                let info: LibraryInfo =
                    serde_json::from_str(&raw).map_err(|source| ArchiveError::Manifest {
                        path: path.clone(),
                        source,
                    })?;
                library = Some(info);
                continue;
            }

            let Some(full) = class_name_for_entry(&name) else {
                log::debug!("Skipping non-class entry {name} in {}", path.display());
                continue;
            };
            if entries.contains_key(full) {
                continue;
            }
            entries.insert(full.to_string(), name.clone());
            classes.push(ClassName::from_full(full));
        }

        Ok(Self {
            path,
            library,
            classes,
            entries,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl DocArchive for ZipDocArchive {
    fn path(&self) -> &Path {
        &self.path
    }

    fn library(&self) -> Option<&LibraryInfo> {
        self.library.as_ref()
    }

    fn classes(&self) -> Box<dyn Iterator<Item = ClassName> + '_> {
        Box::new(self.classes.iter().cloned())
    }

    fn class_doc(&self, full_name: &str) -> Result<Option<ClassDoc>> {
        let Some(entry_name) = self.entries.get(full_name) else {
            return Ok(None);
        };

        let mut archive = open_zip(&self.path)?;
        let mut entry = match archive.by_name(entry_name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(source) => return Err(ArchiveError::zip(&self.path, source)),
        };

        let mut raw = String::new();
        entry
            .read_to_string(&mut raw)
            .map_err(|source| ArchiveError::io(&self.path, source))?;
        let parsed: ClassEntry =
            serde_json::from_str(&raw).map_err(|source| ArchiveError::Parse {
                path: self.path.clone(),
                class: full_name.to_string(),
                source,
            })?;

        Ok(Some(parsed.into_doc(
            ClassName::from_full(full_name),
            self.library.as_ref(),
        )))
    }
}

/// Opens `.zip` documentation archives
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveOpener;

impl ArchiveOpener for ZipArchiveOpener {
    fn open(&self, path: &Path) -> Result<Arc<dyn DocArchive>> {
        Ok(Arc::new(ZipDocArchive::open(path)?))
    }
}

fn open_zip(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path).map_err(|source| ArchiveError::io(path, source))?;
    ZipArchive::new(BufReader::new(file)).map_err(|source| ArchiveError::zip(path, source))
}

/// `java.lang.String.json` -> `java.lang.String`; nested paths are not class entries.
fn class_name_for_entry(name: &str) -> Option<&str> {
    if name.contains('/') {
        return None;
    }
    let stem = name.strip_suffix(CLASS_ENTRY_SUFFIX)?;
    if stem.is_empty() || stem.starts_with('.') || stem.ends_with('.') {
        return None;
    }
    Some(stem)
}
