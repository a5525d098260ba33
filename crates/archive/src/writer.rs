use crate::types::ClassEntry;
use crate::zip_archive::INFO_ENTRY;
use crate::{ArchiveError, ClassDoc, LibraryInfo, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Write `docs` as a zip archive at `path`.
///
/// The archive is assembled under a temporary name in the same directory and renamed into
/// place, so a directory watcher never sees a half-written archive.
pub fn write_archive(path: &Path, info: Option<&LibraryInfo>, docs: &[ClassDoc]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = path.with_file_name(format!(".{file_name}.partial"));

    if let Err(err) = write_entries(&staging, info, docs) {
        let _ = std::fs::remove_file(&staging);
        return Err(err);
    }
    std::fs::rename(&staging, path).map_err(|source| ArchiveError::io(path, source))?;
    log::debug!("Wrote {} classes to {}", docs.len(), path.display());
    Ok(())
}

fn write_entries(path: &Path, info: Option<&LibraryInfo>, docs: &[ClassDoc]) -> Result<()> {
    let file = File::create(path).map_err(|source| ArchiveError::io(path, source))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default();

    if let Some(info) = info {
        let body = serde_json::to_vec_pretty(info).map_err(|source| ArchiveError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
        zip.start_file(INFO_ENTRY, options)
            .map_err(|source| ArchiveError::zip(path, source))?;
        zip.write_all(&body)
            .map_err(|source| ArchiveError::io(path, source))?;
    }

    for doc in docs {
        let body = serde_json::to_vec_pretty(&ClassEntry::from(doc)).map_err(|source| {
            ArchiveError::Parse {
                path: path.to_path_buf(),
                class: doc.name.full.clone(),
                source,
            }
        })?;
        zip.start_file(format!("{}.json", doc.name.full), options)
            .map_err(|source| ArchiveError::zip(path, source))?;
        zip.write_all(&body)
            .map_err(|source| ArchiveError::io(path, source))?;
    }

    let mut writer = zip
        .finish()
        .map_err(|source| ArchiveError::zip(path, source))?;
    writer
        .flush()
        .map_err(|source| ArchiveError::io(path, source))?;
    Ok(())
}
