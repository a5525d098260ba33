use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Scanner for documentation archives in one directory
pub struct ArchiveScanner {
    dir: PathBuf,
    extension: String,
}

impl ArchiveScanner {
    pub fn new(dir: impl AsRef<Path>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            extension: extension.into(),
        }
    }

    /// List archives directly inside the directory, sorted by path.
    ///
    /// Subdirectories are not searched and ignore files have no effect; hidden files are
    /// skipped (archive writers stage their output under a hidden name). Symlinks count as
    /// the file they point to.
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let mut builder = WalkBuilder::new(&self.dir);
        builder
            .standard_filters(false)
            .hidden(true)
            .follow_links(true)
            .max_depth(Some(1));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if !is_archive_path(path, &self.extension) {
                        log::debug!("Skipping non-archive file {}", path.display());
                        continue;
                    }

                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort();
        log::info!(
            "Found {} archives in {}",
            files.len(),
            self.dir.display()
        );
        files
    }
}

/// Whether `path` names an archive: case-insensitive suffix match on `.<extension>`.
pub fn is_archive_path(path: &Path, extension: &str) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    name.len() > suffix.len() && name.to_lowercase().ends_with(&suffix.to_lowercase())
}
