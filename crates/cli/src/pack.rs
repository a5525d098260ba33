use anyhow::{bail, Context, Result};
use docbot_archive::{write_archive, ClassDoc, ClassName, LibraryInfo, INFO_ENTRY};
use std::path::{Path, PathBuf};

/// Overrides for the library metadata of a packed archive
#[derive(Debug, Default)]
pub(crate) struct PackOptions {
    pub name: Option<String>,
    pub version: Option<String>,
    pub base_url: Option<String>,
}

/// Build an archive from a directory of `<full.name>.json` class documents.
///
/// An `info.json` in the source directory supplies library metadata; explicit options win.
/// Returns the number of classes written.
pub(crate) fn pack_directory(src: &Path, out: &Path, options: PackOptions) -> Result<usize> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(src)
        .with_context(|| format!("Failed to read {}", src.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    let mut info = None;
    let mut docs = Vec::new();
    for path in entries {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if file_name == INFO_ENTRY {
            let raw = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let parsed: LibraryInfo = serde_json::from_slice(&raw)
                .with_context(|| format!("Invalid library info {}", path.display()))?;
            info = Some(parsed);
            continue;
        }
        let Some(full) = file_name.strip_suffix(".json") else {
            log::debug!("Skipping {}", path.display());
            continue;
        };
        docs.push(read_class(&path, full)?);
    }

    if docs.is_empty() {
        bail!("No class documents found in {}", src.display());
    }

    let info = merge_info(info, options, out);
    write_archive(out, Some(&info), &docs)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(docs.len())
}

fn read_class(path: &Path, full: &str) -> Result<ClassDoc> {
    let raw = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut body: serde_json::Value = serde_json::from_slice(&raw)
        .with_context(|| format!("Invalid class document {}", path.display()))?;
    let Some(object) = body.as_object_mut() else {
        bail!("{} is not a JSON object", path.display());
    };
    object.insert(
        "name".to_string(),
        serde_json::to_value(ClassName::from_full(full))?,
    );
    serde_json::from_value(body).with_context(|| format!("Invalid class document {}", path.display()))
}

fn merge_info(found: Option<LibraryInfo>, options: PackOptions, out: &Path) -> LibraryInfo {
    let mut info = found.unwrap_or_default();
    if let Some(name) = options.name {
        info.name = name;
    }
    if info.name.is_empty() {
        info.name = out
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    if options.version.is_some() {
        info.version = options.version;
    }
    if options.base_url.is_some() {
        info.base_url = options.base_url;
    }
    info
}
