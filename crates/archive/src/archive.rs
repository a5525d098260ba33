use crate::{ClassDoc, ClassName, LibraryInfo, Result};
use std::path::Path;
use std::sync::Arc;

/// An opened documentation archive.
///
/// Handles are immutable once opened. `classes` can be called any number of times and
/// yields the same sequence each time.
pub trait DocArchive: Send + Sync {
    /// Absolute path of the archive file
    fn path(&self) -> &Path;

    /// Library metadata, if the archive carries any
    fn library(&self) -> Option<&LibraryInfo>;

    /// Every class documented by this archive.
    ///
    /// The simple name must be derived from the full one (see [`ClassName::from_full`]): the
    /// alias index assumes one canonical name never appears under two simple names.
    fn classes(&self) -> Box<dyn Iterator<Item = ClassName> + '_>;

    /// Parse the documentation of one class.
    ///
    /// Returns `Ok(None)` when the archive does not contain `full_name`.
    fn class_doc(&self, full_name: &str) -> Result<Option<ClassDoc>>;
}

/// Opens archive files. The index only holds this seam, never a concrete format.
pub trait ArchiveOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Arc<dyn DocArchive>>;
}
