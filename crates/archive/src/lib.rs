//! # Docbot Archive
//!
//! Documentation archives: one file per library, one JSON document per class.
//!
//! ## Layout
//!
//! ```text
//! library.zip
//!     │
//!     ├──> info.json                 (optional library metadata)
//!     ├──> java.lang.String.json     (one document per class)
//!     └──> java.util.List.json
//! ```
//!
//! The engine only talks to archives through [`DocArchive`] and [`ArchiveOpener`], so other
//! formats can be plugged in without touching the index.
//!
//! ## Example
//!
//! ```no_run
//! use docbot_archive::{ArchiveOpener, ZipArchiveOpener};
//!
//! fn main() -> docbot_archive::Result<()> {
//!     let archive = ZipArchiveOpener.open("javadocs/java-se.zip".as_ref())?;
//!     for class in archive.classes() {
//!         println!("{} -> {}", class.simple, class.full);
//!     }
//!     Ok(())
//! }
//! ```

mod archive;
mod error;
mod types;
mod writer;
mod zip_archive;

pub use archive::{ArchiveOpener, DocArchive};
pub use error::{ArchiveError, Result};
pub use types::{ClassDoc, ClassKind, ClassName, LibraryInfo, MethodDoc};
pub use writer::write_archive;
pub use zip_archive::{ZipArchiveOpener, ZipDocArchive, INFO_ENTRY};
