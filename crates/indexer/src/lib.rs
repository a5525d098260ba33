//! # Docbot Indexer
//!
//! Class documentation lookup over a directory of documentation archives.
//!
//! ## Pipeline
//!
//! ```text
//! Archive directory
//!     │
//!     ├──> Scanner (startup) ──┐
//!     │                        ├──> apply_event ──> Registry + Alias Index + Cache
//!     └──> Watcher (notify) ───┘                          (one lock)
//!                                                              │
//! class_info("string") ──> aliases ──> cache ──> archive parse ┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use docbot_indexer::{ArchiveWatcher, DocLookup, LookupConfig, WatcherConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lookup = Arc::new(DocLookup::open(LookupConfig::new("javadocs"))?);
//!     let watcher = ArchiveWatcher::start(lookup.clone(), WatcherConfig::default())?;
//!
//!     match lookup.class_info("string") {
//!         Ok(Some(doc)) => println!("{}: {}", doc.name, doc.description),
//!         Ok(None) => println!("not found"),
//!         Err(ambiguous) => println!("which one? {}", ambiguous.candidates.join(", ")),
//!     }
//!
//!     watcher.shutdown().await;
//!     Ok(())
//! }
//! ```

mod alias;
mod cache;
mod config;
mod error;
mod index;
mod lookup;
mod registry;
mod scanner;
mod stats;
mod watcher;

pub use alias::AliasIndex;
pub use cache::DocCache;
pub use config::{LookupConfig, WatcherConfig, DEFAULT_ARCHIVE_EXTENSION};
pub use error::{AmbiguousNameError, IndexerError, Result};
pub use index::ArchiveSummary;
pub use lookup::{ArchiveAction, ArchiveEvent, DocLookup};
pub use scanner::{is_archive_path, ArchiveScanner};
pub use stats::IndexStats;
pub use watcher::{AlertRecord, ArchiveUpdate, ArchiveWatcher, WatcherHealth};
