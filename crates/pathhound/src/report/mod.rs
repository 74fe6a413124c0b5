//! Batch-level reports built from the [`BatchManifest`](crate::manifest::BatchManifest).
//!
//! - [`ReportIndexer`] renders an HTML index page linking every delivered job.
//! - [`ReportArchiver`] bundles the delivered files into one zip archive.

pub mod archive;
pub mod index;

pub use archive::{ArchiveError, ArchiveReport, ReportArchiver};
pub use index::{INDEX_KEYS, INDEX_TITLE, ReportIndexer};
