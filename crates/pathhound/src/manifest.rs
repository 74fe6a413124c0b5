//! BatchManifest: what a batch has delivered so far.

use std::path::PathBuf;

use crate::job::OutputFormat;

/// Metadata of one delivered job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Job title.
    pub title: String,
    /// Rows delivered.
    pub row_count: usize,
    /// Output path relative to the output directory (empty for STDOUT).
    pub output_file: PathBuf,
    /// Format the job was delivered in.
    pub format: OutputFormat,
}

impl ManifestEntry {
    /// Files this entry wrote, relative to the output directory.
    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        self.format.output_files(&self.output_file)
    }
}

/// Append-only record of delivered jobs, in delivery order.
///
/// Only the job runner appends; the index and archive jobs read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchManifest {
    entries: Vec<ManifestEntry>,
}

impl BatchManifest {
    /// An empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    /// Entries in delivery order.
    #[must_use]
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been delivered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ManifestEntry> for BatchManifest {
    fn from_iter<I: IntoIterator<Item = ManifestEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn htmlcsv_entry_lists_both_files() {
        let entry = ManifestEntry {
            title: "Users".to_string(),
            row_count: 3,
            output_file: PathBuf::from("users"),
            format: OutputFormat::HtmlCsv,
        };
        assert_eq!(
            entry.files(),
            vec![PathBuf::from("users.html"), PathBuf::from("users.csv")]
        );
    }

    #[test]
    fn stdout_entry_has_no_files() {
        let entry = ManifestEntry {
            title: "Users".to_string(),
            row_count: 3,
            output_file: PathBuf::new(),
            format: OutputFormat::Stdout,
        };
        assert!(entry.files().is_empty());
    }
}
