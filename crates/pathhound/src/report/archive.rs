//! ReportArchiver: zip the files a batch has written so far.

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

use crate::manifest::BatchManifest;

/// Errors that stop an archive from being written at all.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive file could not be created or written.
    #[error("cannot write archive {}: {source}", path.display())]
    Io {
        /// Archive path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Zip encoding failed.
    #[error("zip error: {0}")]
    Zip(#[from] ZipError),
}

/// What went into an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Files added, relative to the output directory.
    pub added: Vec<PathBuf>,
    /// Files referenced by the manifest but not readable.
    pub skipped: Vec<PathBuf>,
}

/// Bundles delivered files under an output directory.
#[derive(Debug, Clone)]
pub struct ReportArchiver {
    output_dir: PathBuf,
}

impl ReportArchiver {
    /// An archiver reading files from `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write every file of every manifest entry to the zip archive at
    /// `archive_path` (relative to the output directory).
    ///
    /// Entries without files (STDOUT) contribute nothing. A missing file is
    /// logged and listed in [`ArchiveReport::skipped`]; the rest are still
    /// archived.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] if the archive itself cannot be written.
    pub fn archive(
        &self,
        manifest: &BatchManifest,
        archive_path: &Path,
    ) -> Result<ArchiveReport, ArchiveError> {
        let target = self.output_dir.join(archive_path);
        let io_error = |source: io::Error| ArchiveError::Io {
            path: target.clone(),
            source,
        };
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let mut zip = ZipWriter::new(File::create(&target).map_err(io_error)?);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut seen = HashSet::new();
        let mut report = ArchiveReport::default();

        for entry in manifest.entries() {
            for file in entry.files() {
                if file == archive_path || !seen.insert(file.clone()) {
                    continue;
                }
                let mut source = match File::open(self.output_dir.join(&file)) {
                    Ok(source) => source,
                    Err(error) => {
                        warn!(
                            title = %entry.title,
                            file = %file.display(),
                            %error,
                            "Skipping missing report file"
                        );
                        report.skipped.push(file);
                        continue;
                    }
                };

                zip.start_file(entry_name(&file), options)?;
                io::copy(&mut source, &mut zip).map_err(io_error)?;
                debug!(file = %file.display(), "Archived report file");
                report.added.push(file);
            }
        }

        zip.finish()?;
        info!(
            archive = %target.display(),
            added = report.added.len(),
            skipped = report.skipped.len(),
            "Wrote report archive"
        );
        Ok(report)
    }
}

/// Zip entry name: forward slashes on every platform.
fn entry_name(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
