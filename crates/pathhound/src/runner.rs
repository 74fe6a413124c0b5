//! JobRunner: execute a batch in order, containing per-job failures.

use std::io::Write;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::analyzer::PathAnalyzer;
use crate::config::Conventions;
use crate::deliver::ResultDeliverer;
use crate::error::{JobError, JobFailure};
use crate::job::{Job, JobKind, OutputFormat};
use crate::manifest::{BatchManifest, ManifestEntry};
use crate::report::{ReportArchiver, ReportIndexer};
use crate::result::{JobResult, TabularResult};
use crate::session::{GraphSession, Params};

/// What happened to one job.
#[derive(Debug)]
pub enum JobOutcome {
    /// The job's result was delivered.
    Delivered {
        /// Zero-based position in the batch.
        index: usize,
        /// Job title.
        title: String,
        /// Rows delivered.
        row_count: usize,
    },
    /// The job failed; the batch went on.
    Failed(JobFailure),
}

impl JobOutcome {
    /// Returns `true` for delivered jobs.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Result of a whole batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// One outcome per job, in job order.
    pub outcomes: Vec<JobOutcome>,
    /// Everything delivered, in delivery order.
    pub manifest: BatchManifest,
}

impl BatchOutcome {
    /// Jobs attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Jobs delivered.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }

    /// Failed jobs, in job order.
    pub fn failures(&self) -> impl Iterator<Item = &JobFailure> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            JobOutcome::Failed(failure) => Some(failure),
            JobOutcome::Delivered { .. } => None,
        })
    }
}

/// Runs jobs one after another against a single session.
#[derive(Debug)]
pub struct JobRunner<'a, S: ?Sized, W> {
    session: &'a S,
    conventions: &'a Conventions,
    deliverer: ResultDeliverer<W>,
}

impl<'a, S: GraphSession + ?Sized, W: Write> JobRunner<'a, S, W> {
    /// A runner over `session` delivering through `deliverer`.
    pub fn new(session: &'a S, conventions: &'a Conventions, deliverer: ResultDeliverer<W>) -> Self {
        Self {
            session,
            conventions,
            deliverer,
        }
    }

    /// Consume the runner and return its deliverer.
    pub fn into_deliverer(self) -> ResultDeliverer<W> {
        self.deliverer
    }

    /// Execute `jobs` in order.
    ///
    /// A failing job is recorded and never stops the batch. Index and
    /// archive jobs see only the jobs delivered before them.
    pub fn run(&mut self, jobs: &[Job]) -> BatchOutcome {
        let total = jobs.len();
        let mut batch = BatchOutcome::default();
        info!(total, "Starting batch");

        for (index, job) in jobs.iter().enumerate() {
            info!(
                job = index + 1,
                total,
                title = job.title(),
                kind = job.kind().name(),
                "Running job"
            );

            match self.execute(job, &batch.manifest) {
                Ok(completed) => {
                    batch.outcomes.push(JobOutcome::Delivered {
                        index,
                        title: job.title().to_string(),
                        row_count: completed.row_count,
                    });
                    if let Some(entry) = completed.entry {
                        batch.manifest.push(entry);
                    }
                }
                Err(error) => {
                    warn!(
                        job = index + 1,
                        title = job.title(),
                        kind = error.kind(),
                        error = %error,
                        "Job failed"
                    );
                    batch.outcomes.push(JobOutcome::Failed(JobFailure {
                        index,
                        title: job.title().to_string(),
                        error,
                    }));
                }
            }
        }

        let delivered = batch.delivered();
        if delivered == 0 {
            warn!(total, "No job was delivered");
        } else {
            info!(delivered, total, "Batch complete");
        }
        batch
    }

    fn execute(&mut self, job: &Job, manifest: &BatchManifest) -> Result<Completed, JobError> {
        let result = match job.kind() {
            JobKind::Query { query } => {
                debug!(query, "Running query");
                JobResult::Table(TabularResult::from(self.session.run(query, &Params::new())?))
            }
            JobKind::AnalyzePath { start, end } => JobResult::Paths(
                PathAnalyzer::new(self.session, self.conventions)
                    .analyze_path(start, end.as_deref())?,
            ),
            JobKind::BusiestPath { mode, limit } => JobResult::Table(TabularResult::from(
                PathAnalyzer::new(self.session, self.conventions)
                    .find_busiest_path(*mode, *limit)?,
            )),
            JobKind::ReportIndex => return self.write_index(job, manifest),
            JobKind::ZipTasks => return self.write_archive(job, manifest),
        };

        self.deliverer
            .deliver(&result, job.format(), job.output(), job.title())?;

        let row_count = result.row_count();
        Ok(Completed {
            row_count,
            entry: Some(ManifestEntry {
                title: job.title().to_string(),
                row_count,
                output_file: job.output().to_path_buf(),
                format: job.format(),
            }),
        })
    }

    fn write_index(&self, job: &Job, manifest: &BatchManifest) -> Result<Completed, JobError> {
        let page = ReportIndexer::new(self.deliverer.template()).render(
            manifest,
            job.output(),
            Local::now().date_naive(),
        );
        self.deliverer.write_file(job.output(), page.as_bytes())?;
        info!(entries = manifest.len(), path = %job.output().display(), "Wrote report index");

        Ok(Completed {
            row_count: manifest.len(),
            entry: Some(ManifestEntry {
                title: job.title().to_string(),
                row_count: manifest.len(),
                output_file: job.output().to_path_buf(),
                format: OutputFormat::Html,
            }),
        })
    }

    fn write_archive(&self, job: &Job, manifest: &BatchManifest) -> Result<Completed, JobError> {
        let report = ReportArchiver::new(self.deliverer.output_dir()).archive(manifest, job.output())?;
        Ok(Completed {
            row_count: report.added.len(),
            entry: None,
        })
    }
}

/// A finished job. Archives are not manifest entries.
struct Completed {
    row_count: usize,
    entry: Option<ManifestEntry>,
}
