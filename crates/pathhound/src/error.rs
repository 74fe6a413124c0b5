//! Error types for pathhound.
//!
//! Errors fall into two groups:
//!
//! - **`Error`**: failures that stop the run before any job executes
//!   (unreachable server, unreadable configuration, empty task list).
//! - **`JobError`**: failures of a single job. They are recorded against
//!   that job and the batch moves on to the next one.

use thiserror::Error;

use crate::analyzer::AnalysisError;
use crate::deliver::DeliveryError;
use crate::report::ArchiveError;
use crate::session::SessionError;

/// Result type for fatal pathhound operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Run-level error. Nothing is executed after one of these.
#[derive(Debug, Error)]
pub enum Error {
    /// The graph server could not be reached or refused the session.
    #[error("cannot connect to {server}: {source}")]
    Connect {
        /// Server URL that was tried.
        server: String,
        /// Underlying session failure.
        #[source]
        source: SessionError,
    },

    /// Invalid configuration or arguments
    #[error("configuration error: {0}")]
    Config(String),

    /// The task list could not be read.
    #[error("task list error: {0}")]
    TaskList(#[from] pathhound_tasklist::Error),

    /// Nothing to run.
    #[error("no runnable tasks: {0}")]
    NoTasks(String),
}

/// Failure of a single job.
#[derive(Debug, Error)]
pub enum JobError {
    /// The query or a path check failed in the engine.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The result could not be written.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// The archive could not be created.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Path analysis produced unusable data.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl JobError {
    /// Short machine-readable category for logs and summaries.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Session(SessionError::Timeout(_)) => "timeout",
            Self::Session(_) => "query",
            Self::Delivery(_) => "delivery",
            Self::Archive(_) => "archive",
            Self::Analysis(_) => "analysis",
        }
    }
}

/// A failed job, identified by its position and title.
#[derive(Debug)]
pub struct JobFailure {
    /// Zero-based position in the batch.
    pub index: usize,
    /// Job title.
    pub title: String,
    /// What went wrong.
    pub error: JobError,
}

impl std::fmt::Display for JobFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "job {} '{}' failed ({}): {}",
            self.index + 1,
            self.title,
            self.error.kind(),
            self.error
        )
    }
}

impl std::error::Error for JobFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
