//! CLI plumbing shared by `main`.

use std::path::PathBuf;

use pathhound::config::{ReportConfig, SessionConfig, TaskConfig};

pub mod display;
pub mod run;

/// Exit code for fatal errors (nothing ran).
pub const EXIT_FATAL: u8 = 1;

/// Exit code when jobs ran but none was delivered.
pub const EXIT_NOTHING_DELIVERED: u8 = 2;

/// Everything the run needs, assembled from the command line.
#[derive(Debug)]
pub struct RunOptions {
    /// Graph server connection.
    pub session: SessionConfig,
    /// Output directory and HTML templates.
    pub report: ReportConfig,
    /// Selected input mode.
    pub tasks: TaskConfig,
    /// Optional conventions file.
    pub conventions: Option<PathBuf>,
}
