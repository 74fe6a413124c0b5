//! The batch run behind `pathhound`.

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::info;

use pathhound::config::{Conventions, TaskConfig};
use pathhound::deliver::{HtmlTemplate, ResultDeliverer};
use pathhound::{HttpSession, JobRunner, tasks};

use super::display;
use super::{EXIT_NOTHING_DELIVERED, RunOptions};

/// Counts that decide the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Jobs attempted.
    pub attempted: usize,
    /// Jobs delivered.
    pub delivered: usize,
}

impl RunSummary {
    /// Success if anything was delivered.
    pub fn exit_code(self) -> ExitCode {
        if self.delivered > 0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(EXIT_NOTHING_DELIVERED)
        }
    }
}

/// Build the jobs, connect, run the batch and print the summary.
///
/// Configuration and templates are checked before connecting, so a typo
/// fails fast without touching the server.
pub fn run(options: &RunOptions) -> Result<RunSummary> {
    let conventions = match &options.conventions {
        Some(path) => Conventions::load(path)
            .with_context(|| format!("loading conventions from {}", path.display()))?,
        None => Conventions::default(),
    };
    let template = HtmlTemplate::load(&options.report).context("loading HTML templates")?;
    let built = tasks::build(&options.tasks).context("building jobs")?;
    display::print_task_warnings(&built.warnings);

    info!(
        server = %options.session.server,
        user = %options.session.username,
        password = "*****",
        database = %options.session.database,
        timeout_secs = options.session.timeout.as_secs(),
        mode = mode_name(&options.tasks),
        jobs = built.jobs.len(),
        output_dir = %options.report.output_dir.display(),
        "Starting pathhound"
    );

    let session = HttpSession::connect(options.session.clone())
        .with_context(|| format!("connecting to {}", options.session.server))?;

    let deliverer = ResultDeliverer::to_stdout(&options.report.output_dir, template);
    let outcome = JobRunner::new(&session, &conventions, deliverer).run(&built.jobs);
    display::print_summary(&outcome);

    Ok(RunSummary {
        attempted: outcome.attempted(),
        delivered: outcome.delivered(),
    })
}

fn mode_name(tasks: &TaskConfig) -> &'static str {
    if tasks.task_file.is_some() {
        "task-file"
    } else if tasks.query.is_some() {
        "query"
    } else if tasks.busiest_path.is_some() {
        "busiest-path"
    } else if tasks.analyze_path.is_some() {
        "analyze-path"
    } else {
        "easy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathhound::config::AdhocQuery;

    #[test]
    fn mode_name_follows_precedence() {
        let tasks = TaskConfig {
            query: Some(AdhocQuery {
                query: "RETURN 1".to_string(),
            }),
            easy: true,
            ..TaskConfig::default()
        };
        assert_eq!(mode_name(&tasks), "query");
        assert_eq!(mode_name(&TaskConfig::default()), "easy");
    }
}
