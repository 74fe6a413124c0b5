//! TaskBuilder: turn a [`TaskConfig`] into the ordered job list.

use pathhound_tasklist::{TaskAction, TaskEntry, Warning, WarningCollector, read_task_list};
use tracing::{debug, info, warn};

use crate::config::TaskConfig;
use crate::error::{Error, Result};
use crate::job::{BusiestMode, Job, JobKind, NodeSelector, OutputFormat};

/// Smoke-test query run by the `easy` mode.
pub const EASY_QUERY: &str = "MATCH (n:User) RETURN n.name, n.displayname";

const EASY_TITLE: &str = "Domain Users";
const ADHOC_TITLE: &str = "Adhoc Query";
const BUSIEST_TITLE: &str = "Busiest Paths";
const ANALYZE_TITLE: &str = "Attack Path Analysis";

/// Jobs built from a configuration, with the lines that were skipped.
#[derive(Debug, Clone, Default)]
pub struct BuiltTasks {
    /// Jobs in execution order.
    pub jobs: Vec<Job>,
    /// One warning per rejected task-list line.
    pub warnings: Vec<Warning>,
}

/// Build the job list for the single input mode `config` selects.
///
/// Precedence: task file, ad-hoc query, busiest path, analyze path, easy.
/// Only the task-file mode can produce more than one job or any warnings.
///
/// # Errors
///
/// - [`Error::Config`] if no mode is selected or a single-job mode has an
///   invalid output path.
/// - [`Error::TaskList`] if the task file cannot be read.
/// - [`Error::NoTasks`] if the task file yields no runnable job.
pub fn build(config: &TaskConfig) -> Result<BuiltTasks> {
    if let Some(path) = &config.task_file {
        info!(path = %path.display(), "Building jobs from task list");
        let parsed = read_task_list(path)?;

        let mut collector = WarningCollector::new();
        collector.extend(parsed.warnings);

        let mut jobs = Vec::with_capacity(parsed.tasks.len());
        for entry in parsed.tasks {
            let line_number = entry.line_number;
            match job_from_entry(entry) {
                Ok(job) => jobs.push(job),
                Err(reason) => {
                    warn!(line = line_number, %reason, "Skipping task line");
                    collector.add(Warning::SkippedLine {
                        line_number,
                        reason,
                    });
                }
            }
        }

        if jobs.is_empty() {
            return Err(Error::NoTasks(format!(
                "{} contains no runnable task ({} line(s) rejected)",
                path.display(),
                collector.len()
            )));
        }

        debug!(jobs = jobs.len(), warnings = collector.len(), "Task list built");
        return Ok(BuiltTasks {
            jobs,
            warnings: collector.into_warnings(),
        });
    }

    let (default_title, kind) = if let Some(adhoc) = &config.query {
        (
            ADHOC_TITLE,
            JobKind::Query {
                query: adhoc.query.clone(),
            },
        )
    } else if let Some(busiest) = config.busiest_path {
        (
            BUSIEST_TITLE,
            JobKind::BusiestPath {
                mode: busiest.mode,
                limit: busiest.limit,
            },
        )
    } else if let Some(analyze) = &config.analyze_path {
        (ANALYZE_TITLE, analyze_kind(&analyze.start, analyze.end.as_deref()))
    } else if config.easy {
        (
            EASY_TITLE,
            JobKind::Query {
                query: EASY_QUERY.to_string(),
            },
        )
    } else {
        return Err(Error::Config(
            "no task mode selected (use --easy, --task-file, --query, --busiest-path or --analyze-path)"
                .to_string(),
        ));
    };

    let title = config.title.as_deref().unwrap_or(default_title);
    let output = if config.format.writes_files() {
        config.output_file.clone()
    } else {
        std::path::PathBuf::new()
    };
    let job = Job::new(title, config.format, output, kind)
        .map_err(|e| Error::Config(e.to_string()))?;

    debug!(kind = job.kind().name(), title = job.title(), "Single job built");
    Ok(BuiltTasks {
        jobs: vec![job],
        warnings: Vec::new(),
    })
}

fn analyze_kind(start: &str, end: Option<&str>) -> JobKind {
    let start = NodeSelector::parse(start);
    let end = match start {
        NodeSelector::Class(_) => None,
        NodeSelector::Named(_) => end
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_uppercase),
    };
    JobKind::AnalyzePath { start, end }
}

fn job_from_entry(entry: TaskEntry) -> std::result::Result<Job, String> {
    let format: OutputFormat = entry.format.parse().map_err(|e| format!("{e}"))?;

    let kind = match entry.action {
        TaskAction::Query { query } => JobKind::Query { query },
        TaskAction::AnalyzePath { start, end } => analyze_kind(&start, end.as_deref()),
        TaskAction::BusiestPath { method, limit } => JobKind::BusiestPath {
            mode: method.parse::<BusiestMode>()?,
            limit,
        },
        TaskAction::ReportIndex => JobKind::ReportIndex,
        TaskAction::ZipTasks => JobKind::ZipTasks,
    };

    Job::new(entry.title, format, entry.path, kind).map_err(|e| e.to_string())
}
