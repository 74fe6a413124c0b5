//! The job model: what a batch is made of.
//!
//! A [`Job`] is immutable once built. Its constructor enforces the output
//! path rules, so every job that reaches the runner can be delivered as
//! described.

use std::ffi::OsString;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// Where and how a job's result is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Aligned text table on standard output.
    Stdout,
    /// Comma-separated values with a header row.
    Csv,
    /// Self-contained HTML page.
    Html,
    /// HTML and CSV of the same result.
    HtmlCsv,
    /// JSON document.
    Json,
}

/// An output format name that is not one of the five known formats.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown output format '{0}' (expected STDOUT, CSV, HTML, HTMLCSV or JSON)")]
pub struct UnknownFormat(pub String);

impl OutputFormat {
    /// Every format, in display order.
    pub const ALL: [Self; 5] = [Self::Stdout, Self::Csv, Self::Html, Self::HtmlCsv, Self::Json];

    /// Canonical upper-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "STDOUT",
            Self::Csv => "CSV",
            Self::Html => "HTML",
            Self::HtmlCsv => "HTMLCSV",
            Self::Json => "JSON",
        }
    }

    /// Returns `true` if this format writes to the output directory.
    #[must_use]
    pub fn writes_files(self) -> bool {
        !matches!(self, Self::Stdout)
    }

    /// Files written for `path`, relative to the output directory.
    ///
    /// `HTMLCSV` appends `.html` and `.csv`; the single-file formats use
    /// `path` unchanged, and `STDOUT` writes nothing.
    #[must_use]
    pub fn output_files(self, path: &Path) -> Vec<PathBuf> {
        match self {
            Self::Stdout => Vec::new(),
            Self::Csv | Self::Html | Self::Json => vec![path.to_path_buf()],
            Self::HtmlCsv => vec![with_suffix(path, ".html"), with_suffix(path, ".csv")],
        }
    }
}

/// `path` with `suffix` appended to its final component.
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// A node type that analyze-path can start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClass {
    /// User accounts.
    User,
    /// Security groups.
    Group,
    /// Computer accounts.
    Computer,
    /// Domains.
    Domain,
    /// Group policy objects.
    Gpo,
    /// Organizational units.
    Ou,
}

impl NodeClass {
    const ALL: [Self; 6] = [
        Self::User,
        Self::Group,
        Self::Computer,
        Self::Domain,
        Self::Gpo,
        Self::Ou,
    ];

    /// Graph label for nodes of this class.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Group => "Group",
            Self::Computer => "Computer",
            Self::Domain => "Domain",
            Self::Gpo => "GPO",
            Self::Ou => "OU",
        }
    }

    /// Recognize a class name (`USER`, `computer`, ...).
    #[must_use]
    pub fn from_selector(selector: &str) -> Option<Self> {
        let selector = selector.trim();
        Self::ALL
            .into_iter()
            .find(|class| class.label().eq_ignore_ascii_case(selector))
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Start of an attack-path analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeSelector {
    /// Any node of the class.
    Class(NodeClass),
    /// The node with exactly this name.
    Named(String),
}

impl NodeSelector {
    /// Interpret operator input: a class name, or a node name to upper-case.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        NodeClass::from_selector(input).map_or_else(
            || Self::Named(input.trim().to_uppercase()),
            Self::Class,
        )
    }
}

impl fmt::Display for NodeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(class) => write!(f, "any {class}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Candidate path set for busiest-path ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BusiestMode {
    /// One shortest path per start node.
    #[default]
    Short,
    /// All shortest paths.
    All,
}

impl BusiestMode {
    /// Lower-case name as used in task lists.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::All => "all",
        }
    }
}

impl FromStr for BusiestMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "all" => Ok(Self::All),
            other => Err(format!("unknown busiest-path method '{other}' (expected short or all)")),
        }
    }
}

impl fmt::Display for BusiestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a job does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobKind {
    /// Run a query and tabulate its records.
    Query {
        /// Query text, passed to the engine verbatim.
        query: String,
    },
    /// Find attack paths and their load-bearing edges.
    AnalyzePath {
        /// Start selector.
        start: NodeSelector,
        /// End node name; `None` targets any privileged group.
        end: Option<String>,
    },
    /// Rank start nodes by blast radius.
    BusiestPath {
        /// Candidate path set.
        mode: BusiestMode,
        /// Keep only the top `limit` entries.
        limit: Option<usize>,
    },
    /// Render the batch so far as an index page.
    ReportIndex,
    /// Archive the batch's output files so far.
    ZipTasks,
}

impl JobKind {
    /// Returns `true` for the batch-level sentinel jobs.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::ReportIndex | Self::ZipTasks)
    }

    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Query { .. } => "query",
            Self::AnalyzePath { .. } => "analyze_path",
            Self::BusiestPath { .. } => "busiest_path",
            Self::ReportIndex => "report_index",
            Self::ZipTasks => "zip_tasks",
        }
    }
}

/// Reasons a job cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidJob {
    /// File-writing formats and sentinels need somewhere to write.
    #[error("{0} output needs an output path")]
    MissingPath(String),

    /// Output must stay inside the output directory.
    #[error("output path '{}' must be relative and must not contain '..'", .0.display())]
    EscapingPath(PathBuf),
}

/// One unit of work in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    title: String,
    format: OutputFormat,
    output: PathBuf,
    kind: JobKind,
}

impl Job {
    /// Build a job, checking its output path.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidJob`] if the path is absolute or climbs with `..`,
    /// or if a file-writing format or a sentinel has an empty path.
    pub fn new(
        title: impl Into<String>,
        format: OutputFormat,
        output: impl Into<PathBuf>,
        kind: JobKind,
    ) -> Result<Self, InvalidJob> {
        let output = output.into();

        if !output
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
        {
            return Err(InvalidJob::EscapingPath(output));
        }

        if output.as_os_str().is_empty() {
            if kind.is_sentinel() {
                return Err(InvalidJob::MissingPath(kind.name().to_string()));
            }
            if format.writes_files() {
                return Err(InvalidJob::MissingPath(format.to_string()));
            }
        }

        Ok(Self {
            title: title.into(),
            format,
            output,
            kind,
        })
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Output format.
    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Output path relative to the output directory (may be empty for STDOUT).
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// What the job does.
    #[must_use]
    pub fn kind(&self) -> &JobKind {
        &self.kind
    }
}
