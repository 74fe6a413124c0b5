//! Run configuration.
//!
//! The binary assembles these records from command-line flags and an
//! optional conventions file; the library only ever sees validated values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::job::{BusiestMode, OutputFormat};

/// Default graph server (Neo4j HTTP endpoint).
pub const DEFAULT_SERVER: &str = "http://localhost:7474";

/// Default per-query time ceiling.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection settings for the graph database.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Base URL of the server, e.g. `http://localhost:7474`.
    pub server: String,
    /// Database user.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name on the server.
    pub database: String,
    /// Time ceiling applied to every query.
    pub timeout: Duration,
    /// Retries for transport failures (not for query errors or timeouts).
    pub max_retries: u32,
    /// First retry delay; doubles per attempt.
    pub initial_backoff: Duration,
    /// Upper bound for the retry delay.
    pub max_backoff: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            username: "neo4j".to_string(),
            password: String::new(),
            database: "neo4j".to_string(),
            timeout: DEFAULT_QUERY_TIMEOUT,
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"*****")
            .field("database", &self.database)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

/// Where reports go and how HTML pages are decorated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Directory all job output paths are relative to.
    pub output_dir: PathBuf,
    /// HTML fragment placed before every table.
    pub html_header: Option<PathBuf>,
    /// HTML fragment placed after every table.
    pub html_footer: Option<PathBuf>,
    /// Stylesheet inlined into every page.
    pub html_css: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("reports"),
            html_header: None,
            html_footer: None,
            html_css: None,
        }
    }
}

/// Naming conventions of the analysed environment.
///
/// Path analysis needs to know what "privileged" and "membership" mean in
/// the graph. These differ between collectors and schema versions, so they
/// are configuration rather than literals in query text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Conventions {
    /// Name prefix that marks a privileged target group.
    pub privileged_group_prefix: String,
    /// Label of privileged target nodes.
    pub target_label: String,
    /// Label of the principals counted for blast radius.
    pub principal_label: String,
    /// Relationship type linking a principal to the groups it belongs to.
    pub membership_relationship: String,
    /// Label of path nodes that principals can inherit access through.
    pub structural_label: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            privileged_group_prefix: "DOMAIN ADMINS@".to_string(),
            target_label: "Group".to_string(),
            principal_label: "User".to_string(),
            membership_relationship: "MemberOf".to_string(),
            structural_label: "Group".to_string(),
        }
    }
}

impl Conventions {
    /// Load conventions from a YAML file; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read, is not valid
    /// YAML for this schema, or names an invalid label.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "cannot read conventions file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse conventions from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on invalid YAML or an invalid label.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let conventions: Self = serde_yaml::from_str(content)
            .map_err(|e| Error::Config(format!("invalid conventions: {e}")))?;
        conventions.validate()?;
        Ok(conventions)
    }

    /// Check that labels and relationship types are plain identifiers.
    ///
    /// These names are spliced into query patterns (the engine does not
    /// accept parameters there), so anything else is refused.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("target_label", &self.target_label),
            ("principal_label", &self.principal_label),
            ("membership_relationship", &self.membership_relationship),
            ("structural_label", &self.structural_label),
        ] {
            if !is_identifier(value) {
                return Err(Error::Config(format!(
                    "{field} must be a plain identifier, got '{value}'"
                )));
            }
        }
        if self.privileged_group_prefix.is_empty() {
            return Err(Error::Config(
                "privileged_group_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// An ad-hoc query given directly instead of through a task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdhocQuery {
    /// Query text.
    pub query: String,
}

/// A busiest-path request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusiestRequest {
    /// Candidate path set.
    pub mode: BusiestMode,
    /// Keep only the top `limit` entries.
    pub limit: Option<usize>,
}

/// An attack-path analysis request, as typed by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeRequest {
    /// A node class (`USER`, `GROUP`, ...) or a node name.
    pub start: String,
    /// End node name; ignored for class selectors.
    pub end: Option<String>,
}

/// The input modes the task builder chooses between.
///
/// More than one may be set; the builder honors exactly one, in the order
/// task file, ad-hoc query, busiest path, analyze path, easy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfig {
    /// Task-list file.
    pub task_file: Option<PathBuf>,
    /// Single ad-hoc query.
    pub query: Option<AdhocQuery>,
    /// Busiest-path ranking.
    pub busiest_path: Option<BusiestRequest>,
    /// Attack-path analysis.
    pub analyze_path: Option<AnalyzeRequest>,
    /// Smoke-test query against the user population.
    pub easy: bool,
    /// Title for single-job modes; each mode has its own default.
    pub title: Option<String>,
    /// Output format for single-job modes.
    pub format: OutputFormat,
    /// Output file for single-job modes, relative to the output directory.
    pub output_file: PathBuf,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            task_file: None,
            query: None,
            busiest_path: None,
            analyze_path: None,
            easy: false,
            title: None,
            format: OutputFormat::Stdout,
            output_file: PathBuf::from("pathhound-report"),
        }
    }
}
