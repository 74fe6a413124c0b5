//! Task-line schema.
//!
//! Two task shapes are accepted. The array shape is the classic
//! `[title, format, path, query]` tuple; the object shape carries a `type`
//! tag and can express every task kind, including path analysis.
//!
//! Objects appear either one per line or inside a whole-file
//! [`TaskDocument`].

use serde::Deserialize;
use serde_json::Value;

/// Query-text value that turns an array line into a report-index task.
pub const REPORT_INDEX_SENTINEL: &str = "REPORT-INDEX";

/// Query-text value that turns an array line into an archive task.
pub const ZIP_TASKS_SENTINEL: &str = "ZIP-TASKS";

const DEFAULT_TITLE: &str = "Task";
const DEFAULT_FORMAT: &str = "STDOUT";
const DEFAULT_BUSIEST_METHOD: &str = "short";

/// What a task line asks for, before any semantic validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskAction {
    /// Run a graph query and tabulate its records.
    Query {
        /// Query text passed to the graph engine.
        query: String,
    },
    /// Find load-bearing relationships on attack paths.
    AnalyzePath {
        /// A node class name (`USER`, `GROUP`, ...) or an exact node name.
        start: String,
        /// Exact end node name; empty or absent means "any privileged group".
        #[serde(default)]
        end: Option<String>,
    },
    /// Rank start nodes by how many principals share their path.
    BusiestPath {
        /// `short` or `all`.
        #[serde(default = "default_method")]
        method: String,
        /// Keep only the first `limit` ranked entries.
        #[serde(default)]
        limit: Option<usize>,
    },
    /// Render the batch so far as an index page.
    ReportIndex,
    /// Archive the output files of the batch so far.
    ZipTasks,
}

fn default_method() -> String {
    DEFAULT_BUSIEST_METHOD.to_string()
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

/// One successfully parsed task-list line.
///
/// `format` and `path` are kept as written; turning them into typed values
/// is the consumer's job so that it can report its own validation failures
/// against [`line_number`](Self::line_number).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    /// The 1-based line the task came from.
    pub line_number: usize,
    /// Display title.
    pub title: String,
    /// Output format name as written (`STDOUT`, `CSV`, `HTML`, `HTMLCSV`, `JSON`).
    pub format: String,
    /// Output path relative to the batch output directory.
    pub path: String,
    /// The requested action.
    pub action: TaskAction,
}

/// A whole-file task list: `{"name": ..., "tasks": [...]}`.
///
/// Each element of `tasks` is kept as raw JSON so that one bad element is
/// reported on its own instead of failing the whole document.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskDocument {
    /// Batch name, informational only.
    #[serde(default)]
    pub name: Option<String>,
    /// Task elements, each an array or a task object.
    pub tasks: Vec<Value>,
}

#[derive(Deserialize)]
struct TaskObject {
    #[serde(default = "default_title", alias = "name")]
    title: String,
    #[serde(default = "default_format")]
    format: String,
    #[serde(default)]
    path: String,
    #[serde(flatten)]
    action: TaskAction,
}

impl TaskEntry {
    /// Parses a single non-blank line.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the line is not a
    /// 4-element array of strings or a valid task object.
    pub fn parse(line_number: usize, line: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(line).map_err(|e| e.to_string())?;
        Self::from_value(line_number, value)
    }

    /// Builds a task from an already-decoded JSON value.
    ///
    /// `line_number` is the position reported in warnings: the file line in
    /// line mode, the 1-based array position in a task document.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse).
    pub fn from_value(line_number: usize, value: Value) -> Result<Self, String> {
        match value {
            Value::Array(items) => Self::from_array(line_number, items),
            Value::Object(_) => {
                let object: TaskObject = serde_json::from_value(value).map_err(|e| e.to_string())?;
                let entry = Self {
                    line_number,
                    title: object.title,
                    format: object.format,
                    path: object.path,
                    action: object.action,
                };
                entry.check_action()?;
                Ok(entry)
            }
            other => Err(format!(
                "expected a 4-element array or a task object, found {}",
                json_kind(&other)
            )),
        }
    }

    fn from_array(line_number: usize, items: Vec<Value>) -> Result<Self, String> {
        if items.len() != 4 {
            return Err(format!("expected 4 elements, found {}", items.len()));
        }

        let mut fields = Vec::with_capacity(4);
        for (position, item) in items.into_iter().enumerate() {
            match item {
                Value::String(s) => fields.push(s),
                other => {
                    return Err(format!(
                        "element {} must be a string, found {}",
                        position + 1,
                        json_kind(&other)
                    ));
                }
            }
        }

        let [title, format, path, query]: [String; 4] = fields
            .try_into()
            .map_err(|_| "expected 4 elements".to_string())?;

        let action = match query.trim() {
            REPORT_INDEX_SENTINEL => TaskAction::ReportIndex,
            ZIP_TASKS_SENTINEL => TaskAction::ZipTasks,
            _ => TaskAction::Query { query },
        };

        let entry = Self {
            line_number,
            title,
            format,
            path,
            action,
        };
        entry.check_action()?;
        Ok(entry)
    }

    fn check_action(&self) -> Result<(), String> {
        match &self.action {
            TaskAction::Query { query } if query.trim().is_empty() => {
                Err("query text is empty".to_string())
            }
            TaskAction::AnalyzePath { start, .. } if start.trim().is_empty() => {
                Err("analyze_path requires a start node".to_string())
            }
            _ => Ok(()),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
