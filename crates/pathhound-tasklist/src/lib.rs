//! Task-list format for pathhound report batches.
//!
//! A task list is a line-oriented file. Each non-blank line describes one
//! job, either as a 4-element array literal
//!
//! ```text
//! ["Domain Users", "CSV", "users.csv", "MATCH (n:User) RETURN n.name"]
//! ```
//!
//! or as a tagged JSON object:
//!
//! ```text
//! {"type": "analyze_path", "title": "Computers to DA", "format": "HTML", "path": "c2da.html", "start": "COMPUTER"}
//! ```
//!
//! A whole-file JSON document `{"name": ..., "tasks": [...]}` holding the
//! same array or object shapes is accepted as well.
//!
//! Parsing is resilient: a malformed line becomes a [`Warning`] and the
//! remaining lines are still parsed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod reader;
pub mod task;
pub mod warning;

pub use error::{Error, Result};
pub use reader::{
    ParsedTaskList, TaskListReader, parse_task_document, parse_task_list, read_task_list,
};
pub use task::{REPORT_INDEX_SENTINEL, TaskAction, TaskDocument, TaskEntry, ZIP_TASKS_SENTINEL};
pub use warning::{Warning, WarningCollector};
