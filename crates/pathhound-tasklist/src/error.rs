//! Error types for task-list reading.

use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

/// The error type for task-list operations.
///
/// Only failures that prevent reading the file at all are errors. Problems
/// with individual lines are reported as [`Warning`](crate::Warning)s.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading the task list.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A line is not valid UTF-8.
    ///
    /// [`TaskListReader::read_all`](crate::TaskListReader::read_all) turns
    /// this into a warning for that line.
    #[error("line {line_number} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        /// The 1-based line number.
        line_number: usize,
        /// The decoding failure.
        #[source]
        source: FromUtf8Error,
    },
}

/// A specialized Result type for task-list operations.
pub type Result<T> = std::result::Result<T, Error>;
