//! Task-list reading.
//!
//! A task list is either a whole-file [`TaskDocument`] or a line-oriented
//! file. In line mode, line numbers are tracked for warnings and blank
//! lines and `#` comment lines are ignored. Lines that fail to parse,
//! including lines that are not valid UTF-8, are collected as
//! [`Warning`]s so the rest of the list still loads.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::task::{TaskDocument, TaskEntry};
use crate::warning::{Warning, WarningCollector};

/// The outcome of parsing a whole task list.
#[derive(Debug, Clone, Default)]
pub struct ParsedTaskList {
    /// Successfully parsed tasks, in file order.
    pub tasks: Vec<TaskEntry>,
    /// One warning per rejected line, in file order.
    pub warnings: Vec<Warning>,
}

impl ParsedTaskList {
    /// Returns `true` when no line produced a task.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Line reader for task lists.
///
/// Wraps any [`Read`] in a [`BufReader`] and keeps a 1-based line counter
/// (0 before the first line is read) for error reporting.
pub struct TaskListReader<R> {
    reader: BufReader<R>,
    line_number: usize,
}

impl<R: Read> TaskListReader<R> {
    /// Creates a new `TaskListReader` wrapping the given reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
        }
    }

    /// Returns the number of the last line read, or 0 before any reads.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads the next raw line, without its trailing newline.
    ///
    /// Returns `Ok(None)` at end of input. A line that is not valid UTF-8
    /// is consumed and counted, so the next call moves on to the line
    /// after it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the underlying reader fails and
    /// [`Error::InvalidUtf8`] if the line is not valid UTF-8.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        let mut bytes = Vec::new();
        let read = self.reader.read_until(b'\n', &mut bytes)?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        while matches!(bytes.last(), Some(b'\n' | b'\r')) {
            bytes.pop();
        }
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|source| Error::InvalidUtf8 {
                line_number: self.line_number,
                source,
            })
    }

    /// Parses every remaining line, collecting warnings for rejected lines.
    ///
    /// # Errors
    ///
    /// Returns an error only when reading fails; malformed lines never
    /// abort parsing.
    pub fn read_all(mut self) -> Result<ParsedTaskList> {
        let mut collected = Collected::default();

        loop {
            let line = match self.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(Error::InvalidUtf8 {
                    line_number,
                    source,
                }) => {
                    collected.record(line_number, Err(format!("line is not valid UTF-8: {source}")));
                    continue;
                }
                Err(error) => return Err(error),
            };

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            collected.record(self.line_number, TaskEntry::parse(self.line_number, trimmed));
        }

        Ok(collected.finish())
    }
}

#[derive(Default)]
struct Collected {
    tasks: Vec<TaskEntry>,
    warnings: WarningCollector,
}

impl Collected {
    fn record(&mut self, line_number: usize, parsed: std::result::Result<TaskEntry, String>) {
        match parsed {
            Ok(entry) => {
                debug!(line = line_number, title = %entry.title, "Parsed task");
                self.tasks.push(entry);
            }
            Err(error) => {
                let warning = Warning::MalformedTask { line_number, error };
                warn!("{warning}");
                self.warnings.add(warning);
            }
        }
    }

    fn finish(self) -> ParsedTaskList {
        ParsedTaskList {
            tasks: self.tasks,
            warnings: self.warnings.into_warnings(),
        }
    }
}

/// Parses a [`TaskDocument`], numbering tasks by their 1-based position in
/// the `tasks` array.
#[must_use]
pub fn parse_task_document(document: TaskDocument) -> ParsedTaskList {
    debug!(
        name = document.name.as_deref().unwrap_or_default(),
        count = document.tasks.len(),
        "Reading task document"
    );
    let mut collected = Collected::default();
    for (index, element) in document.tasks.into_iter().enumerate() {
        let position = index + 1;
        collected.record(position, TaskEntry::from_value(position, element));
    }
    collected.finish()
}

/// Parses a task list from any reader.
///
/// Input that decodes as a whole to a [`TaskDocument`] is read in document
/// mode; anything else is read line by line.
///
/// # Errors
///
/// Returns an error if reading fails. Malformed lines become warnings.
pub fn parse_task_list<R: Read>(mut reader: R) -> Result<ParsedTaskList> {
    let mut contents = Vec::new();
    reader.read_to_end(&mut contents)?;

    if let Ok(document) = serde_json::from_slice::<TaskDocument>(&contents) {
        return Ok(parse_task_document(document));
    }
    TaskListReader::new(contents.as_slice()).read_all()
}

/// Opens and parses a task-list file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn read_task_list(path: &Path) -> Result<ParsedTaskList> {
    let file = File::open(path)?;
    parse_task_list(file)
}
