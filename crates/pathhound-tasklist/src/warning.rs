//! Warning types for non-fatal errors while parsing a task list.
//!
//! A task list is operator-written, so a typo on one line must not throw
//! away the rest of the batch. Each rejected line is recorded as a
//! [`Warning`] in a [`WarningCollector`] and parsing moves on.
//!
//! # Examples
//!
//! ```
//! use pathhound_tasklist::warning::{Warning, WarningCollector};
//!
//! let mut collector = WarningCollector::new();
//!
//! collector.add(Warning::MalformedTask {
//!     line_number: 5,
//!     error: "expected 4 elements, found 3".to_string(),
//! });
//!
//! let warnings = collector.into_warnings();
//! assert_eq!(warnings.len(), 1);
//! ```

/// A non-fatal warning that occurred while parsing a task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A line could not be parsed into a task.
    ///
    /// Covers invalid JSON, a wrong array arity, non-string elements and
    /// objects with an unknown `type` tag.
    MalformedTask {
        /// The 1-based line number where the error occurred.
        line_number: usize,
        /// A description of the parsing error.
        error: String,
    },

    /// A line parsed but was rejected by a later validation step.
    ///
    /// Consumers of the task list (for example the job builder) use this
    /// for semantic problems such as an unknown output format.
    SkippedLine {
        /// The 1-based line number that was skipped.
        line_number: usize,
        /// The reason the line was skipped.
        reason: String,
    },
}

impl Warning {
    /// Returns the line number associated with this warning.
    ///
    /// # Examples
    ///
    /// ```
    /// use pathhound_tasklist::warning::Warning;
    ///
    /// let warning = Warning::SkippedLine {
    ///     line_number: 42,
    ///     reason: "unknown format".to_string(),
    /// };
    /// assert_eq!(warning.line_number(), 42);
    /// ```
    #[must_use]
    pub fn line_number(&self) -> usize {
        match self {
            Self::MalformedTask { line_number, .. } | Self::SkippedLine { line_number, .. } => {
                *line_number
            }
        }
    }

    /// Returns a human-readable description of the warning.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::MalformedTask { line_number, error } => {
                format!("line {line_number}: malformed task: {error}")
            }
            Self::SkippedLine {
                line_number,
                reason,
            } => {
                format!("line {line_number}: skipped: {reason}")
            }
        }
    }

    /// Returns a static string identifying the warning kind.
    ///
    /// Useful for grouping warnings in log output without matching on the
    /// variants.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedTask { .. } => "malformed_task",
            Self::SkippedLine { .. } => "skipped_line",
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for Warning {}

/// Accumulates warnings while a task list is parsed.
///
/// Parsing is single-threaded, so the collector is a plain owned buffer.
#[derive(Debug, Clone, Default)]
pub struct WarningCollector {
    warnings: Vec<Warning>,
}

impl WarningCollector {
    /// Creates a new empty `WarningCollector`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a warning to the collector.
    pub fn add(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Returns the number of warnings collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Returns `true` if no warnings have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Returns the collected warnings in the order they were added.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Consumes the collector and returns all collected warnings.
    #[must_use]
    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

impl Extend<Warning> for WarningCollector {
    fn extend<T: IntoIterator<Item = Warning>>(&mut self, iter: T) {
        self.warnings.extend(iter);
    }
}
