//! Normalized job results.
//!
//! Whatever a job computed, delivery sees either a table or a path
//! analysis. Path analyses carry a fixed tabular projection for the
//! table-shaped sinks (CSV, HTML).

use serde_json::Value;

use crate::analyzer::{BusiestPath, PathResult};
use crate::session::QueryResult;

/// Column keys of the tabular projection of a [`PathResult`].
pub const PATH_KEYS: [&str; 5] = ["start", "target", "relationship", "from", "to"];

/// Column keys of a busiest-path ranking.
pub const BUSIEST_KEYS: [&str; 2] = ["count", "name"];

/// Rows with a fixed set of column keys.
///
/// Every row has exactly one value per key. A result with no rows is
/// always `keys = []`, `rows = []`, so file formats report it as nothing
/// to tabulate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularResult {
    keys: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TabularResult {
    /// Create a table, or `None` if any row's arity differs from the keys.
    ///
    /// Zero rows always yield the empty table, whatever the keys.
    #[must_use]
    pub fn new(keys: Vec<String>, rows: Vec<Vec<Value>>) -> Option<Self> {
        rows.iter()
            .all(|row| row.len() == keys.len())
            .then(|| Self::from_aligned(keys, rows))
    }

    // Callers guarantee row arity.
    fn from_aligned(keys: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        if rows.is_empty() {
            return Self::empty();
        }
        Self { keys, rows }
    }

    /// A table with no columns and no rows.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Column keys.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Rows aligned with [`keys`](Self::keys).
    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.keys.len()
    }
}

impl From<QueryResult> for TabularResult {
    fn from(result: QueryResult) -> Self {
        let (keys, rows) = result.into_parts();
        Self::from_aligned(keys, rows)
    }
}

impl From<Vec<BusiestPath>> for TabularResult {
    fn from(ranking: Vec<BusiestPath>) -> Self {
        Self::from_aligned(
            BUSIEST_KEYS.iter().map(ToString::to_string).collect(),
            ranking
                .into_iter()
                .map(|entry| vec![Value::from(entry.count), Value::String(entry.name)])
                .collect(),
        )
    }
}

/// What a job hands to delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum JobResult {
    /// Query records or a busiest-path ranking.
    Table(TabularResult),
    /// Attack-path analysis.
    Paths(PathResult),
}

impl JobResult {
    /// Row count recorded in the manifest.
    ///
    /// For path analyses this is the number of retained paths.
    #[must_use]
    pub fn row_count(&self) -> usize {
        match self {
            Self::Table(table) => table.row_count(),
            Self::Paths(paths) => paths.graphs.len(),
        }
    }

    /// Table view for the table-shaped sinks.
    ///
    /// Path analyses become one row per load-bearing hop per path.
    #[must_use]
    pub fn to_table(&self) -> TabularResult {
        match self {
            Self::Table(table) => table.clone(),
            Self::Paths(paths) => {
                let rows = paths
                    .graphs
                    .iter()
                    .flat_map(|graph| {
                        graph.actionables.iter().map(move |actionable| {
                            vec![
                                Value::from(graph.start()),
                                Value::from(graph.target()),
                                Value::from(actionable.relationship_name.as_str()),
                                Value::from(actionable.from_node.as_str()),
                                Value::from(actionable.to_node.as_str()),
                            ]
                        })
                    })
                    .collect();
                TabularResult::from_aligned(PATH_KEYS.iter().map(ToString::to_string).collect(), rows)
            }
        }
    }
}

/// Text form of a cell: strings unquoted, null empty, anything else as JSON.
#[must_use]
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
