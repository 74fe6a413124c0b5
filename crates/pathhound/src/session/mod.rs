//! The graph-query capability the rest of the crate depends on.
//!
//! Everything that talks to the graph engine goes through [`GraphSession`]:
//! a query string plus bound parameters in, an ordered set of records out.
//! Connection lifecycle, timeouts and retries belong to the implementation.
//!
//! - [`http::HttpSession`] talks to a Neo4j server over its HTTP
//!   transactional endpoint.
//! - [`fixture::FixtureSession`] answers from an in-process closure and is
//!   what the test suites run against.

pub mod fixture;
pub mod http;

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

pub use fixture::FixtureSession;
pub use http::HttpSession;

/// Bound query parameters, keyed by parameter name (without the `$`).
pub type Params = serde_json::Map<String, Value>;

/// Build a parameter map from name/value pairs.
#[must_use]
pub fn params<const N: usize>(pairs: [(&str, Value); N]) -> Params {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Errors raised by a [`GraphSession`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// The engine rejected or failed the query.
    #[error("query failed ({code}): {message}")]
    Query {
        /// Engine status code, e.g. `Neo.ClientError.Statement.SyntaxError`.
        code: String,
        /// Engine-provided message.
        message: String,
    },

    /// The query exceeded its time ceiling.
    #[error("query timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Protocol(String),
}

impl SessionError {
    /// Returns `true` for failures worth retrying (transport-level only).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Executes graph queries.
///
/// Implementations must return rows whose length equals the number of keys;
/// [`QueryResult::new`] enforces this for them.
pub trait GraphSession {
    /// Run `query` with `params` bound and return every record.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] when the engine rejects the query, the
    /// query times out, or the transport fails.
    fn run(&self, query: &str, params: &Params) -> Result<QueryResult, SessionError>;
}

impl<S: GraphSession + ?Sized> GraphSession for &S {
    fn run(&self, query: &str, params: &Params) -> Result<QueryResult, SessionError> {
        (**self).run(query, params)
    }
}

impl<S: GraphSession + ?Sized> GraphSession for Box<S> {
    fn run(&self, query: &str, params: &Params) -> Result<QueryResult, SessionError> {
        (**self).run(query, params)
    }
}

/// Records returned by one query, with their column keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    keys: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// Create a result, checking that every row matches the key count.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Protocol`] naming the first row whose arity
    /// differs from `keys.len()`.
    pub fn new(keys: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, SessionError> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != keys.len())
        {
            return Err(SessionError::Protocol(format!(
                "row {index} has {} values for {} keys",
                row.len(),
                keys.len()
            )));
        }
        Ok(Self { keys, rows })
    }

    /// A result with no keys and no rows.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Column keys in engine order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Raw rows, each aligned with [`keys`](Self::keys).
    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when the query matched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate records with by-name field access.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|values| Record {
            keys: &self.keys,
            values,
        })
    }

    /// Split into keys and rows.
    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.keys, self.rows)
    }
}

/// One record of a [`QueryResult`].
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    keys: &'a [String],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    /// Field value by column name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.keys
            .iter()
            .position(|key| key == name)
            .and_then(|index| self.values.get(index))
    }

    /// Field value as a string slice, if it is a string.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&'a str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Values in column order.
    #[must_use]
    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}
