//! In-process [`GraphSession`] for tests and dry runs.
//!
//! A `FixtureSession` answers queries from a closure, so a test can model
//! exactly the graph it needs without a database. Every call is recorded
//! and can be inspected afterwards.
//!
//! ```
//! use pathhound::session::{FixtureSession, GraphSession, Params, QueryResult};
//! use serde_json::json;
//!
//! let session = FixtureSession::new(|_query, _params| {
//!     QueryResult::new(vec!["n.name".into()], vec![vec![json!("A")]])
//! });
//! let result = session.run("MATCH (n:User) RETURN n.name", &Params::new()).unwrap();
//! assert_eq!(result.len(), 1);
//! assert_eq!(session.calls().len(), 1);
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

use super::{GraphSession, Params, QueryResult, SessionError};

type Handler = dyn Fn(&str, &Params) -> Result<QueryResult, SessionError>;

/// A recorded call against a [`FixtureSession`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// The query text as sent.
    pub query: String,
    /// The bound parameters as sent.
    pub params: Params,
}

/// A [`GraphSession`] backed by a closure.
pub struct FixtureSession {
    handler: Box<Handler>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl std::fmt::Debug for FixtureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureSession")
            .field("handler", &"<closure>")
            .field("calls", &self.calls.borrow().len())
            .finish()
    }
}

impl FixtureSession {
    /// Answer every query with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &Params) -> Result<QueryResult, SessionError> + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Answer by exact query text; any other query fails like a syntax error.
    #[must_use]
    pub fn from_table(table: Vec<(String, QueryResult)>) -> Self {
        let table: HashMap<String, QueryResult> = table.into_iter().collect();
        Self::new(move |query, _| {
            table
                .get(query)
                .cloned()
                .ok_or_else(|| SessionError::Query {
                    code: "Neo.ClientError.Statement.SyntaxError".to_string(),
                    message: format!("no fixture for query: {query}"),
                })
        })
    }

    /// All calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }
}

impl GraphSession for FixtureSession {
    fn run(&self, query: &str, params: &Params) -> Result<QueryResult, SessionError> {
        self.calls.borrow_mut().push(RecordedCall {
            query: query.to_string(),
            params: params.clone(),
        });
        (self.handler)(query, params)
    }
}
