//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use pathhound::session::{FixtureSession, Params, QueryResult, SessionError};
use serde_json::{Value, json};

/// Build a query result from string keys and JSON rows.
pub fn table(keys: &[&str], rows: Vec<Vec<Value>>) -> QueryResult {
    QueryResult::new(keys.iter().map(ToString::to_string).collect(), rows)
        .expect("fixture rows match keys")
}

/// One discovered path: node names, relationship types and relationship ids.
pub struct FixturePath {
    pub nodes: Vec<&'static str>,
    pub relationships: Vec<&'static str>,
    pub ids: Vec<i64>,
}

impl FixturePath {
    pub fn new(nodes: &[&'static str], relationships: &[&'static str], ids: &[i64]) -> Self {
        Self {
            nodes: nodes.to_vec(),
            relationships: relationships.to_vec(),
            ids: ids.to_vec(),
        }
    }

    fn row(&self) -> Vec<Value> {
        vec![json!(self.nodes), json!(self.relationships), json!(self.ids)]
    }
}

/// A session modelling a graph for path analysis.
///
/// Discovery queries return `paths`; a bypass check reports a detour for
/// every relationship id in `bypassable`.
pub fn path_session(paths: Vec<FixturePath>, bypassable: &[i64]) -> FixtureSession {
    let bypassable = bypassable.to_vec();
    FixtureSession::new(move |query, params| {
        if query.contains("AS relationship_ids") {
            Ok(table(
                &["nodes", "relationships", "relationship_ids"],
                paths.iter().map(FixturePath::row).collect(),
            ))
        } else if query.contains("AS bypassed") {
            let id = params
                .get("relationship_id")
                .and_then(Value::as_i64)
                .expect("bypass check binds relationship_id");
            Ok(table(&["bypassed"], vec![vec![json!(bypassable.contains(&id))]]))
        } else {
            Err(unexpected(query))
        }
    })
}

/// A session for busiest-path ranking: `starts` in discovery order and the
/// principal count for each start.
pub fn busiest_session(starts: &[&'static str], counts: &[(&'static str, u64)]) -> FixtureSession {
    let starts: Vec<Value> = starts.iter().map(|s| json!(s)).collect();
    let counts: HashMap<&'static str, u64> = counts.iter().copied().collect();
    FixtureSession::new(move |query, params| {
        if query.contains("RETURN n.name AS start") {
            Ok(table(&["start"], starts.iter().map(|s| vec![s.clone()]).collect()))
        } else if query.contains("AS principals") {
            let start = param_str(params, "start");
            let count = counts.get(start.as_str()).copied().unwrap_or(0);
            Ok(table(&["principals"], vec![vec![json!(count)]]))
        } else {
            Err(unexpected(query))
        }
    })
}

/// A string parameter, or an empty string.
pub fn param_str(params: &Params, name: &str) -> String {
    params
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// The error an engine raises for a query it cannot parse.
pub fn syntax_error(query: &str) -> SessionError {
    SessionError::Query {
        code: "Neo.ClientError.Statement.SyntaxError".to_string(),
        message: format!("Invalid input near: {query}"),
    }
}

fn unexpected(query: &str) -> SessionError {
    SessionError::Protocol(format!("fixture has no answer for: {query}"))
}
