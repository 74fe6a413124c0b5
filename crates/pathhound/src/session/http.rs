//! Neo4j HTTP transactional endpoint.
//!
//! Each query is a single auto-committed transaction posted to
//! `{server}/db/{database}/tx/commit`. Transport failures and 5xx replies are
//! retried with exponential backoff; query errors and timeouts are not.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, trace};

use super::{GraphSession, Params, QueryResult, SessionError};
use crate::config::SessionConfig;
use crate::error::{Error, Result};

/// Query used to check connectivity and credentials.
const PROBE_QUERY: &str = "RETURN 1";

#[derive(Serialize)]
struct CommitRequest<'a> {
    statements: [Statement<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Statement<'a> {
    statement: &'a str,
    parameters: &'a Params,
    result_data_contents: [&'static str; 1],
}

#[derive(Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<EngineError>,
}

#[derive(Deserialize)]
struct StatementResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<DataRow>,
}

#[derive(Deserialize)]
struct DataRow {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct EngineError {
    code: String,
    message: String,
}

/// A [`GraphSession`] backed by a Neo4j server.
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    endpoint: String,
    config: SessionConfig,
}

impl HttpSession {
    /// Open a session and verify it with a trivial query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the server is unreachable, refuses the
    /// credentials, or answers the probe with an error.
    pub fn connect(config: SessionConfig) -> Result<Self> {
        let server = config.server.clone();
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Connect {
                server: server.clone(),
                source: SessionError::Transport(e.to_string()),
            })?;

        let endpoint = format!(
            "{}/db/{}/tx/commit",
            config.server.trim_end_matches('/'),
            config.database
        );
        let session = Self {
            client,
            endpoint,
            config,
        };

        debug!(server = %server, user = %session.config.username, "Probing graph server");
        session
            .run(PROBE_QUERY, &Params::new())
            .map_err(|source| Error::Connect {
                server: server.clone(),
                source,
            })?;
        info!(server = %server, database = %session.config.database, "Connected to graph server");

        Ok(session)
    }

    fn post_once(&self, body: &CommitRequest<'_>) -> Attempt {
        let response = match self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(body)
            .send()
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Attempt::Fatal(SessionError::Timeout(self.config.timeout));
            }
            Err(e) => return Attempt::Retry(SessionError::Transport(e.to_string())),
        };

        let status = response.status();
        if status.is_server_error() {
            return Attempt::Retry(SessionError::Transport(format!("HTTP {status}")));
        }
        if status.is_client_error() {
            let code = if status == reqwest::StatusCode::UNAUTHORIZED {
                "Neo.ClientError.Security.Unauthorized".to_string()
            } else {
                format!("HTTP {}", status.as_u16())
            };
            let message = response.text().unwrap_or_default();
            return Attempt::Fatal(SessionError::Query { code, message });
        }

        match response.json::<CommitResponse>() {
            Ok(parsed) => Attempt::Done(parsed),
            Err(e) if e.is_timeout() => Attempt::Fatal(SessionError::Timeout(self.config.timeout)),
            Err(e) => Attempt::Fatal(SessionError::Protocol(e.to_string())),
        }
    }
}

enum Attempt {
    Done(CommitResponse),
    Retry(SessionError),
    Fatal(SessionError),
}

impl GraphSession for HttpSession {
    fn run(&self, query: &str, params: &Params) -> std::result::Result<QueryResult, SessionError> {
        let body = CommitRequest {
            statements: [Statement {
                statement: query,
                parameters: params,
                result_data_contents: ["row"],
            }],
        };

        let mut backoff = self.config.initial_backoff;
        let mut last_error = SessionError::Transport("no attempt made".to_string());

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                debug!(
                    attempt,
                    max_retries = self.config.max_retries,
                    backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                    "Retrying query after transport failure"
                );
                std::thread::sleep(backoff);
                backoff = next_backoff(backoff, self.config.max_backoff);
            }

            trace!(query, "Posting statement");
            match self.post_once(&body) {
                Attempt::Done(response) => return into_query_result(response),
                Attempt::Fatal(error) => return Err(error),
                Attempt::Retry(error) => last_error = error,
            }
        }

        Err(last_error)
    }
}

fn next_backoff(current: Duration, ceiling: Duration) -> Duration {
    current.saturating_mul(2).min(ceiling)
}

fn into_query_result(response: CommitResponse) -> std::result::Result<QueryResult, SessionError> {
    if let Some(error) = response.errors.into_iter().next() {
        return Err(SessionError::Query {
            code: error.code,
            message: error.message,
        });
    }

    let result = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| SessionError::Protocol("response has no statement result".to_string()))?;

    QueryResult::new(
        result.columns,
        result.data.into_iter().map(|data| data.row).collect(),
    )
}
