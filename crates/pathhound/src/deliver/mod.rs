//! ResultDeliverer: write a job's result in its output format.
//!
//! `STDOUT` prints and writes no file. `CSV`, `HTML` and `JSON` write one
//! file under the output directory. `HTMLCSV` delivers the same result
//! twice, as HTML to `<path>.html` and as CSV to `<path>.csv`.

pub mod delimited;
pub mod html;
pub mod table;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use html::HtmlTemplate;

use crate::analyzer::PathResult;
use crate::job::{OutputFormat, with_suffix};
use crate::result::{JobResult, TabularResult};

/// Errors raised while delivering a result.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Writing an output file or standard output failed.
    #[error("cannot write {}: {source}", path.display())]
    Io {
        /// File that could not be written (`-` for standard output).
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// CSV encoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV and HTML need at least one column.
    #[error("nothing to tabulate: {format} output needs at least one column")]
    NothingToTabulate {
        /// Format that was asked for.
        format: OutputFormat,
    },

    /// A file-writing format was given no output path.
    #[error("{0} output needs an output path")]
    MissingPath(OutputFormat),
}

/// Writes job results under an output directory.
#[derive(Debug)]
pub struct ResultDeliverer<W> {
    output_dir: PathBuf,
    template: HtmlTemplate,
    stdout: W,
}

impl ResultDeliverer<io::Stdout> {
    /// A deliverer that prints to the process's standard output.
    #[must_use]
    pub fn to_stdout(output_dir: impl Into<PathBuf>, template: HtmlTemplate) -> Self {
        Self::new(output_dir, template, io::stdout())
    }
}

impl<W: Write> ResultDeliverer<W> {
    /// A deliverer that prints `STDOUT` results to `stdout`.
    pub fn new(output_dir: impl Into<PathBuf>, template: HtmlTemplate, stdout: W) -> Self {
        Self {
            output_dir: output_dir.into(),
            template,
            stdout,
        }
    }

    /// Directory output paths are relative to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Page template for HTML output.
    #[must_use]
    pub fn template(&self) -> &HtmlTemplate {
        &self.template
    }

    /// Consume the deliverer and return its standard-output sink.
    pub fn into_stdout(self) -> W {
        self.stdout
    }

    /// Deliver `result` as `format` to `output` (relative to the output
    /// directory).
    ///
    /// # Errors
    ///
    /// - [`DeliveryError::NothingToTabulate`] for CSV/HTML with zero columns.
    /// - [`DeliveryError::MissingPath`] for a file format with an empty path.
    /// - I/O and encoding errors from the sink.
    pub fn deliver(
        &mut self,
        result: &JobResult,
        format: OutputFormat,
        output: &Path,
        title: &str,
    ) -> Result<(), DeliveryError> {
        if format.writes_files() && output.as_os_str().is_empty() {
            return Err(DeliveryError::MissingPath(format));
        }

        match format {
            OutputFormat::Stdout => self.print(result, title),
            OutputFormat::Csv => {
                let csv = render_csv(&result.to_table(), format)?;
                self.write_file(output, &csv)
            }
            OutputFormat::Html => {
                let page = self.render_html(&result.to_table(), format, title)?;
                self.write_file(output, page.as_bytes())
            }
            OutputFormat::HtmlCsv => {
                let table = result.to_table();
                let page = self.render_html(&table, format, title)?;
                let csv = render_csv(&table, format)?;
                self.write_pair(output, page.as_bytes(), &csv)
            }
            OutputFormat::Json => self.write_json(result, output),
        }
    }

    // Both halves land or neither does.
    fn write_pair(&self, output: &Path, page: &[u8], csv: &[u8]) -> Result<(), DeliveryError> {
        let html_path = with_suffix(output, ".html");
        self.write_file(&html_path, page)?;
        self.write_file(&with_suffix(output, ".csv"), csv)
            .inspect_err(|_| {
                let orphan = self.output_dir.join(&html_path);
                if let Err(error) = std::fs::remove_file(&orphan) {
                    warn!(
                        path = %orphan.display(),
                        %error,
                        "Could not remove HTML half of a failed HTMLCSV delivery"
                    );
                }
            })
    }

    fn print(&mut self, result: &JobResult, title: &str) -> Result<(), DeliveryError> {
        let text = match result {
            JobResult::Table(table) => table::render_text_table(table),
            JobResult::Paths(paths) => render_path_summary(paths),
        };
        debug!(title, "Printing result");
        writeln!(self.stdout, "\n{text}")
            .and_then(|()| self.stdout.flush())
            .map_err(|source| DeliveryError::Io {
                path: PathBuf::from("-"),
                source,
            })
    }

    fn render_html(
        &self,
        table: &TabularResult,
        format: OutputFormat,
        title: &str,
    ) -> Result<String, DeliveryError> {
        check_columns(table, format)?;
        Ok(self.template.render_page(
            title,
            &html::render_table(table),
            Local::now().date_naive(),
        ))
    }

    fn write_json(&self, result: &JobResult, output: &Path) -> Result<(), DeliveryError> {
        let document = match result {
            JobResult::Table(table) => serde_json::to_vec_pretty(&json!({
                "keys": table.keys(),
                "results": table.rows(),
            }))?,
            JobResult::Paths(paths) => serde_json::to_vec_pretty(paths)?,
        };
        self.write_file(output, &document)
    }

    /// Write `contents` to `relative` under the output directory, creating
    /// parent directories as needed.
    pub(crate) fn write_file(&self, relative: &Path, contents: &[u8]) -> Result<(), DeliveryError> {
        let path = self.output_dir.join(relative);
        let io_error = |source: io::Error| DeliveryError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(&path, contents).map_err(io_error)?;
        info!(path = %path.display(), bytes = contents.len(), "Wrote report file");
        Ok(())
    }
}

fn render_csv(table: &TabularResult, format: OutputFormat) -> Result<Vec<u8>, DeliveryError> {
    check_columns(table, format)?;
    let mut buffer = Vec::new();
    delimited::write_csv(table, &mut buffer)?;
    Ok(buffer)
}

fn check_columns(table: &TabularResult, format: OutputFormat) -> Result<(), DeliveryError> {
    if table.column_count() == 0 {
        return Err(DeliveryError::NothingToTabulate { format });
    }
    Ok(())
}

/// Text dump of a path analysis: one line per load-bearing hop, then the
/// relationship ranking.
#[must_use]
pub fn render_path_summary(paths: &PathResult) -> String {
    if paths.graphs.is_empty() {
        return "No attack path with a load-bearing relationship was found.".to_string();
    }

    let mut lines = Vec::new();
    for graph in &paths.graphs {
        lines.push(format!("Path {} -> {}:", graph.start(), graph.target()));
        for actionable in &graph.actionables {
            lines.push(format!(
                "  Removing the relationship {} between {} and {} breaks the path!",
                actionable.relationship_name, actionable.from_node, actionable.to_node
            ));
        }
    }

    let ranking = TabularResult::new(
        vec![
            "target".to_string(),
            "relationship".to_string(),
            "paths".to_string(),
        ],
        paths
            .most_used_relationships
            .iter()
            .map(|usage| {
                vec![
                    json!(usage.target_node),
                    json!(usage.relationship_type),
                    json!(usage.count),
                ]
            })
            .collect(),
    )
    .unwrap_or_default();
    lines.push(String::new());
    lines.push("Most used relationships:".to_string());
    lines.push(table::render_text_table(&ranking));
    lines.join("\n")
}
