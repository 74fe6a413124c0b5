//! ReportIndexer: one HTML page listing the batch so far.

use std::fmt::Write as _;
use std::path::{Component, Path};

use chrono::NaiveDate;

use crate::deliver::HtmlTemplate;
use crate::deliver::html::{escape, render_markup_table};
use crate::job::OutputFormat;
use crate::manifest::{BatchManifest, ManifestEntry};

/// Page title of the index.
pub const INDEX_TITLE: &str = "Full Report Details";

/// Column headings of the index table.
pub const INDEX_KEYS: [&str; 3] = ["Title", "Count", "Further Details"];

/// Renders the index page with the run's HTML template.
#[derive(Debug, Clone, Copy)]
pub struct ReportIndexer<'a> {
    template: &'a HtmlTemplate,
}

impl<'a> ReportIndexer<'a> {
    /// An indexer using `template` for the page frame.
    #[must_use]
    pub fn new(template: &'a HtmlTemplate) -> Self {
        Self { template }
    }

    /// Render one row per manifest entry, in manifest order.
    ///
    /// `index_path` is where the page will be written, relative to the
    /// output directory; links are made relative to it.
    #[must_use]
    pub fn render(&self, manifest: &BatchManifest, index_path: &Path, date: NaiveDate) -> String {
        let prefix = "../".repeat(depth(index_path));
        let rows: Vec<Vec<String>> = manifest
            .entries()
            .iter()
            .map(|entry| {
                vec![
                    escape(&entry.title),
                    entry.row_count.to_string(),
                    links(entry, &prefix),
                ]
            })
            .collect();

        self.template
            .render_page(INDEX_TITLE, &render_markup_table(&INDEX_KEYS, &rows), date)
    }
}

/// Number of directories above `path` inside the output directory.
fn depth(path: &Path) -> usize {
    path.components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .count()
        .saturating_sub(1)
}

fn links(entry: &ManifestEntry, prefix: &str) -> String {
    let files = entry.files();
    let labels: &[&str] = match entry.format {
        OutputFormat::Stdout => return "-".to_string(),
        OutputFormat::Html => &["Details"],
        OutputFormat::Csv => &["CSV"],
        OutputFormat::Json => &["JSON"],
        OutputFormat::HtmlCsv => &["Details", "CSV"],
    };

    let mut html = String::new();
    for (file, label) in files.iter().zip(labels) {
        if !html.is_empty() {
            html.push(' ');
        }
        let href = format!("{prefix}{}", file.to_string_lossy().replace('\\', "/"));
        let _ = write!(html, "<a href=\"{}\">{label}</a>", escape(&href));
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(title: &str, rows: usize, file: &str, format: OutputFormat) -> ManifestEntry {
        ManifestEntry {
            title: title.to_string(),
            row_count: rows,
            output_file: PathBuf::from(file),
            format,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).expect("valid date")
    }

    #[test]
    fn rows_follow_manifest_order_with_format_links() {
        let manifest: BatchManifest = vec![
            entry("Domain Users", 3, "users.html", OutputFormat::Html),
            entry("Computers", 5, "computers", OutputFormat::HtmlCsv),
            entry("Console only", 1, "", OutputFormat::Stdout),
        ]
        .into_iter()
        .collect();

        let template = HtmlTemplate::default();
        let page = ReportIndexer::new(&template).render(&manifest, Path::new("index.html"), date());

        assert!(page.contains("<th>Title</th><th>Count</th><th>Further Details</th>"));
        assert!(page.contains(
            "<tr><td>Domain Users</td><td>3</td><td><a href=\"users.html\">Details</a></td></tr>"
        ));
        assert!(page.contains(
            "<a href=\"computers.html\">Details</a> <a href=\"computers.csv\">CSV</a>"
        ));
        assert!(page.contains("<td>Console only</td><td>1</td><td>-</td>"));
        let users = page.find("Domain Users").expect("users row");
        let computers = page.find("Computers").expect("computers row");
        assert!(users < computers);
    }

    #[test]
    fn links_climb_out_of_nested_index_location() {
        let manifest: BatchManifest =
            std::iter::once(entry("Users", 2, "users.csv", OutputFormat::Csv)).collect();

        let template = HtmlTemplate::default();
        let page =
            ReportIndexer::new(&template).render(&manifest, Path::new("idx/main.html"), date());

        assert!(page.contains("<a href=\"../users.csv\">CSV</a>"));
    }

    #[test]
    fn titles_are_escaped() {
        let manifest: BatchManifest =
            std::iter::once(entry("<b>x</b>", 0, "x.html", OutputFormat::Html)).collect();
        let template = HtmlTemplate::default();
        let page = ReportIndexer::new(&template).render(&manifest, Path::new("i.html"), date());
        assert!(page.contains("&lt;b&gt;x&lt;/b&gt;"));
    }

    #[test]
    fn template_title_placeholder_gets_index_title() {
        let template = HtmlTemplate::new("<h1>--------PH_TITLE-------</h1>", "", "");
        let page = ReportIndexer::new(&template).render(
            &BatchManifest::new(),
            Path::new("index.html"),
            date(),
        );
        assert!(page.contains("<h1>Full Report Details</h1>"));
    }
}
