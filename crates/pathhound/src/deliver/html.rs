//! HTML page rendering.
//!
//! A page is `<HTML><head>`, the inlined stylesheet, `</head><Body>`, the
//! header fragment, the table, the footer fragment and `</body></html>`.
//! Header and footer may contain title and date placeholders.

use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDate;

use crate::config::ReportConfig;
use crate::error::{Error, Result};
use crate::result::{TabularResult, render_cell};

/// Replaced with the report title in header and footer fragments.
pub const TITLE_PLACEHOLDER: &str = "--------PH_TITLE-------";

/// Replaced with the generation date (`YYYY-MM-DD`) in header and footer
/// fragments.
pub const DATE_PLACEHOLDER: &str = "--------PH_DATE-------";

/// Header, footer and stylesheet shared by every HTML page of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlTemplate {
    header: String,
    footer: String,
    css: String,
}

impl HtmlTemplate {
    /// A template from in-memory fragments.
    #[must_use]
    pub fn new(
        header: impl Into<String>,
        footer: impl Into<String>,
        css: impl Into<String>,
    ) -> Self {
        Self {
            header: header.into(),
            footer: footer.into(),
            css: css.into(),
        }
    }

    /// Read the configured fragment files. Unset files stay empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a configured file cannot be read.
    pub fn load(config: &ReportConfig) -> Result<Self> {
        Ok(Self {
            header: read_fragment(config.html_header.as_deref(), "header")?,
            footer: read_fragment(config.html_footer.as_deref(), "footer")?,
            css: read_fragment(config.html_css.as_deref(), "CSS")?,
        })
    }

    /// Wrap `body` in a full page.
    #[must_use]
    pub fn render_page(&self, title: &str, body: &str, date: NaiveDate) -> String {
        let mut page = String::from("<HTML><head>");
        if !self.css.is_empty() {
            page.push_str("<style>\n");
            page.push_str(&self.css);
            page.push_str("\n</style>");
        }
        page.push_str("</head><Body>");
        page.push_str(&substitute(&self.header, title, date));
        page.push_str(body);
        page.push_str(&substitute(&self.footer, title, date));
        page.push_str("</body></html>");
        page
    }
}

fn read_fragment(path: Option<&Path>, what: &str) -> Result<String> {
    let Some(path) = path else {
        return Ok(String::new());
    };
    std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "cannot read HTML {what} template {}: {e}",
            path.display()
        ))
    })
}

fn substitute(fragment: &str, title: &str, date: NaiveDate) -> String {
    fragment
        .replace(TITLE_PLACEHOLDER, &escape(title))
        .replace(DATE_PLACEHOLDER, &date.format("%Y-%m-%d").to_string())
}

/// Escape text for element content and attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render a table with every cell escaped.
#[must_use]
pub fn render_table(table: &TabularResult) -> String {
    let rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.iter().map(|value| escape(&render_cell(value))).collect())
        .collect();
    let keys: Vec<String> = table.keys().iter().map(|key| escape(key)).collect();
    render_markup_table(&keys, &rows)
}

/// Render a table whose header and cells are already HTML.
pub(crate) fn render_markup_table<K: AsRef<str>>(keys: &[K], rows: &[Vec<String>]) -> String {
    let mut html = String::from("<table>\n<thead>\n<tr>");
    for key in keys {
        let _ = write!(html, "<th>{}</th>", key.as_ref());
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{cell}</td>");
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date")
    }

    #[test]
    fn placeholders_are_substituted_in_header_and_footer() {
        let template = HtmlTemplate::new(
            "<h1>--------PH_TITLE-------</h1>",
            "<p>Generated --------PH_DATE-------</p>",
            "td { padding: 2px; }",
        );

        let page = template.render_page("Kerberoastable Users", "<table></table>", date());

        assert!(page.starts_with("<HTML><head><style>\ntd { padding: 2px; }\n</style></head><Body>"));
        assert!(page.contains("<h1>Kerberoastable Users</h1><table></table>"));
        assert!(page.contains("<p>Generated 2024-03-09</p>"));
        assert!(page.ends_with("</body></html>"));
    }

    #[test]
    fn substituted_title_is_escaped() {
        let template = HtmlTemplate::new("<h1>--------PH_TITLE-------</h1>", "", "");

        let page = template.render_page("Users <&> \"Admins\"", "", date());

        assert!(page.contains("<h1>Users &lt;&amp;&gt; &quot;Admins&quot;</h1>"), "got {page}");
    }

    #[test]
    fn page_without_css_has_no_style_element() {
        let page = HtmlTemplate::default().render_page("t", "x", date());
        assert_eq!(page, "<HTML><head></head><Body>x</body></html>");
    }

    #[test]
    fn table_cells_are_escaped() {
        let table = TabularResult::new(
            vec!["n.name".to_string()],
            vec![vec![json!("<script>&")]],
        )
        .expect("valid table");

        let html = render_table(&table);
        assert!(html.contains("<th>n.name</th>"));
        assert!(html.contains("<td>&lt;script&gt;&amp;</td>"));
    }

    #[test]
    fn load_reads_configured_fragments() {
        let mut header = NamedTempFile::new().expect("temp file");
        write!(header, "<h1>head</h1>").expect("write");

        let config = ReportConfig {
            html_header: Some(header.path().to_path_buf()),
            ..ReportConfig::default()
        };
        let template = HtmlTemplate::load(&config).expect("load");
        assert_eq!(template, HtmlTemplate::new("<h1>head</h1>", "", ""));
    }

    #[test]
    fn unreadable_fragment_is_a_config_error() {
        let config = ReportConfig {
            html_css: Some("/nonexistent/pathhound/style.css".into()),
            ..ReportConfig::default()
        };
        assert!(matches!(HtmlTemplate::load(&config), Err(Error::Config(_))));
    }
}
