//! Plain-text tables for standard output.

use crate::result::{TabularResult, render_cell};

/// Printed instead of a table when a query matched nothing.
pub const NO_RECORDS: &str = "(no records)";

/// Render `table` as an aligned text table: a header row, a dashed rule
/// per column, then the rows. Numbers are right-aligned.
#[must_use]
pub fn render_text_table(table: &TabularResult) -> String {
    if table.row_count() == 0 {
        return NO_RECORDS.to_string();
    }

    let cells: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.iter().map(render_cell).collect())
        .collect();
    let numeric: Vec<bool> = (0..table.column_count())
        .map(|column| table.rows().iter().all(|row| row[column].is_number()))
        .collect();
    let widths: Vec<usize> = table
        .keys()
        .iter()
        .enumerate()
        .map(|(column, key)| {
            cells
                .iter()
                .map(|row| row[column].chars().count())
                .chain(std::iter::once(key.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(cells.len() + 2);
    lines.push(join_aligned(table.keys().iter().map(String::as_str), &widths, &numeric));
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &cells {
        lines.push(join_aligned(row.iter().map(String::as_str), &widths, &numeric));
    }
    lines.join("\n")
}

fn join_aligned<'a>(
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
    numeric: &[bool],
) -> String {
    cells
        .zip(widths.iter().zip(numeric))
        .map(|(cell, (width, right))| {
            if *right {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
