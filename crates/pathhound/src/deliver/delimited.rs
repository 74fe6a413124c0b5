//! CSV output.

use std::io::Write;

use crate::result::{TabularResult, render_cell};

/// Write `table` as CSV: the keys, then one record per row.
///
/// # Errors
///
/// Returns the underlying [`csv::Error`] if writing fails.
pub fn write_csv<W: Write>(table: &TabularResult, writer: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table.keys())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(render_cell))?;
    }
    writer.flush()?;
    Ok(())
}
