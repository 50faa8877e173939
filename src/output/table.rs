//! Tab-separated rendering of the result set

use crate::output::record::{BusinessRecord, COLUMNS};
use std::io::{self, Write};

/// Writes a header line and one line per record
///
/// Every line carries exactly six cells. Tabs and line breaks inside values
/// are flattened to spaces so the column count never shifts.
pub fn write_table<W: Write>(out: &mut W, records: &[BusinessRecord]) -> io::Result<()> {
    writeln!(out, "{}", COLUMNS.join("\t"))?;
    for record in records {
        let cells = record.to_row().map(|cell| flatten(&cell));
        writeln!(out, "{}", cells.join("\t"))?;
    }
    Ok(())
}

fn flatten(cell: &str) -> String {
    cell.chars()
        .map(|c| if matches!(c, '\t' | '\r' | '\n') { ' ' } else { c })
        .collect()
}
