//! Spreadsheet output: CSV via the `csv` crate, XLSX via `rust_xlsxwriter`.
//!
//! Neither format carries a row-index column; the first row is always the
//! header. Files are written to a temporary file in the destination
//! directory and renamed into place, so a failed write never leaves a
//! truncated spreadsheet behind.

use crate::config::OutputFormat;
use crate::error::Pdf2SheetError;
use crate::table::CombinedTable;
use csv::WriterBuilder;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Name of the single worksheet in XLSX output.
pub const SHEET_NAME: &str = "Sheet1";

/// Write `table` to `path` in `format`, atomically.
pub fn write_table(
    table: &CombinedTable,
    format: OutputFormat,
    path: &Path,
) -> Result<(), Pdf2SheetError> {
    let bytes = match format {
        OutputFormat::Csv => write_csv_to_bytes(table).map_err(|e| {
            Pdf2SheetError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e.into(),
            }
        })?,
        OutputFormat::Xlsx => {
            write_xlsx_to_bytes(table).map_err(|e| Pdf2SheetError::SpreadsheetWriteFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?
        }
    };
    persist_atomically(path, &bytes)?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Render a table as CSV text.
pub fn write_csv_to_string(table: &CombinedTable) -> Result<String, Pdf2SheetError> {
    let bytes = write_csv_to_bytes(table)
        .map_err(|e| Pdf2SheetError::Internal(format!("csv encoding: {e}")))?;
    String::from_utf8(bytes).map_err(|e| Pdf2SheetError::Internal(format!("invalid utf-8 csv output: {e}")))
}

fn write_csv_to_bytes(table: &CombinedTable) -> Result<Vec<u8>, csv::Error> {
    let mut writer = WriterBuilder::new()
        .delimiter(b',')
        .flexible(false)
        .from_writer(Vec::<u8>::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error().into())
}

fn write_xlsx_to_bytes(table: &CombinedTable) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &bold)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let excel_row = r as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            match numeric_value(cell) {
                Some(n) => worksheet.write_number(excel_row, col as u16, n)?,
                None => worksheet.write_string(excel_row, col as u16, cell)?,
            };
        }
    }

    workbook.save_to_buffer()
}

/// Cells that read as plain decimal numbers are stored as numbers.
///
/// Leading zeros ("007"), leading plus signs and exponents stay text, so
/// identifiers and codes survive unchanged.
pub fn numeric_value(cell: &str) -> Option<f64> {
    let digits = cell.strip_prefix('-').unwrap_or(cell);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.") {
        return None;
    }
    if digits.starts_with('.') || digits.ends_with('.') {
        return None;
    }
    // f64 keeps 15 significant digits; longer runs are account numbers
    if digits.bytes().filter(u8::is_ascii_digit).count() > 15 {
        return None;
    }
    cell.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn persist_atomically(path: &Path, bytes: &[u8]) -> Result<(), Pdf2SheetError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let write_failed = |source: std::io::Error| Pdf2SheetError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_failed)?;
    tmp.write_all(bytes).map_err(write_failed)?;
    tmp.flush().map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;
    Ok(())
}
