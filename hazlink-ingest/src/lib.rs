//! Dataset ingestion — uploaded spreadsheet bytes to flat `RawRecord` rows
//!
//! The correlation core assumes well-formed key-value records; this crate
//! is the boundary that enforces it. Malformed files are rejected here with
//! an `IngestError` and never reach the core. The first worksheet's first
//! row is the header; each later row becomes one record. Blank cells are
//! omitted from the record so the normalizer's sentinel logic fires.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use hazlink_core::RawRecord;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook contains no worksheets")]
    EmptySheet,

    #[error("Unsupported upload format: {0}")]
    UnsupportedFormat(String),
}

/// Convert one spreadsheet cell to a JSON scalar. Blank and error cells
/// become None (the column is omitted from the record).
fn cell_to_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(Value::String(s.to_string()))
            }
        }
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => {
            // Spreadsheets store ticket numbers as floats; keep them integral
            if f.fract() == 0.0 && f.abs() < 9.0e15 {
                Some(Value::from(*f as i64))
            } else {
                serde_json::Number::from_f64(*f).map(Value::Number)
            }
        }
        Data::Bool(b) => Some(Value::from(*b)),
        other => Some(Value::String(other.to_string())),
    }
}

/// Parse the first worksheet of an XLSX workbook.
pub fn records_from_xlsx_bytes(bytes: &[u8]) -> Result<Vec<RawRecord>, IngestError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::EmptySheet)??;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|c| c.to_string().trim().to_string()).collect(),
        None => return Ok(Vec::new()),
    };

    let mut records = Vec::new();
    for row in rows {
        let mut record = RawRecord::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if header.is_empty() {
                continue;
            }
            if let Some(value) = cell_to_value(cell) {
                record.insert(header.clone(), value);
            }
        }
        if !record.is_empty() {
            records.push(record);
        }
    }

    tracing::debug!(rows = records.len(), "Parsed XLSX dataset");
    Ok(records)
}

/// Parse a CSV file with a header row. All values are strings.
pub fn records_from_csv_bytes(bytes: &[u8]) -> Result<Vec<RawRecord>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(Cursor::new(bytes));
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let mut record = RawRecord::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            let header = header.trim();
            let cell = cell.trim();
            if header.is_empty() || cell.is_empty() {
                continue;
            }
            record.insert(header.to_string(), Value::String(cell.to_string()));
        }
        if !record.is_empty() {
            records.push(record);
        }
    }

    tracing::debug!(rows = records.len(), "Parsed CSV dataset");
    Ok(records)
}

/// Dispatch an uploaded file on its extension.
pub fn records_from_upload(filename: &str, bytes: &[u8]) -> Result<Vec<RawRecord>, IngestError> {
    let ext = filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match ext.as_str() {
        "xlsx" | "xlsm" => records_from_xlsx_bytes(bytes),
        "csv" => records_from_csv_bytes(bytes),
        _ => Err(IngestError::UnsupportedFormat(filename.to_string())),
    }
}

// ============================================================================
// TESTS
// ============================================================================
