use std::path::Path;

use tracing::debug;

use crate::cell::CellValue;
use crate::error::ExtractError;
use crate::model::SheetResult;
use crate::serialize::serialize_values;

/// Sheet name used when the path has no file name.
pub const CSV_SHEET_NAME: &str = "CSV";

/// Re-emit a CSV file as a single sheet named after the file.
///
/// Invalid UTF-8 is replaced rather than rejected. Any parse error fails the
/// whole file.
pub fn extract_csv(path: &Path) -> Result<Vec<SheetResult>, ExtractError> {
    let bytes = std::fs::read(path)?;
    let text = parse_csv_text(&String::from_utf8_lossy(&bytes))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| CSV_SHEET_NAME.to_string());
    debug!(sheet = %name, bytes = bytes.len(), "extracted csv");

    Ok(vec![SheetResult::text(name, text)])
}

/// Read records and write them back with the common CSV dialect.
///
/// Blank lines come back as empty lines; the csv reader alone would drop
/// them.
pub fn parse_csv_text(input: &str) -> Result<String, ExtractError> {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(false).flexible(true);

    let mut rows = Vec::new();
    for line in split_records(input) {
        if line.is_empty() {
            rows.push(Vec::new());
            continue;
        }
        let mut reader = builder.from_reader(line.as_bytes());
        for record in reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|field| CellValue::Text(field.to_string()))
                    .collect::<Vec<_>>(),
            );
        }
    }
    serialize_values(rows)
}

/// Split input into raw records at line breaks outside quoted fields.
/// Terminators (`\n`, `\r\n` or a lone `\r`) are stripped; a trailing
/// terminator does not start another record.
fn split_records(input: &str) -> Vec<&str> {
    let bytes = input.as_bytes();
    let mut records = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut field_start = true;

    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if in_quotes {
            if b == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 1;
                } else {
                    in_quotes = false;
                }
            }
            i += 1;
            continue;
        }
        match b {
            b'"' if field_start => {
                in_quotes = true;
                field_start = false;
            }
            b',' => field_start = true,
            b'\n' | b'\r' => {
                records.push(&input[start..i]);
                if b == b'\r' && bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
                field_start = true;
            }
            _ => field_start = false,
        }
        i += 1;
    }
    if start < bytes.len() {
        records.push(&input[start..]);
    }
    records
}
