//! Identifier extraction from uploaded spreadsheets.
//!
//! Supported uploads, chosen by file extension (case-insensitive):
//!
//! | Extension | Reader |
//! |-----------|--------|
//! | `.csv` | header row, comma separated |
//! | `.xls`, `.xlsx` | first worksheet, header row |
//! | `.zip` | the corpus spreadsheet at a fixed entry path |
//!
//! The identifier column is located by header name. Blank cells are dropped;
//! everything else is returned in file order.
use std::io::{Cursor, Read};

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Spreadsheet,
    Zip,
}

impl UploadFormat {
    pub fn from_filename(filename: &str) -> Result<Self, ResolveError> {
        let lower = filename.trim().to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Ok(UploadFormat::Csv)
        } else if lower.ends_with(".xls") || lower.ends_with(".xlsx") {
            Ok(UploadFormat::Spreadsheet)
        } else if lower.ends_with(".zip") {
            Ok(UploadFormat::Zip)
        } else {
            Err(ResolveError::UnsupportedFileFormat {
                filename: filename.to_string(),
            })
        }
    }
}

/// Where to find identifiers inside an upload.
#[derive(Debug, Clone, Copy)]
pub struct UploadLayout<'a> {
    pub identifier_column: &'a str,
    pub zip_corpus_entry: &'a str,
    pub max_zip_entry_bytes: u64,
}

/// Read the identifier column of an uploaded file.
pub fn read_identifiers(
    filename: &str,
    bytes: &[u8],
    layout: UploadLayout<'_>,
) -> Result<Vec<String>, ResolveError> {
    match UploadFormat::from_filename(filename)? {
        UploadFormat::Csv => identifiers_from_csv(bytes, layout.identifier_column),
        UploadFormat::Spreadsheet => identifiers_from_workbook(bytes, layout.identifier_column),
        UploadFormat::Zip => {
            let inner = read_zip_entry(bytes, layout.zip_corpus_entry, layout.max_zip_entry_bytes)?;
            identifiers_from_workbook(&inner, layout.identifier_column)
        }
    }
}

fn identifiers_from_csv(bytes: &[u8], column: &str) -> Result<Vec<String>, ResolveError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| ResolveError::Spreadsheet(format!("invalid CSV header: {e}")))?;
    let idx = headers
        .iter()
        .position(|h| h.trim().trim_start_matches('\u{feff}') == column)
        .ok_or_else(|| ResolveError::MissingColumn {
            column: column.to_string(),
        })?;

    let mut identifiers = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ResolveError::Spreadsheet(format!("invalid CSV row: {e}")))?;
        if let Some(value) = record.get(idx).map(str::trim).filter(|v| !v.is_empty()) {
            identifiers.push(value.to_string());
        }
    }
    Ok(identifiers)
}

fn identifiers_from_workbook(bytes: &[u8], column: &str) -> Result<Vec<String>, ResolveError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ResolveError::Spreadsheet(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ResolveError::Spreadsheet("workbook has no worksheets".into()))?
        .map_err(|e| ResolveError::Spreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let missing = || ResolveError::MissingColumn {
        column: column.to_string(),
    };
    let header = rows.next().ok_or_else(missing)?;
    let idx = header
        .iter()
        .position(|cell| cell_text(cell).as_deref() == Some(column))
        .ok_or_else(missing)?;

    Ok(rows
        .filter_map(|row| row.get(idx).and_then(cell_text))
        .collect())
}

/// Decompress `entry`, giving up once more than `max_bytes` come out. The
/// sizes in the archive headers are not trusted.
fn read_zip_entry(bytes: &[u8], entry: &str, max_bytes: u64) -> Result<Vec<u8>, ResolveError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ResolveError::Spreadsheet(format!("invalid zip archive: {e}")))?;
    let mut file = match archive.by_name(entry) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => {
            return Err(ResolveError::MissingCorpusEntry {
                entry: entry.to_string(),
            })
        }
        Err(e) => return Err(ResolveError::Spreadsheet(format!("invalid zip archive: {e}"))),
    };
    let mut inner = Vec::new();
    file.by_ref()
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut inner)
        .map_err(|e| ResolveError::Spreadsheet(format!("cannot read {entry}: {e}")))?;
    if inner.len() as u64 > max_bytes {
        return Err(ResolveError::EntryTooLarge {
            entry: entry.to_string(),
            max_bytes,
        });
    }
    Ok(inner)
}

/// Trimmed text of a cell, `None` for blanks. Whole floats print without
/// a fractional part so numeric identifiers survive the round trip.
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Int(i) => i.to_string(),
        other => other.to_string().trim().to_string(),
    };
    (!text.is_empty()).then_some(text)
}
