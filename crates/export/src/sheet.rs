//! Spreadsheet writers for the exported tables.
use corpus::{CollocateScore, Corpus, CORPUS_COLUMNS};
use explore::{CollocationTable, ConcordanceRow, ConcordanceTable, CONCORDANCE_COLUMNS};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::Value;

use crate::error::ExportError;

pub const CORPUS_SHEET: &str = "Korpus";
pub const CONCORDANCE_SHEET: &str = "Konkordanser";
pub const COLLOCATION_SHEET: &str = "Kollokasjoner";

/// Longest string a worksheet cell accepts.
const MAX_CELL_CHARS: usize = 32_767;

fn write_text(sheet: &mut Worksheet, row: u32, col: u16, text: &str) -> Result<(), ExportError> {
    if text.chars().count() > MAX_CELL_CHARS {
        let cut: String = text.chars().take(MAX_CELL_CHARS).collect();
        sheet.write_string(row, col, cut)?;
    } else {
        sheet.write_string(row, col, text)?;
    }
    Ok(())
}

/// Non-finite numbers and nulls leave the cell blank.
fn write_value(sheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<(), ExportError> {
    match value {
        Value::Null => {}
        Value::Number(n) => {
            if let Some(v) = n.as_f64().filter(|v| v.is_finite()) {
                sheet.write_number(row, col, v)?;
            }
        }
        Value::String(s) => write_text(sheet, row, col, s)?,
        Value::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        other => write_text(sheet, row, col, &other.to_string())?,
    }
    Ok(())
}

fn write_header(sheet: &mut Worksheet, columns: &[&str]) -> Result<(), ExportError> {
    for (col, name) in columns.iter().enumerate() {
        write_text(sheet, 0, col as u16, name)?;
    }
    Ok(())
}

fn new_sheet<'a>(workbook: &'a mut Workbook, name: &str) -> Result<&'a mut Worksheet, ExportError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    Ok(sheet)
}

fn write_corpus(sheet: &mut Worksheet, corpus: &Corpus) -> Result<(), ExportError> {
    write_header(sheet, &CORPUS_COLUMNS)?;
    for (idx, record) in corpus.rows().iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, name) in CORPUS_COLUMNS.iter().enumerate() {
            write_value(sheet, row, col as u16, &record.field(name))?;
        }
    }
    Ok(())
}

fn concordance_cells(row: &ConcordanceRow) -> [Value; 7] {
    [
        row.title.clone().map_or(Value::Null, Value::String),
        row.authors.clone().map_or(Value::Null, Value::String),
        row.year.map_or(Value::Null, Value::from),
        Value::String(row.display_time()),
        Value::String(row.timeformat.to_string()),
        Value::String(row.concordance.clone()),
        Value::String(row.link.clone()),
    ]
}

/// Concordance rows without an index column.
fn write_concordances(sheet: &mut Worksheet, table: &ConcordanceTable) -> Result<(), ExportError> {
    write_header(sheet, &CONCORDANCE_COLUMNS)?;
    for (idx, row) in table.rows.iter().enumerate() {
        for (col, cell) in concordance_cells(row).iter().enumerate() {
            write_value(sheet, idx as u32 + 1, col as u16, cell)?;
        }
    }
    Ok(())
}

/// Collocates keyed by word, scores in [`CollocateScore::SCORE_COLUMNS`] order.
fn write_collocations(sheet: &mut Worksheet, table: &CollocationTable) -> Result<(), ExportError> {
    let mut header = vec!["word"];
    header.extend(CollocateScore::SCORE_COLUMNS);
    write_header(sheet, &header)?;
    for (idx, score) in table.rows.iter().enumerate() {
        let row = idx as u32 + 1;
        write_text(sheet, row, 0, &score.word)?;
        for (col, name) in CollocateScore::SCORE_COLUMNS.iter().enumerate() {
            let value = score.score(name).map_or(Value::Null, |v| {
                serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
            });
            write_value(sheet, row, col as u16 + 1, &value)?;
        }
    }
    Ok(())
}

fn save(workbook: &mut Workbook) -> Result<Vec<u8>, ExportError> {
    Ok(workbook.save_to_buffer()?)
}

/// The corpus, one document per row under the full column list.
pub fn corpus_workbook(corpus: &Corpus) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    write_corpus(new_sheet(&mut workbook, CORPUS_SHEET)?, corpus)?;
    save(&mut workbook)
}

pub fn concordance_workbook(table: &ConcordanceTable) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    write_concordances(new_sheet(&mut workbook, CONCORDANCE_SHEET)?, table)?;
    save(&mut workbook)
}

pub fn collocation_workbook(table: &CollocationTable) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    write_collocations(new_sheet(&mut workbook, COLLOCATION_SHEET)?, table)?;
    save(&mut workbook)
}
