//! Table Projection.
use corpus::{
    format_timestamp, parse_timestamp, ColumnCatalog, ColumnSet, Corpus, DocumentRecord,
    DocumentType, TimeGranularity,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::ExploreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayColumn {
    pub name: String,
    /// Shown in the simple table mode.
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    /// Title and identifier, or the identifier alone.
    pub label: String,
    pub link: String,
    /// One cell per [`DisplayTable::columns`] entry.
    pub cells: Vec<Value>,
}

/// Type-specific view of a corpus, ready for a presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayTable {
    pub document_type: Option<DocumentType>,
    /// strftime pattern used for the `timestamp` column.
    pub timeformat: &'static str,
    pub columns: Vec<DisplayColumn>,
    pub rows: Vec<DisplayRow>,
}

impl DisplayTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Project a corpus onto its document type's column list.
///
/// Fails with [`ExploreError::MixedDocumentTypes`] when rows disagree on the
/// type. An empty corpus projects to an untyped table with no columns.
pub fn project(corpus: &Corpus, catalog: &ColumnCatalog) -> Result<DisplayTable, ExploreError> {
    let document_type = corpus.document_type()?;
    let granularity = TimeGranularity::for_type(document_type);

    if corpus.is_empty() {
        return Ok(DisplayTable {
            document_type,
            timeformat: granularity.pattern(),
            columns: Vec::new(),
            rows: Vec::new(),
        });
    }

    let set = match document_type {
        Some(doctype) => catalog
            .get(doctype)
            .cloned()
            .ok_or_else(|| ExploreError::Validation(format!("no column list for {doctype}")))?,
        None => ColumnCatalog::untyped(),
    };

    let columns = display_columns(&set);
    let rows = corpus
        .rows()
        .iter()
        .map(|record| DisplayRow {
            label: record.label(),
            link: record.link(),
            cells: set
                .full
                .iter()
                .map(|column| cell(record, column, granularity))
                .collect(),
        })
        .collect();

    Ok(DisplayTable {
        document_type,
        timeformat: granularity.pattern(),
        columns,
        rows,
    })
}

fn display_columns(set: &ColumnSet) -> Vec<DisplayColumn> {
    set.full
        .iter()
        .map(|name| DisplayColumn {
            name: name.clone(),
            visible: set.is_minimal(name),
        })
        .collect()
}

fn cell(record: &DocumentRecord, column: &str, granularity: TimeGranularity) -> Value {
    if column == "timestamp" {
        let date = parse_timestamp(record.timestamp.as_deref());
        return Value::String(format_timestamp(date, granularity));
    }
    record.field(column)
}
