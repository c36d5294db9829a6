//! Per-document-type column lists.
//!
//! Each type has a fixed full column list (display order) and a minimal
//! subset that is visible by default. The lists are data, loaded from
//! configuration when overridden.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;
use crate::types::{DocumentType, CORPUS_COLUMNS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    /// Every column shown for the type, in display order.
    pub full: Vec<String>,
    /// Columns visible in the simple table mode.
    pub minimal: Vec<String>,
}

impl ColumnSet {
    fn from_static(full: &[&str], minimal: &[&str]) -> Self {
        Self {
            full: full.iter().map(|c| c.to_string()).collect(),
            minimal: minimal.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn is_minimal(&self, column: &str) -> bool {
        self.minimal.iter().any(|c| c == column)
    }
}

/// Lookup table from document type to its column lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnCatalog {
    sets: BTreeMap<DocumentType, ColumnSet>,
}

impl Default for ColumnCatalog {
    fn default() -> Self {
        use DocumentType::*;

        let sets = [
            (
                Digibok,
                ColumnSet::from_static(
                    &[
                        "dhlabid", "urn", "authors", "title", "city", "timestamp", "year", "publisher",
                        "ddc", "subjects", "langs",
                    ],
                    &["urn", "authors", "title", "year"],
                ),
            ),
            (
                Digavis,
                ColumnSet::from_static(
                    &["dhlabid", "urn", "authors", "title", "city", "timestamp", "year"],
                    &["urn", "title", "timestamp"],
                ),
            ),
            (
                Digitidsskrift,
                ColumnSet::from_static(
                    &[
                        "dhlabid", "urn", "title", "city", "timestamp", "year", "publisher", "ddc",
                        "subjects", "langs",
                    ],
                    &["urn", "title", "timestamp"],
                ),
            ),
            (
                Digistorting,
                ColumnSet::from_static(&["dhlabid", "urn", "year"], &["urn", "year"]),
            ),
            (
                Digimanus,
                ColumnSet::from_static(
                    &["dhlabid", "urn", "authors", "title", "timestamp", "year"],
                    &["urn", "authors", "title", "year"],
                ),
            ),
            (
                Kudos,
                ColumnSet::from_static(
                    &["dhlabid", "urn", "authors", "title", "timestamp", "year", "publisher", "langs"],
                    &["urn", "authors", "title", "year"],
                ),
            ),
            (
                Nettavis,
                ColumnSet::from_static(
                    &["dhlabid", "urn", "title", "city", "timestamp", "year", "publisher", "langs"],
                    &["urn", "title", "timestamp"],
                ),
            ),
        ];

        Self {
            sets: sets.into_iter().collect(),
        }
    }
}

impl ColumnCatalog {
    /// Built-in lists with the given types replaced.
    pub fn with_overrides(overrides: BTreeMap<DocumentType, ColumnSet>) -> Self {
        let mut catalog = Self::default();
        catalog.sets.extend(overrides);
        catalog
    }

    pub fn get(&self, doctype: DocumentType) -> Option<&ColumnSet> {
        self.sets.get(&doctype)
    }

    /// Columns used when a corpus has no document type at all.
    pub fn untyped() -> ColumnSet {
        ColumnSet::from_static(&["dhlabid", "urn", "title", "year"], &["urn", "title", "year"])
    }

    /// Every set must name known columns, include the identifier, and keep
    /// its minimal list inside the full list.
    pub fn validate(&self) -> Result<(), CorpusError> {
        for doctype in DocumentType::ALL {
            let set = self.sets.get(&doctype).ok_or_else(|| {
                CorpusError::validation(format!("column catalog has no entry for {doctype}"))
            })?;
            if !set.full.iter().any(|c| c == "urn") {
                return Err(CorpusError::validation(format!(
                    "column list for {doctype} must include `urn`"
                )));
            }
            if let Some(unknown) = set.full.iter().find(|c| !CORPUS_COLUMNS.contains(&c.as_str())) {
                return Err(CorpusError::validation(format!(
                    "unknown column `{unknown}` in column list for {doctype}"
                )));
            }
            if let Some(stray) = set.minimal.iter().find(|c| !set.full.contains(c)) {
                return Err(CorpusError::validation(format!(
                    "minimal column `{stray}` for {doctype} is not in its full list"
                )));
            }
        }
        Ok(())
    }
}
