//! Reference Frequency Store.
//!
//! A fixed catalog maps reference names to two-column, header-less CSV files
//! (`word,frequency`). A table is read in full on first use and shared
//! read-only afterwards. Unknown names and unreadable files are errors; a
//! failed load is never cached and never turns into an empty table.
//!
//! Without a configured directory the store serves the baselines compiled
//! into this crate from `reference/`.
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use corpus::ReferenceTable;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ExploreError;

/// Explicit column names for the header-less reference files.
#[derive(Debug, Deserialize)]
struct ReferenceRow {
    word: String,
    frequency: f64,
}

/// File name → contents of the shipped baselines.
const BUILTIN: [(&str, &str); 3] = [
    ("generell.csv", include_str!("../reference/generell.csv")),
    ("avis.csv", include_str!("../reference/avis.csv")),
    ("bok.csv", include_str!("../reference/bok.csv")),
];

#[derive(Debug)]
pub struct ReferenceStore {
    dir: Option<PathBuf>,
    catalog: BTreeMap<String, String>,
    loaded: RwLock<HashMap<String, Arc<ReferenceTable>>>,
}

impl ReferenceStore {
    /// Reads catalog files from `dir`.
    pub fn new(dir: impl Into<PathBuf>, catalog: BTreeMap<String, String>) -> Self {
        Self::with_dir(Some(dir.into()), catalog)
    }

    /// Serves catalog files from the compiled-in baselines.
    pub fn builtin(catalog: BTreeMap<String, String>) -> Self {
        Self::with_dir(None, catalog)
    }

    pub fn with_dir(dir: Option<PathBuf>, catalog: BTreeMap<String, String>) -> Self {
        Self {
            dir,
            catalog,
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Names callers may ask for, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.catalog.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.catalog.contains_key(name)
    }

    /// The named table, loading it on first use.
    pub fn load(&self, name: &str) -> Result<Arc<ReferenceTable>, ExploreError> {
        let file = self
            .catalog
            .get(name)
            .ok_or_else(|| ExploreError::UnknownReference(name.to_string()))?;

        if let Some(table) = self
            .loaded
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
        {
            debug!(reference = name, "reference_cache_hit");
            return Ok(Arc::clone(table));
        }

        let table = match &self.dir {
            Some(dir) => {
                let path = dir.join(file);
                let table = read_reference(name, &path)?;
                info!(
                    reference = name,
                    path = %path.display(),
                    words = table.len(),
                    "reference_loaded"
                );
                table
            }
            None => {
                let table = builtin_reference(name, file)?;
                info!(reference = name, file = %file, words = table.len(), "reference_builtin_loaded");
                table
            }
        };
        let table = Arc::new(table);

        let mut loaded = self
            .loaded
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(Arc::clone(loaded.entry(name.to_string()).or_insert(table)))
    }
}

fn load_error(name: &str, reason: String) -> ExploreError {
    ExploreError::ReferenceLoad {
        name: name.to_string(),
        reason,
    }
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(false).trim(csv::Trim::All);
    builder
}

fn read_reference(name: &str, path: &Path) -> Result<ReferenceTable, ExploreError> {
    let reader = reader_builder()
        .from_path(path)
        .map_err(|e| load_error(name, format!("{}: {e}", path.display())))?;
    parse_reference(name, reader)
}

fn builtin_reference(name: &str, file: &str) -> Result<ReferenceTable, ExploreError> {
    let contents = BUILTIN
        .iter()
        .find(|(builtin, _)| *builtin == file)
        .map(|(_, contents)| *contents)
        .ok_or_else(|| {
            load_error(
                name,
                format!("`{file}` is not a built-in reference and no reference_dir is set"),
            )
        })?;
    parse_reference(name, reader_builder().from_reader(contents.as_bytes()))
}

fn parse_reference<R: io::Read>(
    name: &str,
    mut reader: csv::Reader<R>,
) -> Result<ReferenceTable, ExploreError> {
    let load_error = |reason: String| load_error(name, reason);

    let mut entries = Vec::new();
    for (line, row) in reader.deserialize::<ReferenceRow>().enumerate() {
        let row = row.map_err(|e| load_error(format!("line {}: {e}", line + 1)))?;
        if !row.frequency.is_finite() || row.frequency < 0.0 {
            return Err(load_error(format!(
                "line {}: frequency for `{}` must be a non-negative number",
                line + 1,
                row.word
            )));
        }
        entries.push((row.word, row.frequency));
    }
    Ok(ReferenceTable::new(name, entries))
}
