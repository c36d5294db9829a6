use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

/// Environment variable overriding the metadata cache capacity.
pub const CACHE_SIZE_ENV: &str = "DHLAB_CORPUS_CACHE_SIZE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Query-defined corpora kept in memory.
    pub metadata_cache_capacity: usize,
    /// Upload-defined corpora kept in memory.
    pub upload_cache_capacity: usize,
    /// Header of the identifier column in uploaded spreadsheets.
    pub identifier_column: String,
    /// Path of the corpus spreadsheet inside an uploaded `.zip`.
    pub zip_corpus_entry: String,
    /// Largest uncompressed size accepted for that entry.
    pub max_zip_entry_bytes: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            metadata_cache_capacity: 64,
            upload_cache_capacity: 64,
            identifier_column: "urn".to_string(),
            zip_corpus_entry: "korpus.xlsx".to_string(),
            max_zip_entry_bytes: 32 * 1024 * 1024,
        }
    }
}

impl ResolverConfig {
    /// Apply [`CACHE_SIZE_ENV`] when it holds a positive integer.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(capacity) = std::env::var(CACHE_SIZE_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0)
        {
            self.metadata_cache_capacity = capacity;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.identifier_column.trim().is_empty() {
            return Err(ResolveError::Validation(
                "identifier_column must not be empty".into(),
            ));
        }
        if self.zip_corpus_entry.trim().is_empty() {
            return Err(ResolveError::Validation(
                "zip_corpus_entry must not be empty".into(),
            ));
        }
        if self.max_zip_entry_bytes == 0 {
            return Err(ResolveError::Validation(
                "max_zip_entry_bytes must be > 0".into(),
            ));
        }
        self.metadata_capacity()?;
        self.upload_capacity()?;
        Ok(())
    }

    pub(crate) fn metadata_capacity(&self) -> Result<NonZeroUsize, ResolveError> {
        NonZeroUsize::new(self.metadata_cache_capacity).ok_or_else(|| {
            ResolveError::Validation("metadata_cache_capacity must be > 0".into())
        })
    }

    pub(crate) fn upload_capacity(&self) -> Result<NonZeroUsize, ResolveError> {
        NonZeroUsize::new(self.upload_cache_capacity)
            .ok_or_else(|| ResolveError::Validation("upload_cache_capacity must be > 0".into()))
    }
}
