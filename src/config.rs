//! YAML configuration for the corpus explorer.
//!
//! One file configures every stage. All sections are optional and fall back
//! to their defaults.
//!
//! ```yaml
//! version: "1.0"
//! name: "lokal utvikling"
//!
//! client:
//!   base_url: "https://api.nb.no/dhlab"
//!   timeout_secs: 60
//!   connect_timeout_secs: 10
//!
//! resolver:
//!   metadata_cache_capacity: 64
//!   upload_cache_capacity: 64
//!   identifier_column: "urn"
//!   zip_corpus_entry: "korpus.xlsx"
//!   max_zip_entry_bytes: 33554432
//!
//! explore:
//!   max_concordance_limit: 5000
//!   max_window: 50
//!   default_sample_size: 20000
//!   request_timeout_secs: 120
//!   reference_dir: "./reference"   # omit for the built-in baselines
//!   cloud_width: 800
//!   cloud_height: 400
//!
//! columns:
//!   digistorting:
//!     full: ["dhlabid", "urn", "year"]
//!     minimal: ["urn", "year"]
//! ```
//!
//! `DHLAB_CORPUS_CACHE_SIZE` overrides `resolver.metadata_cache_capacity`
//! when it holds a positive integer.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use client::ClientConfig;
use corpus::{ColumnCatalog, ColumnSet, DocumentType};
use explore::ExploreConfig;
use resolver::ResolverConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct KorpusConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub explore: ExploreConfig,

    /// Per-type replacements for the built-in column lists.
    #[serde(default)]
    pub columns: BTreeMap<DocumentType, ColumnSet>,
}

impl KorpusConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let mut config: KorpusConfig = serde_yaml::from_str(yaml)?;
        config.resolver = config.resolver.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Built-in column lists with this file's overrides applied.
    pub fn column_catalog(&self) -> ColumnCatalog {
        ColumnCatalog::with_overrides(self.columns.clone())
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        let invalid = |section: &str, err: &dyn std::fmt::Display| {
            ConfigLoadError::Validation(format!("{section}: {err}"))
        };
        self.client.validate().map_err(|e| invalid("client", &e))?;
        self.resolver.validate().map_err(|e| invalid("resolver", &e))?;
        self.explore.validate().map_err(|e| invalid("explore", &e))?;
        self.column_catalog()
            .validate()
            .map_err(|e| invalid("columns", &e))?;
        Ok(())
    }
}

impl Default for KorpusConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            client: ClientConfig::default(),
            resolver: ResolverConfig::default(),
            explore: ExploreConfig::default(),
            columns: BTreeMap::new(),
        }
    }
}
