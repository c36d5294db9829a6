use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExploreError;

/// Limits and rendering settings for the exploration pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreConfig {
    /// Largest concordance `limit` accepted.
    pub max_concordance_limit: u32,
    /// Largest context window (tokens per side) for concordances and collocations.
    pub max_window: u32,
    /// Documents sampled for collocations when the request does not say.
    pub default_sample_size: u32,
    pub max_sample_size: u32,
    /// Deadline for a single call to the analysis service.
    pub request_timeout_secs: u64,
    /// Directory holding the reference frequency files. Unset means the
    /// baselines shipped with the crate.
    pub reference_dir: Option<PathBuf>,
    /// Reference name → file name inside `reference_dir`.
    pub references: BTreeMap<String, String>,
    pub cloud_width: u32,
    pub cloud_height: u32,
    pub cloud_background: [u8; 3],
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            max_concordance_limit: 5000,
            max_window: 50,
            default_sample_size: 20_000,
            max_sample_size: 100_000,
            request_timeout_secs: 120,
            reference_dir: None,
            references: default_references(),
            cloud_width: 800,
            cloud_height: 400,
            cloud_background: [255, 255, 255],
        }
    }
}

/// Built-in reference catalog.
pub fn default_references() -> BTreeMap<String, String> {
    [
        ("generell", "generell.csv"),
        ("avis", "avis.csv"),
        ("bok", "bok.csv"),
    ]
    .into_iter()
    .map(|(name, file)| (name.to_string(), file.to_string()))
    .collect()
}

impl ExploreConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ExploreError> {
        let fail = |msg: &str| Err(ExploreError::Validation(msg.to_string()));
        if self.max_concordance_limit == 0 {
            return fail("max_concordance_limit must be > 0");
        }
        if self.default_sample_size == 0 || self.default_sample_size > self.max_sample_size {
            return fail("default_sample_size must be between 1 and max_sample_size");
        }
        if self.request_timeout_secs == 0 {
            return fail("request_timeout_secs must be > 0");
        }
        if self.cloud_width == 0 || self.cloud_height == 0 {
            return fail("cloud dimensions must be > 0");
        }
        if self.references.is_empty() {
            return fail("at least one reference table must be configured");
        }
        Ok(())
    }
}
