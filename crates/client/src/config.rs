use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Default DH-LAB API root.
pub const DEFAULT_BASE_URL: &str = "https://api.nb.no/dhlab";

/// Connection settings for [`DhlabClient`](crate::DhlabClient).
///
/// # Example
/// ```
/// use client::ClientConfig;
///
/// let cfg = ClientConfig {
///     base_url: "http://localhost:8080/dhlab".into(),
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root; endpoint paths are appended to it.
    pub base_url: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Idle connections kept per host.
    pub pool_max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 60,
            connect_timeout_secs: 10,
            pool_max_idle_per_host: 16,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::InvalidConfig(format!(
                "base_url must be an http(s) URL, got `{url}`"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig("timeout_secs must be > 0".into()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "connect_timeout_secs must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// `base_url` joined with `path`, without doubled slashes.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
