use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use korpus::{AnalysisBackend, DhlabClient, Explorer, KorpusConfig, SearchBackend, StubBackend};
use std::sync::Arc;
use std::time::Instant;

/// Documents per type in the offline library.
const OFFLINE_DOCUMENTS_PER_TYPE: usize = 200;

/// Shared application state
pub struct ServerState<B> {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Explorer instance (shared across requests; owns the corpus caches)
    pub explorer: Explorer<B>,

    pub started_at: Instant,
}

impl<B> ServerState<B>
where
    B: SearchBackend + AnalysisBackend,
{
    pub fn with_explorer(config: ServerConfig, explorer: Explorer<B>) -> Self {
        Self {
            config: Arc::new(config),
            explorer,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Read the explorer YAML named by the server config, or use defaults.
pub fn korpus_config(config: &ServerConfig) -> ServerResult<KorpusConfig> {
    match &config.korpus_config {
        Some(path) => KorpusConfig::from_file(path).map_err(|err| {
            ServerError::Config(format!("failed to load {}: {err}", path.display()))
        }),
        None => Ok(KorpusConfig::default()),
    }
}

impl ServerState<DhlabClient> {
    /// State backed by the DH-LAB API.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let korpus = korpus_config(&config)?;
        let explorer = Explorer::connect(&korpus)?;
        Ok(Self::with_explorer(config, explorer))
    }
}

impl ServerState<StubBackend> {
    /// State backed by a generated in-memory library.
    pub fn offline(config: ServerConfig) -> ServerResult<Self> {
        let korpus = korpus_config(&config)?;
        let explorer = Explorer::new(StubBackend::generated(OFFLINE_DOCUMENTS_PER_TYPE), &korpus)?;
        Ok(Self::with_explorer(config, explorer))
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}
