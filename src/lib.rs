//! Workspace umbrella crate for the corpus explorer.
//!
//! [`Explorer`] wires the stages together behind one API: a corpus handle
//! goes in, the resolver turns it into a cached corpus, and one of the
//! exploration pipelines or the export bundler turns that into a result.
//!
//! ```
//! use client::StubBackend;
//! use corpus::{CorpusHandle, CorpusMetadata, DocumentType};
//! use korpus::{Explorer, KorpusConfig};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let explorer = Explorer::new(StubBackend::generated(5), &KorpusConfig::default()).unwrap();
//!     let handle = CorpusHandle::from(CorpusMetadata::for_type(DocumentType::Digibok));
//!     let table = explorer.table(&handle).await.unwrap();
//!     assert_eq!(table.document_type, Some(DocumentType::Digibok));
//! });
//! ```

pub mod config;

pub use crate::config::{ConfigLoadError, KorpusConfig};

pub use client::{ClientConfig, ClientError, DhlabClient, StubBackend, StubDocument};
pub use corpus::{
    AnalysisBackend, CapabilityError, Corpus, CorpusError, CorpusHandle, CorpusMetadata,
    CorpusParams, DocumentRecord, DocumentType, SearchBackend,
};
pub use explore::{
    CollocationRequest, CollocationResult, CollocationTable, ConcordanceRequest, ConcordanceTable,
    DisplayTable, ExploreConfig, ExploreError, ExplorePipelines,
};
pub use export::{Attachment, ExportError, Readmes};
pub use resolver::{CorpusResolver, ResolveError, ResolverConfig, ResolverStats};

use std::sync::Arc;

use chrono::Local;
use thiserror::Error;

/// Any failure surfaced by [`Explorer`].
#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error(transparent)]
    Config(#[from] ConfigLoadError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Explore(#[from] ExploreError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ExplorerError {
    /// True when the caller can fix the request.
    pub fn is_client_error(&self) -> bool {
        match self {
            ExplorerError::Config(_) | ExplorerError::Client(_) => false,
            ExplorerError::Corpus(err) => err.is_client_error(),
            ExplorerError::Resolve(err) => err.is_client_error(),
            ExplorerError::Explore(err) => err.is_client_error(),
            ExplorerError::Export(err) => err.is_client_error(),
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            ExplorerError::Config(_) | ExplorerError::Client(_) => 500,
            ExplorerError::Corpus(err) => err.http_status_code(),
            ExplorerError::Resolve(err) => err.http_status_code(),
            ExplorerError::Explore(err) => err.http_status_code(),
            ExplorerError::Export(err) => err.http_status_code(),
        }
    }

    /// The capability failure underneath, if any.
    pub fn capability(&self) -> Option<&CapabilityError> {
        match self {
            ExplorerError::Resolve(ResolveError::ExternalCapabilityFailure(err))
            | ExplorerError::Explore(ExploreError::ExternalCapabilityFailure(err)) => Some(err),
            _ => None,
        }
    }
}

/// Resolver, pipelines and bundler over one backend.
///
/// `B` serves both the search and the analysis side; it is shared behind an
/// `Arc` so both stages talk to the same connection pool.
pub struct Explorer<B> {
    resolver: CorpusResolver<Arc<B>>,
    pipelines: ExplorePipelines<Arc<B>>,
    readmes: Readmes,
}

impl Explorer<DhlabClient> {
    /// Explorer backed by the DH-LAB HTTP API.
    pub fn connect(cfg: &KorpusConfig) -> Result<Self, ExplorerError> {
        let client = DhlabClient::new(cfg.client.clone())?;
        Self::new(client, cfg)
    }
}

impl<B> Explorer<B>
where
    B: SearchBackend + AnalysisBackend,
{
    pub fn new(backend: B, cfg: &KorpusConfig) -> Result<Self, ExplorerError> {
        cfg.validate()?;
        let backend = Arc::new(backend);
        Ok(Self {
            resolver: CorpusResolver::new(Arc::clone(&backend), cfg.resolver.clone())?,
            pipelines: ExplorePipelines::new(backend, cfg.column_catalog(), cfg.explore.clone())?,
            readmes: Readmes::new()?,
        })
    }

    pub fn resolver(&self) -> &CorpusResolver<Arc<B>> {
        &self.resolver
    }

    pub fn pipelines(&self) -> &ExplorePipelines<Arc<B>> {
        &self.pipelines
    }

    pub fn backend(&self) -> &B {
        self.resolver.backend()
    }

    pub fn stats(&self) -> ResolverStats {
        self.resolver.stats()
    }

    pub async fn resolve(&self, handle: &CorpusHandle) -> Result<Arc<Corpus>, ExplorerError> {
        Ok(self.resolver.resolve(handle).await?)
    }

    /// Parse an uploaded file; returns the handle to use for follow-up calls.
    pub async fn upload(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(CorpusHandle, Arc<Corpus>), ExplorerError> {
        Ok(self.resolver.resolve_upload(filename, bytes).await?)
    }

    pub async fn table(&self, handle: &CorpusHandle) -> Result<DisplayTable, ExplorerError> {
        let corpus = self.resolve(handle).await?;
        Ok(self.pipelines.table(&corpus)?)
    }

    pub async fn concordances(
        &self,
        handle: &CorpusHandle,
        request: &ConcordanceRequest,
    ) -> Result<ConcordanceTable, ExplorerError> {
        let (_, table) = self.concordances_over(handle, request).await?;
        Ok(table)
    }

    pub async fn collocations(
        &self,
        handle: &CorpusHandle,
        request: &CollocationRequest,
    ) -> Result<CollocationResult, ExplorerError> {
        let (_, result) = self.collocations_over(handle, request).await?;
        Ok(result)
    }

    /// Zip with the corpus workbook and readme.
    pub async fn export_corpus(&self, handle: &CorpusHandle) -> Result<Vec<u8>, ExplorerError> {
        let corpus = self.resolve(handle).await?;
        let readme = self.corpus_readme(handle)?;
        Ok(export::bundle(&corpus, &readme, &[])?)
    }

    /// The corpus in the archive is the one the concordances were drawn from.
    pub async fn export_concordances(
        &self,
        handle: &CorpusHandle,
        request: &ConcordanceRequest,
    ) -> Result<Vec<u8>, ExplorerError> {
        let (corpus, table) = self.concordances_over(handle, request).await?;
        let readme = self.corpus_readme(handle)?;
        Ok(export::bundle(&corpus, &readme, &[Attachment::Concordances(&table)])?)
    }

    pub async fn export_collocations(
        &self,
        handle: &CorpusHandle,
        request: &CollocationRequest,
    ) -> Result<Vec<u8>, ExplorerError> {
        let (corpus, result) = self.collocations_over(handle, request).await?;
        let readme = self.corpus_readme(handle)?;
        let collocation_readme = self.readmes.collocations(request, self.pipelines.config())?;
        Ok(export::bundle(
            &corpus,
            &readme,
            &[Attachment::Collocations {
                result: &result,
                readme: &collocation_readme,
            }],
        )?)
    }

    async fn concordances_over(
        &self,
        handle: &CorpusHandle,
        request: &ConcordanceRequest,
    ) -> Result<(Arc<Corpus>, ConcordanceTable), ExplorerError> {
        request.validate(self.pipelines.config())?;
        let corpus = self.resolve(handle).await?;
        let table = self.pipelines.concordances(&corpus, request).await?;
        Ok((corpus, table))
    }

    async fn collocations_over(
        &self,
        handle: &CorpusHandle,
        request: &CollocationRequest,
    ) -> Result<(Arc<Corpus>, CollocationResult), ExplorerError> {
        request.validate(self.pipelines.config())?;
        self.pipelines.references().load(&request.reference)?;
        let corpus = self.resolve(handle).await?;
        let result = self.pipelines.collocations(&corpus, request).await?;
        Ok((corpus, result))
    }

    fn corpus_readme(&self, handle: &CorpusHandle) -> Result<String, ExplorerError> {
        Ok(self.readmes.corpus(handle, Local::now().naive_local())?)
    }
}
