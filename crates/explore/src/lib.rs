//! Exploration pipelines over a resolved corpus.
//!
//! Three independent transforms, each a pure function of its inputs plus one
//! call to the analysis service:
//!
//! - [`project`] lays a corpus out as a display table for its document type
//! - [`concordances`] fetches keyword-in-context hits and joins them to the corpus
//! - [`collocations`] scores neighbouring words against a reference table,
//!   ranks them and renders a frequency cloud
//!
//! [`ExplorePipelines`] bundles the collaborators so callers hold one value.
//!
//! ```
//! use corpus::{ColumnCatalog, Corpus};
//!
//! let table = explore::project(&Corpus::empty(), &ColumnCatalog::default()).unwrap();
//! assert!(table.is_empty());
//! ```

mod cloud;
mod collocation;
mod concordance;
mod config;
mod error;
mod reference;
mod table;

use std::sync::Arc;

use corpus::{AnalysisBackend, ColumnCatalog, Corpus};

pub use crate::cloud::{BitmapCloudRenderer, CloudImage, CloudRenderer};
pub use crate::collocation::{
    collocations, rank, strip_counter_suffix, CollocationRequest, CollocationResult,
    CollocationTable,
};
pub use crate::concordance::{
    concordances, join, ConcordanceRequest, ConcordanceRow, ConcordanceTable, CONCORDANCE_COLUMNS,
};
pub use crate::config::{default_references, ExploreConfig};
pub use crate::error::ExploreError;
pub use crate::reference::ReferenceStore;
pub use crate::table::{project, DisplayColumn, DisplayRow, DisplayTable};

/// The three pipelines wired to one analysis service.
pub struct ExplorePipelines<A> {
    analysis: A,
    references: ReferenceStore,
    renderer: Arc<dyn CloudRenderer>,
    catalog: ColumnCatalog,
    cfg: ExploreConfig,
}

impl<A: AnalysisBackend> ExplorePipelines<A> {
    /// Build from config: references come from `cfg.reference_dir` (or the
    /// shipped baselines when unset), clouds use the bitmap renderer at the
    /// configured canvas.
    pub fn new(analysis: A, catalog: ColumnCatalog, cfg: ExploreConfig) -> Result<Self, ExploreError> {
        cfg.validate()?;
        let references = ReferenceStore::with_dir(cfg.reference_dir.clone(), cfg.references.clone());
        let renderer = Arc::new(BitmapCloudRenderer::new(
            cfg.cloud_width,
            cfg.cloud_height,
            cfg.cloud_background,
        ));
        Ok(Self {
            analysis,
            references,
            renderer,
            catalog,
            cfg,
        })
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn CloudRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn analysis(&self) -> &A {
        &self.analysis
    }

    pub fn references(&self) -> &ReferenceStore {
        &self.references
    }

    pub fn catalog(&self) -> &ColumnCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ExploreConfig {
        &self.cfg
    }

    pub fn table(&self, corpus: &Corpus) -> Result<DisplayTable, ExploreError> {
        project(corpus, &self.catalog)
    }

    pub async fn concordances(
        &self,
        corpus: &Corpus,
        request: &ConcordanceRequest,
    ) -> Result<ConcordanceTable, ExploreError> {
        concordances(&self.analysis, corpus, request, &self.cfg).await
    }

    pub async fn collocations(
        &self,
        corpus: &Corpus,
        request: &CollocationRequest,
    ) -> Result<CollocationResult, ExploreError> {
        collocations(
            &self.analysis,
            &self.references,
            self.renderer.as_ref(),
            corpus,
            request,
            &self.cfg,
        )
        .await
    }
}
