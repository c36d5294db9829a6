//! Interfaces to the external search and text-analysis capability.
//!
//! The explorer never searches, extracts concordances or counts collocates
//! itself; it calls these traits and post-processes what they return. The
//! HTTP implementation lives in the `client` crate alongside a deterministic
//! in-memory stand-in.
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;
use crate::metadata::CorpusMetadata;
use crate::reference::ReferenceTable;
use crate::types::Corpus;

/// Document search: query-defined corpora and identifier lookup.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a metadata query and return the matching documents.
    async fn build_corpus(&self, metadata: &CorpusMetadata) -> Result<Corpus, CapabilityError>;

    /// Resolve exact identifiers to full document rows, in the given order.
    /// Identifiers the service does not know are omitted.
    async fn resolve_identifiers(&self, urns: &[String]) -> Result<Corpus, CapabilityError>;
}

/// Occurrence extraction and collocate counting.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn concordances(
        &self,
        query: &ConcordanceQuery,
    ) -> Result<Vec<ConcordanceHit>, CapabilityError>;

    /// Count collocates of the target words and score them against `reference`.
    async fn collocations(
        &self,
        query: &CollocationQuery,
        reference: &ReferenceTable,
    ) -> Result<Vec<CollocateScore>, CapabilityError>;
}

#[async_trait]
impl<T: SearchBackend + ?Sized> SearchBackend for Arc<T> {
    async fn build_corpus(&self, metadata: &CorpusMetadata) -> Result<Corpus, CapabilityError> {
        (**self).build_corpus(metadata).await
    }

    async fn resolve_identifiers(&self, urns: &[String]) -> Result<Corpus, CapabilityError> {
        (**self).resolve_identifiers(urns).await
    }
}

#[async_trait]
impl<T: AnalysisBackend + ?Sized> AnalysisBackend for Arc<T> {
    async fn concordances(
        &self,
        query: &ConcordanceQuery,
    ) -> Result<Vec<ConcordanceHit>, CapabilityError> {
        (**self).concordances(query).await
    }

    async fn collocations(
        &self,
        query: &CollocationQuery,
        reference: &ReferenceTable,
    ) -> Result<Vec<CollocateScore>, CapabilityError> {
        (**self).collocations(query, reference).await
    }
}

/// Concordance request over a corpus's document set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcordanceQuery {
    /// Internal ids of the documents to search.
    pub dhlabids: Vec<i64>,
    /// Identifiers of the same documents, for services keyed on URN.
    pub urns: Vec<String>,
    pub query: String,
    /// Tokens of context on each side.
    pub window: u32,
    pub limit: u32,
}

/// One occurrence with its context window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcordanceHit {
    pub urn: String,
    pub concordance: String,
}

/// Collocation request: target words and an asymmetric window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollocationQuery {
    pub urns: Vec<String>,
    pub words: String,
    pub before: u32,
    pub after: u32,
    pub sample_size: u32,
}

/// Score row for one collocate.
///
/// `word` is the row label; repeated collocates carry a ` <n>` suffix to stay
/// unique. `relevance` is `NaN` when the word is missing from the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollocateScore {
    pub word: String,
    pub counts: f64,
    pub relevance: f64,
}

impl CollocateScore {
    /// Scoring columns available for ranking.
    pub const SCORE_COLUMNS: [&'static str; 2] = ["counts", "relevance"];

    pub fn score(&self, column: &str) -> Option<f64> {
        match column {
            "counts" => Some(self.counts),
            "relevance" => Some(self.relevance),
            _ => None,
        }
    }
}
