use std::sync::Arc;
use std::time::Instant;

use corpus::{Corpus, CorpusHandle, CorpusMetadata, SearchBackend};
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::cache::{CacheStats, CorpusCache};
use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::upload::{read_identifiers, UploadLayout};

/// Hit/miss counters for both caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub metadata: CacheStats,
    pub uploads: CacheStats,
}

/// Turns corpus definitions into resolved corpora.
///
/// Query-defined corpora are cached by their canonical [`CorpusMetadata`];
/// identifier lists by the exact ordered, de-duplicated identifier sequence.
/// Both caches are bounded LRUs owned by this instance.
pub struct CorpusResolver<B> {
    backend: B,
    cfg: ResolverConfig,
    by_metadata: CorpusCache<CorpusMetadata>,
    by_identifiers: CorpusCache<Vec<String>>,
}

impl<B: SearchBackend> CorpusResolver<B> {
    pub fn new(backend: B, cfg: ResolverConfig) -> Result<Self, ResolveError> {
        cfg.validate()?;
        Ok(Self {
            by_metadata: CorpusCache::new(cfg.metadata_capacity()?),
            by_identifiers: CorpusCache::new(cfg.upload_capacity()?),
            backend,
            cfg,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.cfg
    }

    /// Resolve whatever a caller's handle describes.
    pub async fn resolve(&self, handle: &CorpusHandle) -> Result<Arc<Corpus>, ResolveError> {
        match handle {
            CorpusHandle::Query { params } => self.resolve_metadata(params).await,
            CorpusHandle::Identifiers { urns } => self.resolve_identifiers(urns).await,
        }
    }

    pub async fn resolve_metadata(
        &self,
        metadata: &CorpusMetadata,
    ) -> Result<Arc<Corpus>, ResolveError> {
        let span = info_span!(
            "resolver.resolve",
            kind = "query",
            doctype = metadata.document_type().code(),
            num_docs = metadata.num_docs()
        );
        async {
            let start = Instant::now();
            let outcome = self
                .by_metadata
                .get_or_load(metadata, || self.backend.build_corpus(metadata))
                .await;
            report(outcome, start)
        }
        .instrument(span)
        .await
    }

    /// Resolve an identifier list.
    ///
    /// Blank entries are dropped and repeats keep their first position; the
    /// resulting sequence is the cache key, so the same identifiers in a
    /// different order are a different corpus.
    pub async fn resolve_identifiers(&self, urns: &[String]) -> Result<Arc<Corpus>, ResolveError> {
        let key = canonical_identifiers(urns);
        let span = info_span!("resolver.resolve", kind = "identifiers", identifiers = key.len());
        async {
            let start = Instant::now();
            if key.is_empty() {
                debug!("corpus_resolve_empty_identifier_list");
                return Ok(Arc::new(Corpus::empty()));
            }
            let outcome = self
                .by_identifiers
                .get_or_load(&key, || self.backend.resolve_identifiers(&key))
                .await;
            report(outcome, start)
        }
        .instrument(span)
        .await
    }

    /// Parse an uploaded spreadsheet and resolve its identifiers.
    ///
    /// Returns the handle a caller should keep for follow-up requests.
    pub async fn resolve_upload(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(CorpusHandle, Arc<Corpus>), ResolveError> {
        let layout = UploadLayout {
            identifier_column: &self.cfg.identifier_column,
            zip_corpus_entry: &self.cfg.zip_corpus_entry,
            max_zip_entry_bytes: self.cfg.max_zip_entry_bytes,
        };
        let urns = read_identifiers(filename, bytes, layout).inspect_err(|err| {
            warn!(filename, error = %err, "corpus_upload_rejected");
        })?;
        let urns = canonical_identifiers(&urns);
        info!(filename, identifiers = urns.len(), "corpus_upload_parsed");

        let corpus = self.resolve_identifiers(&urns).await?;
        Ok((CorpusHandle::Identifiers { urns }, corpus))
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            metadata: self.by_metadata.stats(),
            uploads: self.by_identifiers.stats(),
        }
    }

    /// Drop every cached corpus. Counters are kept.
    pub fn clear(&self) {
        self.by_metadata.clear();
        self.by_identifiers.clear();
    }
}

fn report(
    outcome: Result<(Arc<Corpus>, bool), corpus::CapabilityError>,
    start: Instant,
) -> Result<Arc<Corpus>, ResolveError> {
    let elapsed_micros = start.elapsed().as_micros() as u64;
    match outcome {
        Ok((corpus, true)) => {
            debug!(rows = corpus.len(), elapsed_micros, "corpus_cache_hit");
            Ok(corpus)
        }
        Ok((corpus, false)) => {
            info!(rows = corpus.len(), elapsed_micros, "corpus_resolve_success");
            Ok(corpus)
        }
        Err(err) => {
            warn!(error = %err, elapsed_micros, "corpus_resolve_failure");
            Err(ResolveError::ExternalCapabilityFailure(err))
        }
    }
}

/// Trimmed, non-blank identifiers in first-occurrence order.
pub fn canonical_identifiers(urns: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(urns.len());
    urns.iter()
        .map(|urn| urn.trim())
        .filter(|urn| !urn.is_empty())
        .filter(|urn| seen.insert(*urn))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use client::StubBackend;
    use corpus::{CapabilityError, DocumentType};

    fn resolver() -> CorpusResolver<StubBackend> {
        CorpusResolver::new(StubBackend::generated(10), ResolverConfig::default()).unwrap()
    }

    #[test]
    fn identifiers_keep_first_occurrence_order() {
        let urns: Vec<String> = vec![" b ".into(), "a".into(), "".into(), "b".into(), "c".into()];
        assert_eq!(canonical_identifiers(&urns), vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn equal_metadata_hits_cache() {
        let resolver = resolver();
        let a = CorpusMetadata::from_params([("doc_type_selection", "digibok"), ("title", "")]).unwrap();
        let b = CorpusMetadata::from_params([("doc_type_selection", "book")]).unwrap();

        let first = resolver.resolve_metadata(&a).await.unwrap();
        let second = resolver.resolve_metadata(&b).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.backend().build_calls(), 1);
        assert_eq!(resolver.stats().metadata.hits, 1);
    }

    #[tokio::test]
    async fn identifier_order_is_part_of_the_key() {
        let resolver = resolver();
        let forward: Vec<String> = vec![
            "URN:NBN:no-nb_digibok_000001".into(),
            "URN:NBN:no-nb_digibok_000002".into(),
        ];
        let backward: Vec<String> = forward.iter().rev().cloned().collect();

        let a = resolver.resolve_identifiers(&forward).await.unwrap();
        let b = resolver.resolve_identifiers(&forward).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        resolver.resolve_identifiers(&backward).await.unwrap();
        assert_eq!(resolver.backend().resolve_calls(), 2);
    }

    #[tokio::test]
    async fn empty_identifier_list_is_an_empty_corpus() {
        let resolver = resolver();
        let corpus = resolver.resolve_identifiers(&[" ".to_string()]).await.unwrap();
        assert!(corpus.is_empty());
        assert_eq!(resolver.backend().resolve_calls(), 0);
    }

    #[tokio::test]
    async fn upload_returns_identifier_handle() {
        let resolver = resolver();
        let csv = "urn\nURN:NBN:no-nb_digavis_000003\nURN:NBN:no-nb_digavis_000003\n";
        let (handle, corpus) = resolver.resolve_upload("liste.csv", csv.as_bytes()).await.unwrap();
        assert_eq!(
            handle,
            CorpusHandle::Identifiers {
                urns: vec!["URN:NBN:no-nb_digavis_000003".into()]
            }
        );
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.rows()[0].doctype, Some(DocumentType::Digavis));
    }

    #[tokio::test]
    async fn upload_errors_happen_before_any_call() {
        let resolver = resolver();
        let err = resolver.resolve_upload("liste.txt", b"urn\nx\n").await.unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedFileFormat { .. }));
        assert_eq!(resolver.backend().resolve_calls(), 0);
    }

    #[tokio::test]
    async fn capability_failure_is_surfaced() {
        let backend = StubBackend::generated(1).failing(CapabilityError::Timeout(60));
        let resolver = CorpusResolver::new(backend, ResolverConfig::default()).unwrap();
        let meta = CorpusMetadata::for_type(DocumentType::Digibok);
        let err = resolver.resolve_metadata(&meta).await.unwrap_err();
        assert_eq!(err, ResolveError::ExternalCapabilityFailure(CapabilityError::Timeout(60)));
        assert_eq!(resolver.stats().metadata.entries, 0);
    }
}
