//! Concordance Pipeline.
//!
//! Occurrences come from the analysis service; this module validates the
//! request, left-joins every occurrence to its document row and derives the
//! display time format per row.
use std::future::Future;
use std::time::Instant;

use chrono::NaiveDate;
use corpus::{
    document_link, parse_timestamp, AnalysisBackend, CapabilityError, ConcordanceHit,
    ConcordanceQuery, Corpus, TimeGranularity,
};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn, Instrument};

use crate::config::ExploreConfig;
use crate::error::ExploreError;

/// Display columns of a concordance table, in order.
pub const CONCORDANCE_COLUMNS: [&str; 7] = [
    "title",
    "authors",
    "year",
    "timestamp",
    "timeformat",
    "concordance",
    "link",
];

fn default_limit() -> u32 {
    10
}

fn default_window() -> u32 {
    20
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcordanceRequest {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Tokens of context on each side.
    #[serde(default = "default_window")]
    pub window: u32,
}

impl ConcordanceRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: default_limit(),
            window: default_window(),
        }
    }

    /// Check the request against the configured ceilings.
    pub fn validate(&self, cfg: &ExploreConfig) -> Result<(), ExploreError> {
        if self.query.trim().is_empty() {
            return Err(ExploreError::Validation("query must not be empty".into()));
        }
        if self.limit == 0 {
            return Err(ExploreError::Validation("limit must be at least 1".into()));
        }
        if self.limit > cfg.max_concordance_limit {
            return Err(ExploreError::LimitExceeded {
                limit: self.limit,
                max: cfg.max_concordance_limit,
            });
        }
        if self.window > cfg.max_window {
            return Err(ExploreError::WindowTooLarge {
                window: self.window,
                max: cfg.max_window,
            });
        }
        Ok(())
    }
}

/// One occurrence joined with its document's metadata. Metadata fields are
/// `None` when the occurrence's document is not in the corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcordanceRow {
    pub urn: String,
    pub title: Option<String>,
    pub authors: Option<String>,
    pub year: Option<i32>,
    pub timestamp: NaiveDate,
    pub timeformat: &'static str,
    pub concordance: String,
    pub link: String,
}

impl ConcordanceRow {
    /// Timestamp rendered with the row's own format.
    pub fn display_time(&self) -> String {
        self.timestamp.format(self.timeformat).to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConcordanceTable {
    pub rows: Vec<ConcordanceRow>,
}

impl ConcordanceTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Extract and join concordances for `request` over `corpus`.
pub async fn concordances<A>(
    analysis: &A,
    corpus: &Corpus,
    request: &ConcordanceRequest,
    cfg: &ExploreConfig,
) -> Result<ConcordanceTable, ExploreError>
where
    A: AnalysisBackend + ?Sized,
{
    request.validate(cfg)?;
    if corpus.is_empty() {
        return Ok(ConcordanceTable::default());
    }

    let span = info_span!(
        "explore.concordances",
        documents = corpus.len(),
        limit = request.limit,
        window = request.window
    );
    async {
        let start = Instant::now();
        let query = ConcordanceQuery {
            dhlabids: corpus.dhlabids(),
            urns: corpus.identifiers(),
            query: request.query.trim().to_string(),
            window: request.window,
            limit: request.limit,
        };

        let mut hits = with_deadline(cfg, analysis.concordances(&query))
            .await
            .inspect_err(|err| {
                warn!(
                    error = %err,
                    elapsed_micros = start.elapsed().as_micros() as u64,
                    "concordance_failure"
                )
            })?;

        hits.truncate(request.limit as usize);
        let table = join(corpus, hits);
        info!(
            rows = table.len(),
            elapsed_micros = start.elapsed().as_micros() as u64,
            "concordance_success"
        );
        Ok(table)
    }
    .instrument(span)
    .await
}

/// Left join on identifier: every hit yields exactly one row.
pub fn join(corpus: &Corpus, hits: Vec<ConcordanceHit>) -> ConcordanceTable {
    let index = corpus.index_by_urn();
    let rows = hits
        .into_iter()
        .map(|hit| {
            let doc = index.get(hit.urn.as_str()).copied();
            let granularity = TimeGranularity::for_type(doc.and_then(|d| d.doctype));
            ConcordanceRow {
                title: doc.and_then(|d| d.title.clone()),
                authors: doc.and_then(|d| d.authors.clone()),
                year: doc.and_then(|d| d.year),
                timestamp: parse_timestamp(doc.and_then(|d| d.timestamp.as_deref())),
                timeformat: granularity.pattern(),
                concordance: hit.concordance,
                link: document_link(&hit.urn),
                urn: hit.urn,
            }
        })
        .collect();
    ConcordanceTable { rows }
}

/// Run an analysis call under the configured request deadline.
pub(crate) async fn with_deadline<T, F>(cfg: &ExploreConfig, call: F) -> Result<T, ExploreError>
where
    F: Future<Output = Result<T, CapabilityError>>,
{
    match tokio::time::timeout(cfg.request_timeout(), call).await {
        Ok(result) => result.map_err(ExploreError::from),
        Err(_) => Err(CapabilityError::Timeout(cfg.request_timeout_secs).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client::{StubBackend, StubDocument};
    use corpus::{DocumentRecord, DocumentType, TIMESTAMP_SENTINEL};
    use std::time::Duration;

    fn doc(urn: &str, id: i64, doctype: DocumentType, text: &str) -> StubDocument {
        StubDocument {
            record: DocumentRecord {
                dhlabid: Some(id),
                title: Some(format!("T-{urn}")),
                authors: Some("Ibsen".into()),
                timestamp: Some("19950312".into()),
                year: Some(1995),
                doctype: Some(doctype),
                ..DocumentRecord::with_urn(urn)
            },
            text: text.into(),
        }
    }

    fn request(limit: u32, window: u32) -> ConcordanceRequest {
        ConcordanceRequest {
            query: "havet".into(),
            limit,
            window,
        }
    }

    #[test]
    fn ceilings_are_inclusive() {
        let cfg = ExploreConfig::default();
        assert!(request(5000, 50).validate(&cfg).is_ok());
        assert_eq!(
            request(5001, 5).validate(&cfg),
            Err(ExploreError::LimitExceeded { limit: 5001, max: 5000 })
        );
        assert_eq!(
            request(10, 51).validate(&cfg),
            Err(ExploreError::WindowTooLarge { window: 51, max: 50 })
        );
        assert!(matches!(
            ConcordanceRequest::new("  ").validate(&cfg),
            Err(ExploreError::Validation(_))
        ));
    }

    #[test]
    fn join_keeps_hits_for_unknown_documents() {
        let corpus = Corpus::new(vec![doc("u1", 1, DocumentType::Digavis, "").record]);
        let hits = vec![
            ConcordanceHit { urn: "u1".into(), concordance: "a havet b".into() },
            ConcordanceHit { urn: "ghost".into(), concordance: "c havet d".into() },
            ConcordanceHit { urn: "u1".into(), concordance: "e havet f".into() },
        ];
        let table = join(&corpus, hits);

        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0].title.as_deref(), Some("T-u1"));
        assert_eq!(table.rows[0].timeformat, "%Y-%m-%d");
        assert_eq!(table.rows[0].display_time(), "1995-03-12");

        let ghost = &table.rows[1];
        assert_eq!(ghost.title, None);
        assert_eq!(ghost.year, None);
        assert_eq!(ghost.timestamp, TIMESTAMP_SENTINEL);
        assert_eq!(ghost.timeformat, "%Y");
        assert_eq!(ghost.link, "https://urn.nb.no/ghost");
    }

    #[test]
    fn duplicate_corpus_rows_do_not_duplicate_hits() {
        let row = doc("u1", 1, DocumentType::Digibok, "").record;
        let corpus = Corpus::new(vec![row.clone(), row]);
        let hits = vec![ConcordanceHit { urn: "u1".into(), concordance: "x".into() }];
        assert_eq!(join(&corpus, hits).len(), 1);
    }

    #[tokio::test]
    async fn pipeline_calls_service_and_joins() {
        let stub = StubBackend::new(vec![doc("u1", 1, DocumentType::Digibok, "sol over havet i dag")]);
        let corpus = Corpus::new(vec![stub.documents()[0].record.clone()]);
        let table = concordances(&stub, &corpus, &request(10, 1), &ExploreConfig::default())
            .await
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].concordance, "over havet i");
        assert_eq!(table.rows[0].timeformat, "%Y");
    }

    #[tokio::test]
    async fn empty_corpus_short_circuits() {
        let stub = StubBackend::generated(1);
        let table = concordances(&stub, &Corpus::empty(), &request(10, 5), &ExploreConfig::default())
            .await
            .unwrap();
        assert!(table.is_empty());
        assert_eq!(stub.concordance_calls(), 0);
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_service() {
        let stub = StubBackend::generated(2);
        let corpus = Corpus::new(vec![stub.documents()[0].record.clone()]);
        let err = concordances(&stub, &corpus, &request(5001, 5), &ExploreConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExploreError::LimitExceeded { .. }));
        assert_eq!(stub.concordance_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_service_times_out() {
        let stub = StubBackend::generated(1).with_latency(Duration::from_secs(600));
        let corpus = Corpus::new(vec![stub.documents()[0].record.clone()]);
        let cfg = ExploreConfig {
            request_timeout_secs: 5,
            ..Default::default()
        };
        let err = concordances(&stub, &corpus, &request(10, 5), &cfg).await.unwrap_err();
        assert_eq!(err, ExploreError::ExternalCapabilityFailure(CapabilityError::Timeout(5)));
    }
}
