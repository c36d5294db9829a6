//! Collocation Pipeline.
//!
//! Scores come from the analysis service against a reference frequency
//! table. Ranking drops undefined relevance, orders by the requested score
//! column and truncates; the truncated table also feeds the frequency cloud.
use std::collections::HashSet;
use std::time::Instant;

use corpus::{AnalysisBackend, CollocateScore, CollocationQuery, Corpus};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn, Instrument};

use crate::cloud::{CloudImage, CloudRenderer};
use crate::concordance::with_deadline;
use crate::config::ExploreConfig;
use crate::error::ExploreError;
use crate::reference::ReferenceStore;

fn default_span() -> u32 {
    10
}

fn default_reference() -> String {
    "generell".to_string()
}

fn default_sort_by() -> String {
    "relevance".to_string()
}

fn default_max_results() -> u32 {
    200
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollocationRequest {
    /// Target word or words.
    pub words: String,
    #[serde(default = "default_span")]
    pub before: u32,
    #[serde(default = "default_span")]
    pub after: u32,
    /// Falls back to `ExploreConfig::default_sample_size`.
    #[serde(default)]
    pub sample_size: Option<u32>,
    #[serde(default = "default_reference")]
    pub reference: String,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl CollocationRequest {
    pub fn new(words: impl Into<String>) -> Self {
        Self {
            words: words.into(),
            before: default_span(),
            after: default_span(),
            sample_size: None,
            reference: default_reference(),
            sort_by: default_sort_by(),
            max_results: default_max_results(),
        }
    }

    pub fn effective_sample_size(&self, cfg: &ExploreConfig) -> u32 {
        self.sample_size.unwrap_or(cfg.default_sample_size)
    }

    pub fn validate(&self, cfg: &ExploreConfig) -> Result<(), ExploreError> {
        if self.words.trim().is_empty() {
            return Err(ExploreError::Validation("words must not be empty".into()));
        }
        for window in [self.before, self.after] {
            if window > cfg.max_window {
                return Err(ExploreError::WindowTooLarge {
                    window,
                    max: cfg.max_window,
                });
            }
        }
        let sample = self.effective_sample_size(cfg);
        if sample == 0 || sample > cfg.max_sample_size {
            return Err(ExploreError::Validation(format!(
                "sample_size must be between 1 and {}",
                cfg.max_sample_size
            )));
        }
        if !CollocateScore::SCORE_COLUMNS.contains(&self.sort_by.as_str()) {
            return Err(ExploreError::UnknownSortColumn {
                column: self.sort_by.clone(),
                expected: CollocateScore::SCORE_COLUMNS.to_vec(),
            });
        }
        Ok(())
    }
}

/// Ranked collocates plus the column they were ranked by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollocationTable {
    pub sort_by: String,
    pub rows: Vec<CollocateScore>,
}

impl CollocationTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Word → score pairs for the cloud, in table order.
    ///
    /// Disambiguation suffixes (`"havet 2"`) are stripped and the first
    /// occurrence of a stripped word wins.
    pub fn cloud_frequencies(&self) -> Vec<(String, f64)> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter_map(|row| {
                let word = strip_counter_suffix(&row.word);
                let score = row.score(&self.sort_by)?;
                seen.insert(word.to_string()).then(|| (word.to_string(), score))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollocationResult {
    pub table: CollocationTable,
    pub image: CloudImage,
}

/// Remove a trailing whitespace-plus-number suffix.
pub fn strip_counter_suffix(label: &str) -> &str {
    let trimmed = label.trim_end();
    match trimmed.rfind(char::is_whitespace) {
        Some(idx) => {
            let (head, tail) = trimmed.split_at(idx);
            let tail = tail.trim_start();
            if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) && !head.trim().is_empty() {
                head.trim_end()
            } else {
                trimmed
            }
        }
        None => trimmed,
    }
}

/// Drop undefined relevance, sort descending by `sort_by`, keep `max_results`.
///
/// A NaN in the sort column ranks last. Ties fall back to the word so the
/// order is total.
pub fn rank(
    mut rows: Vec<CollocateScore>,
    sort_by: &str,
    max_results: usize,
) -> Result<Vec<CollocateScore>, ExploreError> {
    if !CollocateScore::SCORE_COLUMNS.contains(&sort_by) {
        return Err(ExploreError::UnknownSortColumn {
            column: sort_by.to_string(),
            expected: CollocateScore::SCORE_COLUMNS.to_vec(),
        });
    }
    rows.retain(|row| !row.relevance.is_nan());
    let key = |row: &CollocateScore| row.score(sort_by).unwrap_or(f64::NAN);
    rows.sort_by(|a, b| {
        let (ka, kb) = (key(a), key(b));
        ka.is_nan()
            .cmp(&kb.is_nan())
            .then_with(|| kb.total_cmp(&ka))
            .then_with(|| a.word.cmp(&b.word))
    });
    rows.truncate(max_results);
    Ok(rows)
}

/// Score collocates of `request.words` in `corpus` and render the cloud.
pub async fn collocations<A, R>(
    analysis: &A,
    references: &ReferenceStore,
    renderer: &R,
    corpus: &Corpus,
    request: &CollocationRequest,
    cfg: &ExploreConfig,
) -> Result<CollocationResult, ExploreError>
where
    A: AnalysisBackend + ?Sized,
    R: CloudRenderer + ?Sized,
{
    request.validate(cfg)?;
    let reference = references.load(&request.reference)?;

    let span = info_span!(
        "explore.collocations",
        documents = corpus.len(),
        reference = %request.reference,
        sort_by = %request.sort_by
    );
    async {
        let start = Instant::now();
        let scores = if corpus.is_empty() {
            Vec::new()
        } else {
            let query = CollocationQuery {
                urns: corpus.identifiers(),
                words: request.words.trim().to_string(),
                before: request.before,
                after: request.after,
                sample_size: request.effective_sample_size(cfg),
            };
            with_deadline(cfg, analysis.collocations(&query, &reference))
                .await
                .inspect_err(|err| {
                    warn!(
                        error = %err,
                        elapsed_micros = start.elapsed().as_micros() as u64,
                        "collocation_failure"
                    )
                })?
        };

        let raw = scores.len();
        let table = CollocationTable {
            rows: rank(scores, &request.sort_by, request.max_results as usize)?,
            sort_by: request.sort_by.clone(),
        };
        let image = renderer.render(&table.cloud_frequencies())?;
        info!(
            raw_rows = raw,
            rows = table.len(),
            elapsed_micros = start.elapsed().as_micros() as u64,
            "collocation_success"
        );
        Ok(CollocationResult { table, image })
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::BitmapCloudRenderer;
    use client::{StubBackend, StubDocument};
    use corpus::{DocumentRecord, DocumentType};
    use std::io::Write;

    fn score(word: &str, counts: f64, relevance: f64) -> CollocateScore {
        CollocateScore {
            word: word.into(),
            counts,
            relevance,
        }
    }

    fn store(dir: &tempfile::TempDir) -> ReferenceStore {
        let mut file = std::fs::File::create(dir.path().join("generell.csv")).unwrap();
        writeln!(file, "sol,100\nover,50\ni,500\ndag,40\nhavet,30").unwrap();
        ReferenceStore::new(dir.path(), crate::config::default_references())
    }

    #[test]
    fn rank_drops_nan_and_truncates() {
        let rows = vec![
            score("a", 1.0, 0.5),
            score("b", 9.0, f64::NAN),
            score("c", 3.0, 2.0),
            score("d", 2.0, 1.0),
        ];
        let ranked = rank(rows.clone(), "relevance", 2).unwrap();
        assert_eq!(
            ranked.iter().map(|r| r.word.as_str()).collect::<Vec<_>>(),
            vec!["c", "d"]
        );

        let all = rank(rows.clone(), "counts", 10).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].word, "c");

        assert!(rank(rows, "counts", 0).unwrap().is_empty());
    }

    #[test]
    fn rank_orders_non_finite_counts() {
        let rows = vec![
            score("a", 2.0, 1.0),
            score("b", f64::NAN, 1.0),
            score("c", f64::INFINITY, 1.0),
            score("d", 5.0, 1.0),
            score("e", f64::NAN, 1.0),
            score("f", f64::NEG_INFINITY, 1.0),
        ];
        let words = |ranked: Vec<CollocateScore>| {
            ranked.into_iter().map(|r| r.word).collect::<Vec<_>>()
        };
        assert_eq!(
            words(rank(rows.clone(), "counts", 10).unwrap()),
            vec!["c", "d", "a", "f", "b", "e"]
        );

        let mut reversed = rows;
        reversed.reverse();
        assert_eq!(
            words(rank(reversed, "counts", 3).unwrap()),
            vec!["c", "d", "a"]
        );
    }

    #[test]
    fn rank_breaks_ties_by_word() {
        let ranked = rank(vec![score("b", 1.0, 1.0), score("a", 1.0, 1.0)], "counts", 5).unwrap();
        assert_eq!(ranked[0].word, "a");
    }

    #[test]
    fn unknown_sort_column_is_rejected_up_front() {
        let cfg = ExploreConfig::default();
        let request = CollocationRequest {
            sort_by: "pmi".into(),
            ..CollocationRequest::new("havet")
        };
        assert!(matches!(
            request.validate(&cfg),
            Err(ExploreError::UnknownSortColumn { column, .. }) if column == "pmi"
        ));
    }

    #[test]
    fn suffixes_are_stripped_for_the_cloud() {
        assert_eq!(strip_counter_suffix("havet 2"), "havet");
        assert_eq!(strip_counter_suffix("havet"), "havet");
        assert_eq!(strip_counter_suffix("1905"), "1905");
        assert_eq!(strip_counter_suffix("år 1905x"), "år 1905x");

        let table = CollocationTable {
            sort_by: "counts".into(),
            rows: vec![score("havet", 5.0, 1.0), score("havet 2", 3.0, 1.0), score("sol", 2.0, 1.0)],
        };
        assert_eq!(
            table.cloud_frequencies(),
            vec![("havet".to_string(), 5.0), ("sol".to_string(), 2.0)]
        );
    }

    #[test]
    fn window_and_sample_limits() {
        let cfg = ExploreConfig::default();
        let wide = CollocationRequest {
            after: 51,
            ..CollocationRequest::new("havet")
        };
        assert_eq!(
            wide.validate(&cfg),
            Err(ExploreError::WindowTooLarge { window: 51, max: 50 })
        );
        let huge = CollocationRequest {
            sample_size: Some(cfg.max_sample_size + 1),
            ..CollocationRequest::new("havet")
        };
        assert!(matches!(huge.validate(&cfg), Err(ExploreError::Validation(_))));
    }

    #[tokio::test]
    async fn pipeline_scores_and_renders() {
        let dir = tempfile::tempdir().unwrap();
        let refs = store(&dir);
        let stub = StubBackend::new(vec![StubDocument {
            record: DocumentRecord {
                dhlabid: Some(1),
                doctype: Some(DocumentType::Digibok),
                ..DocumentRecord::with_urn("u1")
            },
            text: "sol over havet i dag sol over havet".into(),
        }]);
        let corpus = Corpus::new(vec![stub.documents()[0].record.clone()]);
        let cfg = ExploreConfig::default();
        let renderer = BitmapCloudRenderer::new(200, 100, cfg.cloud_background);
        let request = CollocationRequest {
            before: 1,
            after: 1,
            ..CollocationRequest::new("havet")
        };

        let result = collocations(&stub, &refs, &renderer, &corpus, &request, &cfg)
            .await
            .unwrap();
        assert!(!result.table.is_empty());
        assert!(result.table.rows.iter().all(|r| !r.relevance.is_nan()));
        assert!(result
            .table
            .rows
            .windows(2)
            .all(|w| w[0].relevance >= w[1].relevance));
        assert_eq!(result.image.width(), 200);
        assert_eq!(stub.collocation_calls(), 1);
    }

    #[tokio::test]
    async fn unknown_reference_fails_before_service_call() {
        let dir = tempfile::tempdir().unwrap();
        let refs = store(&dir);
        let stub = StubBackend::generated(1);
        let corpus = Corpus::new(vec![stub.documents()[0].record.clone()]);
        let request = CollocationRequest {
            reference: "ukjent".into(),
            ..CollocationRequest::new("havet")
        };
        let renderer = BitmapCloudRenderer::new(10, 10, [255, 255, 255]);
        let err = collocations(&stub, &refs, &renderer, &corpus, &request, &ExploreConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err, ExploreError::UnknownReference("ukjent".into()));
        assert_eq!(stub.collocation_calls(), 0);
    }

    #[tokio::test]
    async fn empty_corpus_gives_empty_table_and_blank_cloud() {
        let dir = tempfile::tempdir().unwrap();
        let refs = store(&dir);
        let stub = StubBackend::generated(1);
        let renderer = BitmapCloudRenderer::new(10, 10, [255, 255, 255]);
        let result = collocations(
            &stub,
            &refs,
            &renderer,
            &Corpus::empty(),
            &CollocationRequest::new("havet"),
            &ExploreConfig::default(),
        )
        .await
        .unwrap();
        assert!(result.table.is_empty());
        assert!(result.image.pixels().iter().all(|b| *b == 255));
        assert_eq!(stub.collocation_calls(), 0);
    }
}
