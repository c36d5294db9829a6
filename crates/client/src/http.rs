//! HTTP implementation of the search and analysis capabilities.
use std::time::Instant;

use async_trait::async_trait;
use corpus::{
    AnalysisBackend, CapabilityError, CollocateScore, CollocationQuery, ConcordanceHit,
    ConcordanceQuery, Corpus, CorpusMetadata, ReferenceTable, SearchBackend,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::frame;

const BUILD_CORPUS: &str = "build_corpus";
const GET_METADATA: &str = "get_metadata";
const CONCORDANCE: &str = "conc";
const COLLOCATION: &str = "urncolldist_urn";

/// Client for the DH-LAB REST API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct DhlabClient {
    http: reqwest::Client,
    cfg: ClientConfig,
}

impl DhlabClient {
    pub fn new(cfg: ClientConfig) -> Result<Self, ClientError> {
        cfg.validate()?;
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .connect_timeout(cfg.connect_timeout())
            .pool_max_idle_per_host(cfg.pool_max_idle_per_host)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self { http, cfg })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    async fn post(&self, endpoint: &str, payload: Value) -> Result<Value, CapabilityError> {
        let url = self.cfg.endpoint(endpoint);
        let start = Instant::now();

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                endpoint,
                status = status.as_u16(),
                elapsed_micros = start.elapsed().as_micros() as u64,
                "dhlab_request_rejected"
            );
            return Err(CapabilityError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| CapabilityError::Decode(format!("invalid JSON from {endpoint}: {e}")))?;

        debug!(
            endpoint,
            elapsed_micros = start.elapsed().as_micros() as u64,
            "dhlab_request_success"
        );
        Ok(value)
    }

    fn transport_error(&self, endpoint: &str, err: reqwest::Error) -> CapabilityError {
        warn!(endpoint, error = %err, "dhlab_request_failed");
        if err.is_timeout() {
            CapabilityError::Timeout(self.cfg.timeout_secs)
        } else {
            CapabilityError::Transport(err.to_string())
        }
    }
}

/// Query parameters for `build_corpus`; unset fields are sent as `null`.
pub(crate) fn build_corpus_payload(meta: &CorpusMetadata) -> Value {
    json!({
        "doctype": meta.document_type().code(),
        "author": meta.author(),
        "freetext": Value::Null,
        "fulltext": meta.words_or_phrases(),
        "from_year": meta.from_year(),
        "to_year": meta.to_year(),
        "from_timestamp": Value::Null,
        "to_timestamp": Value::Null,
        "title": meta.title(),
        "ddk": meta.dewey(),
        "subject": meta.key_words(),
        "lang": meta.language(),
        "limit": meta.num_docs(),
        "order_by": meta.search_type().code(),
    })
}

#[async_trait]
impl SearchBackend for DhlabClient {
    async fn build_corpus(&self, metadata: &CorpusMetadata) -> Result<Corpus, CapabilityError> {
        let value = self.post(BUILD_CORPUS, build_corpus_payload(metadata)).await?;
        frame::decode_corpus(value)
    }

    async fn resolve_identifiers(&self, urns: &[String]) -> Result<Corpus, CapabilityError> {
        if urns.is_empty() {
            return Ok(Corpus::empty());
        }
        let value = self.post(GET_METADATA, json!({ "urns": urns })).await?;
        let found = frame::decode_corpus(value)?;

        // The service does not promise request order; restore it.
        let index = found.index_by_urn();
        let rows = urns
            .iter()
            .filter_map(|urn| index.get(urn.as_str()).map(|row| (*row).clone()))
            .collect();
        Ok(Corpus::new(rows))
    }
}

#[async_trait]
impl AnalysisBackend for DhlabClient {
    async fn concordances(
        &self,
        query: &ConcordanceQuery,
    ) -> Result<Vec<ConcordanceHit>, CapabilityError> {
        let payload = json!({
            "dhlabids": query.dhlabids,
            "query": query.query,
            "window": query.window,
            "limit": query.limit,
            "html_formatting": false,
        });
        let rows = frame::decode_rows(self.post(CONCORDANCE, payload).await?)?;
        rows.into_iter()
            .map(|row| {
                let urn = row.get("urn").and_then(Value::as_str);
                let conc = row.get("conc").or_else(|| row.get("concordance")).and_then(Value::as_str);
                match (urn, conc) {
                    (Some(urn), Some(conc)) => Ok(ConcordanceHit {
                        urn: urn.to_string(),
                        concordance: conc.to_string(),
                    }),
                    _ => Err(CapabilityError::Decode(
                        "concordance row without urn or context".into(),
                    )),
                }
            })
            .collect()
    }

    async fn collocations(
        &self,
        query: &CollocationQuery,
        reference: &ReferenceTable,
    ) -> Result<Vec<CollocateScore>, CapabilityError> {
        let payload = json!({
            "urn": query.urns,
            "word": query.words,
            "before": query.before,
            "after": query.after,
            "samplesize": query.sample_size,
        });
        let counts = frame::decode_counts(self.post(COLLOCATION, payload).await?)?;
        Ok(frame::score_collocates(counts, reference))
    }
}
