//! Caller-held corpus identity.
//!
//! The explorer keeps no per-user state between calls. A client that has
//! built a corpus passes one of these back on every follow-up request and the
//! resolver turns it into the (usually cached) [`Corpus`](crate::Corpus).
use serde::{Deserialize, Serialize};

use crate::metadata::CorpusMetadata;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorpusHandle {
    /// A corpus defined by a metadata query.
    Query { params: CorpusMetadata },
    /// A corpus defined by an explicit, ordered identifier list.
    Identifiers { urns: Vec<String> },
}

impl CorpusHandle {
    /// Readme definition: the metadata fields, or nothing for uploads.
    pub fn definition(&self) -> Vec<(&'static str, String)> {
        match self {
            CorpusHandle::Query { params } => params.definition(),
            CorpusHandle::Identifiers { .. } => Vec::new(),
        }
    }

    pub fn corpus_name(&self) -> Option<&str> {
        match self {
            CorpusHandle::Query { params } => params.corpus_name(),
            CorpusHandle::Identifiers { .. } => None,
        }
    }
}

impl From<CorpusMetadata> for CorpusHandle {
    fn from(params: CorpusMetadata) -> Self {
        CorpusHandle::Query { params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_handle_shape() {
        let handle: CorpusHandle = serde_json::from_value(json!({
            "kind": "query",
            "params": { "doc_type_selection": "digibok", "title": "Sult" }
        }))
        .unwrap();
        match &handle {
            CorpusHandle::Query { params } => assert_eq!(params.title(), Some("Sult")),
            other => panic!("unexpected handle {other:?}"),
        }
        assert!(!handle.definition().is_empty());
    }

    #[test]
    fn identifier_handle_has_empty_definition() {
        let handle: CorpusHandle = serde_json::from_value(json!({
            "kind": "identifiers",
            "urns": ["URN:NBN:no-nb_digibok_1", "URN:NBN:no-nb_digibok_2"]
        }))
        .unwrap();
        assert!(handle.definition().is_empty());
        assert_eq!(handle.corpus_name(), None);
    }

    #[test]
    fn invalid_params_are_rejected_at_decode() {
        let result = serde_json::from_value::<CorpusHandle>(json!({
            "kind": "query",
            "params": { "doc_type_selection": "digavis", "author": "Ibsen" }
        }));
        assert!(result.is_err());
    }
}
