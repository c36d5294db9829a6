//! Corpus data model
//!
//! Everything the explorer stages pass between each other lives here: the
//! canonical corpus definition that doubles as a cache key, the resolved
//! document table, the handle callers keep between requests, and the two
//! traits that stand in for the external search/analysis service.
//!
//! Nothing in this crate does I/O. The HTTP client, resolver, pipelines and
//! bundler all build on these types.
//!
//! ```
//! use corpus::{CorpusMetadata, DocumentType};
//!
//! let meta = CorpusMetadata::from_params([
//!     ("doc_type_selection", "newspaper"),
//!     ("from_year", "1990"),
//!     ("to_year", "2020"),
//!     ("num_docs", "1000"),
//! ])
//! .unwrap();
//!
//! assert_eq!(meta.document_type(), DocumentType::Digavis);
//! assert_eq!(meta.num_docs(), 1000);
//! ```

pub mod backend;
pub mod columns;
pub mod error;
pub mod handle;
pub mod metadata;
pub mod reference;
pub mod timefmt;
pub mod types;

pub use crate::backend::{
    AnalysisBackend, CollocateScore, CollocationQuery, ConcordanceHit, ConcordanceQuery,
    SearchBackend,
};
pub use crate::columns::{ColumnCatalog, ColumnSet};
pub use crate::error::{CapabilityError, CorpusError};
pub use crate::handle::CorpusHandle;
pub use crate::metadata::{CorpusMetadata, CorpusParams, DEFAULT_NUM_DOCS, MAX_NUM_DOCS};
pub use crate::reference::ReferenceTable;
pub use crate::timefmt::{format_timestamp, parse_timestamp, TIMESTAMP_SENTINEL};
pub use crate::types::{
    document_link, Corpus, DocumentRecord, DocumentType, SearchOrder, TimeGranularity,
    CORPUS_COLUMNS,
};
