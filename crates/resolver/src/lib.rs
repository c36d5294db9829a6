//! Corpus resolution
//!
//! [`CorpusResolver`] turns a [`corpus::CorpusHandle`], a
//! [`corpus::CorpusMetadata`] query or an uploaded spreadsheet into a shared
//! [`corpus::Corpus`]. Results are held in two bounded LRU caches owned by the
//! resolver instance:
//!
//! - query corpora keyed by canonical metadata, so equal queries share one
//!   entry no matter how their parameters were spelled
//! - identifier corpora keyed by the ordered, de-duplicated identifier list
//!
//! Concurrent misses on the same key wait on a per-key gate and share one
//! call to the search service. Failed calls are reported, never cached.

mod cache;
mod config;
mod error;
mod resolver;
mod upload;

pub use crate::cache::CacheStats;
pub use crate::config::{ResolverConfig, CACHE_SIZE_ENV};
pub use crate::error::ResolveError;
pub use crate::resolver::{canonical_identifiers, CorpusResolver, ResolverStats};
pub use crate::upload::{read_identifiers, UploadFormat, UploadLayout};
