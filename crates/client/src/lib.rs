//! DH-LAB capability implementations
//!
//! Two implementations of [`corpus::SearchBackend`] and
//! [`corpus::AnalysisBackend`]:
//!
//! - [`DhlabClient`] talks to the DH-LAB REST API over HTTP.
//! - [`StubBackend`] answers from an in-memory, deterministic document list.
//!   Tests, benches and offline demos use it; it also counts calls so cache
//!   behaviour can be asserted.
//!
//! Network failures, non-success statuses and undecodable bodies all come
//! back as [`corpus::CapabilityError`]. Nothing is retried here.
//!
//! ```no_run
//! use client::{ClientConfig, DhlabClient};
//! use corpus::{CorpusMetadata, SearchBackend};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DhlabClient::new(ClientConfig::default())?;
//! let meta = CorpusMetadata::from_params([("doc_type_selection", "digibok"), ("title", "Sult")])?;
//! let corpus = client.build_corpus(&meta).await?;
//! println!("{} documents", corpus.len());
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod frame;
mod http;
mod stub;

pub use crate::config::{ClientConfig, DEFAULT_BASE_URL};
pub use crate::error::ClientError;
pub use crate::http::DhlabClient;
pub use crate::stub::{StubBackend, StubDocument};
