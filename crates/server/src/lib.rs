//! Korpus Server - HTTP REST API for the DH-LAB corpus explorer
//!
//! Exposes corpus building, concordances, collocations and zip exports over
//! JSON. Corpora are stateless from the server's point of view: every response
//! that builds one carries a `handle` the client sends back on follow-up calls.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /metrics` - Uptime and corpus cache counters
//! - `POST /api/v1/corpus` - Build a corpus from search parameters
//! - `POST /api/v1/corpus/upload` - Build a corpus from a spreadsheet (multipart field `spreadsheet`)
//! - `POST /api/v1/concordances` - Keyword-in-context search
//! - `POST /api/v1/collocations` - Ranked collocates
//! - `POST /api/v1/export/corpus` - Corpus workbook and readme as a zip
//! - `POST /api/v1/export/concordances` - Corpus plus concordances as a zip
//! - `POST /api/v1/export/collocations` - Corpus plus collocations and word cloud as a zip
//!
//! Errors are JSON: `{"error": {"code": "...", "message": "..."}}`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
