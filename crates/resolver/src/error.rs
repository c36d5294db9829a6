//! Resolver error taxonomy.
//!
//! Everything except [`ResolveError::ExternalCapabilityFailure`] is caused by
//! the caller's input and detected before the search service is called.
use corpus::{CapabilityError, CorpusError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResolveError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported file format `{filename}`: expected .csv, .xls, .xlsx or .zip")]
    UnsupportedFileFormat { filename: String },

    #[error("spreadsheet has no `{column}` column")]
    MissingColumn { column: String },

    /// The uploaded archive lacks the corpus spreadsheet.
    #[error("archive does not contain a corpus ({entry})")]
    MissingCorpusEntry { entry: String },

    /// The corpus entry inflates past the configured size.
    #[error("{entry} exceeds {max_bytes} bytes uncompressed")]
    EntryTooLarge { entry: String, max_bytes: u64 },

    /// The file has a recognized extension but could not be read.
    #[error("unreadable spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("search service failure: {0}")]
    ExternalCapabilityFailure(#[from] CapabilityError),
}

impl ResolveError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ResolveError::ExternalCapabilityFailure(_))
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            ResolveError::ExternalCapabilityFailure(err) => err.http_status_code(),
            _ => 400,
        }
    }
}

impl From<CorpusError> for ResolveError {
    fn from(err: CorpusError) -> Self {
        match err {
            CorpusError::Validation(msg) => ResolveError::Validation(msg),
            other => ResolveError::Validation(other.to_string()),
        }
    }
}
