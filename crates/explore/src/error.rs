//! Errors raised by the exploration pipelines.
//!
//! Every variant except [`ExploreError::ExternalCapabilityFailure`],
//! [`ExploreError::ReferenceLoad`] and [`ExploreError::Render`] is detected
//! from the request alone, before the analysis service is called.
use corpus::{CapabilityError, CorpusError, DocumentType};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ExploreError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    MixedDocumentTypes(CorpusError),

    #[error("limit {limit} exceeds the maximum of {max}")]
    LimitExceeded { limit: u32, max: u32 },

    #[error("window {window} exceeds the maximum of {max}")]
    WindowTooLarge { window: u32, max: u32 },

    #[error("unknown reference `{0}`")]
    UnknownReference(String),

    /// A configured reference exists but its file could not be read.
    #[error("failed to load reference `{name}`: {reason}")]
    ReferenceLoad { name: String, reason: String },

    #[error("unknown sort column `{column}`; expected one of {expected:?}")]
    UnknownSortColumn {
        column: String,
        expected: Vec<&'static str>,
    },

    #[error("analysis service failure: {0}")]
    ExternalCapabilityFailure(#[from] CapabilityError),

    #[error("failed to render image: {0}")]
    Render(String),
}

impl ExploreError {
    pub fn mixed_types(types: Vec<Option<DocumentType>>) -> Self {
        ExploreError::MixedDocumentTypes(CorpusError::MixedDocumentTypes(types))
    }

    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            ExploreError::ExternalCapabilityFailure(_)
                | ExploreError::ReferenceLoad { .. }
                | ExploreError::Render(_)
        )
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            ExploreError::ExternalCapabilityFailure(err) => err.http_status_code(),
            ExploreError::ReferenceLoad { .. } | ExploreError::Render(_) => 500,
            _ => 400,
        }
    }
}

impl From<CorpusError> for ExploreError {
    fn from(err: CorpusError) -> Self {
        match err {
            CorpusError::Validation(msg) => ExploreError::Validation(msg),
            mixed => ExploreError::MixedDocumentTypes(mixed),
        }
    }
}
