//! Error types shared by every stage that touches a corpus.
//!
//! Two families live here:
//!
//! | Error | Category | Description |
//! |-------|----------|-------------|
//! | [`CorpusError::Validation`] | Client | A request parameter is missing, malformed or not allowed |
//! | [`CorpusError::MixedDocumentTypes`] | Client | A corpus holds more than one document type |
//! | [`CapabilityError`] | Service | The external search/analysis service failed or timed out |
//!
//! Capability failures are never folded into an empty result: callers map them
//! to a service-level failure.
use std::fmt;

use thiserror::Error;

use crate::types::DocumentType;

/// Validation failures detected before any external call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CorpusError {
    /// Bad or missing input parameter. The message is safe to show verbatim.
    #[error("validation error: {0}")]
    Validation(String),

    /// The corpus mixes document types; the offending set is reported in order.
    /// `None` stands for rows without a type.
    #[error("corpus contains mixed document types: {}", DocumentTypeList(.0))]
    MixedDocumentTypes(Vec<Option<DocumentType>>),
}

impl CorpusError {
    /// Shorthand used by the parameter canonicalization code.
    pub fn validation(msg: impl Into<String>) -> Self {
        CorpusError::Validation(msg.into())
    }

    /// Every corpus error is user-correctable.
    pub fn is_client_error(&self) -> bool {
        true
    }

    /// Suggested HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        400
    }
}

struct DocumentTypeList<'a>(&'a [Option<DocumentType>]);

impl fmt::Display for DocumentTypeList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, doctype) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            f.write_str(doctype.map_or("untyped", DocumentType::code))?;
        }
        Ok(())
    }
}

/// Failures reported by the external search or analysis capability.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// The request never produced a response (DNS, connect, reset...).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response could not be decoded into the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The call did not complete within the request-level timeout.
    #[error("external call timed out after {0}s")]
    Timeout(u64),
}

impl CapabilityError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CapabilityError::Timeout(_))
    }

    /// 504 for timeouts, 502 for everything else.
    pub fn http_status_code(&self) -> u16 {
        if self.is_timeout() {
            504
        } else {
            502
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_types_lists_offending_set() {
        let err = CorpusError::MixedDocumentTypes(vec![
            Some(DocumentType::Digibok),
            Some(DocumentType::Digavis),
        ]);
        assert_eq!(
            err.to_string(),
            "corpus contains mixed document types: digibok, digavis"
        );

        let err = CorpusError::MixedDocumentTypes(vec![None, Some(DocumentType::Digibok)]);
        assert_eq!(
            err.to_string(),
            "corpus contains mixed document types: untyped, digibok"
        );
        assert!(err.is_client_error());
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn validation_message_is_verbatim() {
        let err = CorpusError::validation("from_year must not exceed to_year");
        assert!(err.to_string().contains("from_year must not exceed to_year"));
    }

    #[test]
    fn capability_status_codes() {
        assert_eq!(CapabilityError::Timeout(30).http_status_code(), 504);
        assert_eq!(
            CapabilityError::Status {
                status: 500,
                body: "boom".into()
            }
            .http_status_code(),
            502
        );
        assert!(CapabilityError::Timeout(1).is_timeout());
        assert!(!CapabilityError::Decode("x".into()).is_timeout());
    }
}
