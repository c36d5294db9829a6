use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use korpus::{CapabilityError, CorpusError, ExploreError, ExplorerError, ResolveError};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Explorer(#[from] ExplorerError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Explorer(err) => StatusCode::from_u16(err.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::Explorer(err) => explorer_code(err),
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }
}

fn capability_code(err: &CapabilityError) -> &'static str {
    if err.is_timeout() {
        "EXTERNAL_TIMEOUT"
    } else {
        "EXTERNAL_CAPABILITY_FAILURE"
    }
}

fn explorer_code(err: &ExplorerError) -> &'static str {
    match err {
        ExplorerError::Corpus(CorpusError::MixedDocumentTypes(_)) => "MIXED_DOCUMENT_TYPES",
        ExplorerError::Corpus(_) => "VALIDATION_ERROR",
        ExplorerError::Resolve(err) => match err {
            ResolveError::UnsupportedFileFormat { .. } => "UNSUPPORTED_FILE_FORMAT",
            ResolveError::MissingColumn { .. } => "MISSING_COLUMN",
            ResolveError::MissingCorpusEntry { .. } => "MISSING_CORPUS_ENTRY",
            ResolveError::EntryTooLarge { .. } => "ENTRY_TOO_LARGE",
            ResolveError::Spreadsheet(_) => "UNREADABLE_SPREADSHEET",
            ResolveError::ExternalCapabilityFailure(cap) => capability_code(cap),
            _ => "VALIDATION_ERROR",
        },
        ExplorerError::Explore(err) => match err {
            ExploreError::MixedDocumentTypes(_) => "MIXED_DOCUMENT_TYPES",
            ExploreError::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            ExploreError::WindowTooLarge { .. } => "WINDOW_TOO_LARGE",
            ExploreError::UnknownReference(_) => "UNKNOWN_REFERENCE",
            ExploreError::ReferenceLoad { .. } => "REFERENCE_LOAD_ERROR",
            ExploreError::UnknownSortColumn { .. } => "UNKNOWN_SORT_COLUMN",
            ExploreError::ExternalCapabilityFailure(cap) => capability_code(cap),
            ExploreError::Render(_) => "RENDER_ERROR",
            _ => "VALIDATION_ERROR",
        },
        ExplorerError::Export(_) => "EXPORT_ERROR",
        ExplorerError::Config(_) | ExplorerError::Client(_) => "CONFIG_ERROR",
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code().to_string();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::warn!(code = %error_code, error = %message, "request_failed");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("JSON parse error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl From<CorpusError> for ServerError {
    fn from(err: CorpusError) -> Self {
        ServerError::Explorer(err.into())
    }
}
