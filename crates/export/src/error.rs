use thiserror::Error;

/// Failures while assembling an export archive. None of them are caused by
/// the request, so all map to an internal error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("failed to write spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("failed to write archive: {0}")]
    Archive(String),

    #[error("failed to render readme: {0}")]
    Template(String),
}

impl ExportError {
    pub fn is_client_error(&self) -> bool {
        false
    }

    pub fn http_status_code(&self) -> u16 {
        500
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Spreadsheet(err.to_string())
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(err: zip::result::ZipError) -> Self {
        ExportError::Archive(err.to_string())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Archive(err.to_string())
    }
}

impl From<minijinja::Error> for ExportError {
    fn from(err: minijinja::Error) -> Self {
        ExportError::Template(err.to_string())
    }
}
