use thiserror::Error;

/// Failures constructing a client. Call-time failures are reported as
/// [`corpus::CapabilityError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("invalid client config: {0}")]
    InvalidConfig(String),
    /// The HTTP client could not be built (TLS backend, proxy settings).
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}
