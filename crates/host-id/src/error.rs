//! Host identity errors

use thiserror::Error;

/// Errors returned while probing the host identity.
#[derive(Debug, Error)]
pub enum HostIdError {
    /// Request could not be sent or the response body not read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Metadata service answered with a non-success status
    #[error("Metadata service returned status {0}")]
    Status(u16),

    /// Response body was not a metadata document
    #[error("Invalid metadata document: {0}")]
    Deserialization(#[from] serde_json::Error),
}
