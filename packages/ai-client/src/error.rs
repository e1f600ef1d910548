//! Error types for the Workers AI client.

use thiserror::Error;

/// Result type for Workers AI client operations.
pub type Result<T> = std::result::Result<T, WorkersAiError>;

/// Workers AI client errors.
#[derive(Debug, Error)]
pub enum WorkersAiError {
    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response, or `success: false` in the envelope)
    #[error("API error: {0}")]
    Api(String),

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}
