//! Error types for Synheart Lexis

use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Annotation unavailable: {0}")]
    AnnotationUnavailable(String),

    #[error("Malformed metadata: {0}")]
    MalformedMetadata(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Failed to parse annotated document: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
