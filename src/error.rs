//! Common error types for CastMatch

use thiserror::Error;

/// Common result type for CastMatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error, aggregating the per-component error enums
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Wizard transition or validation error
    #[error("Wizard error: {0}")]
    Wizard(#[from] crate::wizard::WizardError),

    /// Scoring service client error
    #[error("Matching error: {0}")]
    Matching(#[from] crate::matching::MatchingError),

    /// Result transport encode/decode error
    #[error("Codec error: {0}")]
    Codec(#[from] crate::codec::CodecError),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
