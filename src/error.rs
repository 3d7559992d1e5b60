//! Error types for metadata extraction runs
//!
//! Anything returned as an [`ExtractError`] is fatal for the current run. Per-file probe
//! failures are not errors; they are reported through
//! [`ProbeOutcome::Failure`](crate::services::ProbeOutcome::Failure).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to resolve file with path hash {path_hash}: {reason}")]
    Resolution { path_hash: String, reason: String },

    #[error("Prober unavailable: {0}")]
    ProberUnavailable(String),

    #[error("Failed to serialize probe payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExtractError {
    pub fn resolution(path_hash: impl Into<String>, reason: impl Into<String>) -> Self {
        ExtractError::Resolution {
            path_hash: path_hash.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;
