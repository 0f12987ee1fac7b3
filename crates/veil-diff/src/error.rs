//! Error types for diffing.

use thiserror::Error;

use veil_envelope::EnvelopeError;

/// Errors that can occur while producing or applying a diff.
#[derive(Debug, Error)]
pub enum DiffError {
    /// The edit script is malformed or does not apply to this envelope.
    #[error("invalid diff: {0}")]
    InvalidDiff(String),

    /// Envelope error.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),
}

impl DiffError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidDiff(msg.into())
    }
}

/// Result type for diff operations.
pub type Result<T> = std::result::Result<T, DiffError>;
