//! Error types for the Veil core primitives.

use thiserror::Error;

/// Errors raised by the codec, digest and compression primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("non-canonical encoding")]
    NonCanonical,

    #[error("nesting depth exceeds limit of {0}")]
    DepthExceeded(usize),

    #[error("input of {len} bytes exceeds limit of {limit}")]
    InputTooLarge { len: usize, limit: usize },

    #[error("decoding error: {0}")]
    Decoding(String),

    #[error("compression error: {0}")]
    Compression(String),

    #[error("decompression error: {0}")]
    Decompression(String),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    InvalidDigest { expected: String, actual: String },
}

impl CoreError {
    /// Shorthand for an [`CoreError::InvalidFormat`] with a message.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        CoreError::InvalidFormat(msg.into())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
