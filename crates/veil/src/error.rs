//! Error type spanning the component crates.

use thiserror::Error;

use veil_core::CoreError;
use veil_crypto::CryptoError;
use veil_diff::DiffError;
use veil_envelope::EnvelopeError;

/// Any error produced by a Veil operation.
#[derive(Debug, Error)]
pub enum VeilError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("diff error: {0}")]
    Diff(#[from] DiffError),
}

/// Result type for Veil operations.
pub type Result<T> = std::result::Result<T, VeilError>;
