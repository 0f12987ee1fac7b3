//! Error types for envelope operations.

use thiserror::Error;

use veil_core::CoreError;
use veil_crypto::CryptoError;

/// Errors that can occur while building, querying, obscuring or decoding
/// envelopes.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Structurally invalid envelope or leaf value.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// A recovered element does not hash to the digest it claims.
    #[error("digest mismatch")]
    InvalidDigest,

    /// An obscured element carries no digest.
    #[error("missing digest")]
    MissingDigest,

    /// More than one assertion matches the predicate.
    #[error("ambiguous predicate")]
    AmbiguousPredicate,

    /// No assertion matches the predicate.
    #[error("nonexistent predicate")]
    NonexistentPredicate,

    #[error("already encrypted")]
    AlreadyEncrypted,

    #[error("already elided")]
    AlreadyElided,

    #[error("not encrypted")]
    NotEncrypted,

    #[error("not compressed")]
    NotCompressed,

    #[error("not wrapped")]
    NotWrapped,

    /// No sealed key on the envelope opens for this recipient.
    #[error("invalid recipient")]
    InvalidRecipient,

    /// Shares are insufficient or do not recover a working key.
    #[error("invalid shares")]
    InvalidShares,

    /// Authenticated decryption failed.
    #[error("invalid key")]
    InvalidKey,

    /// No matching signature verified.
    #[error("could not verify a signature")]
    UnverifiedSignature,

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Crypto error.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl EnvelopeError {
    pub(crate) fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }
}

/// Result type for envelope operations.
pub type Result<T> = std::result::Result<T, EnvelopeError>;
