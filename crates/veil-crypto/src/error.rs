//! Error types for the cryptographic primitives.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption error.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Decryption error (wrong key, tampered ciphertext or associated data).
    #[error("decryption error: {0}")]
    Decryption(String),

    /// Key material of the wrong shape.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Signature did not verify.
    #[error("invalid signature")]
    InvalidSignature,

    /// Public key bytes are not a valid point.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Shares cannot be combined into a secret.
    #[error("invalid shares: {0}")]
    InvalidShares(String),

    /// Split specification out of range.
    #[error("invalid split specification: {0}")]
    InvalidSpec(String),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] veil_core::CoreError),
}

/// Result type for cryptographic operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
