//! # Veil Crypto
//!
//! Cryptographic primitives used by Veil envelopes.
//!
//! ## Overview
//!
//! - **Symmetric**: ChaCha20-Poly1305 with the plaintext digest bound as
//!   associated data ([`SymmetricKey`], [`EncryptedMessage`])
//! - **Agreement**: X25519 keys and key derivation ([`X25519StaticSecret`])
//! - **Sealing**: a content key encrypted to one recipient ([`SealedMessage`])
//! - **Signing**: Ed25519 ([`Keypair`], [`PublicKey`], [`Signature`])
//! - **Sharing**: threshold splitting of a secret ([`SskrShare`])
//!
//! ## Encryption Model
//!
//! Encrypted content uses a two-layer key model:
//!
//! 1. **Content Key**: A symmetric key that encrypts the envelope subject
//! 2. **Sealed Keys**: The content key is sealed to each recipient via X25519
//!    ECDH, or split into threshold shares
//!
//! Every operation that consumes randomness has a `_using` form taking an
//! explicit `RngCore + CryptoRng`, so tests can be fully deterministic.

pub mod agreement;
pub mod error;
pub mod sealed;
pub mod signing;
pub mod sskr;
pub mod symmetric;

pub use agreement::{X25519PublicKey, X25519StaticSecret};
pub use error::{CryptoError, Result};
pub use sealed::SealedMessage;
pub use signing::{Keypair, PublicKey, Signature};
pub use sskr::{
    sskr_combine, sskr_generate, sskr_generate_using, SskrShare, SskrSpec, MAX_SHARE_COUNT,
};
pub use symmetric::{EncryptedMessage, Nonce, SymmetricKey};
