//! # Veil
//!
//! The unified API for Veil envelopes: content-addressed trees whose parts
//! can be elided, encrypted or compressed without changing any digest
//! above them.
//!
//! ## Overview
//!
//! - **Envelopes**: a subject with `predicate: object` assertions, every
//!   part itself an envelope with a Blake3 digest
//! - **Redaction**: elide, encrypt or compress any set of elements while
//!   the root digest stays fixed
//! - **Proofs**: show that a digest is inside an envelope while revealing
//!   nothing else
//! - **Diffs**: turn one envelope into another with a portable edit script
//! - **Keys**: signatures, per-recipient sealing and threshold sharing
//!
//! ## Usage
//!
//! ```rust
//! use veil::{Envelope, EnvelopeDiff, SymmetricKey};
//!
//! let alice = Envelope::new("Alice").add_assertion("knows", "Bob");
//!
//! // Redact the object; the digest is unchanged.
//! let redacted = alice.elide_removing_target(&Envelope::new("Bob"));
//! assert_eq!(redacted.format_flat(), r#""Alice" [ "knows": ELIDED ]"#);
//! assert_eq!(redacted.digest(), alice.digest());
//!
//! // Encrypt the subject only.
//! let key = SymmetricKey::generate();
//! let sealed = alice.encrypt_subject(&key).unwrap();
//! assert_eq!(sealed.decrypt_subject(&key).unwrap(), alice);
//!
//! // Diff and replay.
//! let updated = alice.add_assertion("knows", "Carol");
//! let diff = alice.diff(&updated);
//! assert_eq!(alice.transform(&diff).unwrap(), updated);
//! ```
//!
//! ## Re-exports
//!
//! - `veil::core` - digests, canonical CBOR, compression
//! - `veil::crypto` - symmetric, agreement, signing and sharing primitives
//! - `veil::envelope` - the envelope type and its operations
//! - `veil::diffs` - tree diffs between envelopes

pub mod config;
pub mod error;

pub use veil_core as core;
pub use veil_crypto as crypto;
pub use veil_diff as diffs;
pub use veil_envelope as envelope;

pub use config::VeilConfig;
pub use error::{Result, VeilError};

pub use veil_core::{Compressed, CompressionConfig, Digest, DigestProvider};
pub use veil_crypto::{
    Keypair, PublicKey, SealedMessage, Signature, SskrShare, SskrSpec, SymmetricKey,
    X25519PublicKey, X25519StaticSecret,
};
pub use veil_diff::{DiffConfig, DiffError, EnvelopeDiff};
pub use veil_envelope::{
    known_values, Assertion, CodecConfig, EdgeType, Envelope, EnvelopeCase, EnvelopeError,
    KnownValue, ObscureAction, Salt,
};
