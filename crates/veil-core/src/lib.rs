//! # Veil Core
//!
//! Pure primitives underneath the Veil envelope format: digests, the
//! canonical CBOR codec, the leaf value codec, and compression.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over byte strings.
//!
//! ## Key Types
//!
//! - [`Digest`] - 32-byte Blake3 digest, the identity of every envelope element
//! - [`ToCbor`] / [`FromCbor`] - leaf value conversion
//! - [`Compressed`] - zstd payload carrying the digest of its original
//! - [`Date`] - epoch-seconds timestamp leaf
//!
//! ## Canonicalization
//!
//! All values are encoded using deterministic CBOR. See [`canonical`] module.

pub mod canonical;
pub mod cbor;
pub mod compressed;
pub mod digest;
pub mod error;
pub mod tags;

pub use canonical::DecodeLimits;
pub use cbor::{Date, FromCbor, ToCbor};
pub use compressed::{Compressed, CompressionConfig};
pub use digest::{Digest, DigestProvider, DIGEST_LEN};
pub use error::{CoreError, Result};

/// Re-exported so downstream crates name the same `Value` type.
pub use ciborium::value::Value;
