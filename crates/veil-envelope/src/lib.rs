//! # Veil Envelope
//!
//! Content-addressed, selectively redactable envelopes.
//!
//! An [`Envelope`] is an immutable tree: a subject carrying zero or more
//! assertions (`predicate: object`), where every part is itself an
//! envelope. Every element has a Blake3 [`Digest`] computed from its
//! content, and any element can be elided, encrypted or compressed without
//! changing the digest of anything above it. That one invariant is what
//! makes redaction, inclusion proofs and signatures compose.
//!
//! ## Key Types
//!
//! - [`Envelope`] - the tree, shared behind an `Arc`
//! - [`Assertion`] - a `predicate: object` pair
//! - [`KnownValue`] - integer-coded well-known predicates like `'isA'`
//! - [`ObscureAction`] - what elision turns a selected element into
//! - [`EdgeType`] - how a walked element hangs off its parent
//!
//! ## Example
//!
//! ```
//! use veil_envelope::Envelope;
//!
//! let envelope = Envelope::new("Alice").add_assertion("knows", "Bob");
//! let redacted = envelope.elide_removing_target(&Envelope::new("Bob"));
//!
//! assert_eq!(redacted.digest(), envelope.digest());
//! assert_eq!(redacted.format_flat(), r#""Alice" [ "knows": ELIDED ]"#);
//! ```

pub mod assertion;
pub mod assertions;
pub mod compress;
pub mod config;
pub mod elide;
pub mod encodable;
pub mod encrypt;
pub mod envelope;
pub mod error;
pub mod format;
pub mod known_values;
pub mod proof;
pub mod queries;
pub mod recipient;
pub mod salt;
pub mod signature;
pub mod sskr;
pub mod walk;
pub mod wire;

pub use assertion::Assertion;
pub use config::CodecConfig;
pub use elide::ObscureAction;
pub use encodable::{EnvelopeDecodable, EnvelopeEncodable};
pub use envelope::{Envelope, EnvelopeCase};
pub use error::{EnvelopeError, Result};
pub use known_values::{known_values, register_known_values, KnownValue, KnownValuesStore};
pub use salt::Salt;
pub use walk::EdgeType;

pub use veil_core::{Digest, DigestProvider};
