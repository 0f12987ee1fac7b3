//! # Veil Testkit
//!
//! Shared test support for the envelope crates: pinned digests and wire
//! bytes, proptest strategies that produce envelopes together with
//! redactions of them, and deterministic parties holding signing and
//! agreement keys.
//!
//! ## Pinned Vectors
//!
//! ```rust
//! use veil_testkit::vectors::all_vectors;
//!
//! for vector in all_vectors() {
//!     let envelope = vector.envelope();
//!     assert_eq!(envelope.digest().to_hex(), vector.digest);
//! }
//! ```
//!
//! ## Strategies
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use veil_testkit::generators::envelope_and_redaction;
//!
//! proptest! {
//!     #[test]
//!     fn redaction_keeps_digest((e, redacted) in envelope_and_redaction()) {
//!         prop_assert_eq!(e.digest(), redacted.digest());
//!     }
//! }
//! ```
//!
//! ## Parties
//!
//! ```rust
//! use veil_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let credential = fixture.credential();
//! assert!(credential.verify(&fixture.alice.public_key()).is_ok());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, Party, TestFixture};
pub use vectors::{all_vectors, GoldenVector};
