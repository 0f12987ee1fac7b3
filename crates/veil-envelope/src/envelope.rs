//! The envelope tree.
//!
//! An [`Envelope`] is an immutable handle to one node of a Merkle-like tree.
//! Every node carries a digest that depends only on the semantic content
//! below it, so any subtree can later be swapped for an obscured stand-in
//! (elided, encrypted, compressed) without changing a single digest above it.
//!
//! ## Digests
//!
//! | Case | Digest |
//! |------|--------|
//! | Leaf | `H(canonical(tag(24, value)))` |
//! | KnownValue | `H(canonical(tag(202, code)))` |
//! | Wrapped | `H(inner)` |
//! | Assertion | `H(predicate ‖ object)` |
//! | Node | `H(subject ‖ assertions in ascending digest order)` |
//! | Encrypted, Compressed, Elided | digest of what they stand for |

use std::fmt;
use std::sync::Arc;

use veil_core::{canonical, tags, Compressed, Digest, DigestProvider, ToCbor, Value};
use veil_crypto::EncryptedMessage;

use crate::assertion::Assertion;
use crate::encodable::EnvelopeEncodable;
use crate::error::{EnvelopeError, Result};
use crate::known_values::KnownValue;

/// A cheaply clonable handle to an immutable envelope node.
#[derive(Clone)]
pub struct Envelope(Arc<EnvelopeCase>);

/// The variants an envelope node can take.
#[derive(Debug)]
pub enum EnvelopeCase {
    /// A subject decorated with one or more assertions.
    Node {
        subject: Envelope,
        assertions: Vec<Envelope>,
        digest: Digest,
    },
    /// An opaque typed value.
    Leaf { cbor: Value, digest: Digest },
    /// A boxed envelope.
    Wrapped { envelope: Envelope, digest: Digest },
    /// An interned symbol.
    KnownValue { value: KnownValue, digest: Digest },
    /// A predicate/object pair.
    Assertion(Assertion),
    /// Obscured, recoverable with the right key.
    Encrypted {
        message: EncryptedMessage,
        digest: Digest,
    },
    /// Obscured for size, recoverable by anyone.
    Compressed {
        compressed: Compressed,
        digest: Digest,
    },
    /// Obscured, only the digest remains.
    Elided(Digest),
}

impl Envelope {
    fn from_case(case: EnvelopeCase) -> Self {
        Self(Arc::new(case))
    }

    /// The underlying variant.
    pub fn case(&self) -> &EnvelopeCase {
        &self.0
    }

    /// Create an envelope from anything envelope-encodable.
    ///
    /// Leaf-encodable values become leaves, known values and assertions
    /// keep their own variant, and an existing envelope is wrapped.
    pub fn new(subject: impl EnvelopeEncodable) -> Self {
        subject.into_envelope()
    }

    /// Create a leaf from any CBOR-encodable value.
    pub fn new_leaf(value: impl ToCbor) -> Self {
        Self::new_leaf_value(value.to_cbor())
    }

    /// Create a leaf from a raw CBOR value.
    pub fn new_leaf_value(cbor: Value) -> Self {
        let tagged = Value::Tag(tags::LEAF, Box::new(cbor.clone()));
        let digest = Digest::from_image(&canonical::encode(&tagged));
        Self::from_case(EnvelopeCase::Leaf { cbor, digest })
    }

    pub fn new_known_value(value: KnownValue) -> Self {
        let digest = Digest::from_image(&canonical::encode(&value.to_cbor()));
        Self::from_case(EnvelopeCase::KnownValue { value, digest })
    }

    /// Box `envelope` so it can carry assertions or be obscured as a unit.
    pub fn new_wrapped(envelope: Envelope) -> Self {
        let digest = Digest::from_digests(&[envelope.digest()]);
        Self::from_case(EnvelopeCase::Wrapped { envelope, digest })
    }

    /// Same as [`Envelope::new_wrapped`].
    pub fn from_envelope(envelope: Envelope) -> Self {
        Self::new_wrapped(envelope)
    }

    /// Create an assertion envelope, promoting both operands.
    pub fn new_assertion(
        predicate: impl EnvelopeEncodable,
        object: impl EnvelopeEncodable,
    ) -> Self {
        Self::new_with_assertion(Assertion::new(predicate, object))
    }

    /// Create an assertion envelope from operands used exactly as given.
    pub fn new_assertion_with_envelopes(predicate: Envelope, object: Envelope) -> Self {
        Self::new_with_assertion(Assertion::from_envelopes(predicate, object))
    }

    pub fn new_with_assertion(assertion: Assertion) -> Self {
        Self::from_case(EnvelopeCase::Assertion(assertion))
    }

    pub fn new_elided(digest: Digest) -> Self {
        Self::from_case(EnvelopeCase::Elided(digest))
    }

    /// Wrap an encrypted message. The message must record the digest of
    /// the envelope it encrypts.
    pub fn new_with_encrypted(message: EncryptedMessage) -> Result<Self> {
        let digest = message.aad_digest().ok_or(EnvelopeError::MissingDigest)?;
        Ok(Self::from_case(EnvelopeCase::Encrypted { message, digest }))
    }

    /// Wrap a compressed payload. The payload must record the digest of
    /// the envelope it compresses.
    pub fn new_with_compressed(compressed: Compressed) -> Result<Self> {
        let digest = *compressed
            .digest_ref_opt()
            .ok_or(EnvelopeError::MissingDigest)?;
        Ok(Self::from_case(EnvelopeCase::Compressed { compressed, digest }))
    }

    /// Attach assertions to `subject`, validating their shape.
    ///
    /// Each assertion must be assertion-shaped or obscured, and the subject
    /// must not itself be a node. Duplicates (by digest) collapse; an empty
    /// list yields the bare subject.
    pub fn new_with_assertions(subject: Envelope, assertions: Vec<Envelope>) -> Result<Self> {
        if subject.is_node() && !assertions.is_empty() {
            return Err(EnvelopeError::invalid_format("node subject cannot be a node"));
        }
        if let Some(bad) = assertions.iter().find(|a| !a.is_assertion_shaped()) {
            return Err(EnvelopeError::InvalidFormat(format!(
                "not an assertion: {}",
                bad.digest().short_description()
            )));
        }
        Ok(Self::new_with_unchecked_assertions(subject, assertions))
    }

    /// Build a node without checking assertion shape. Assertions are sorted
    /// by digest and deduplicated.
    pub(crate) fn new_with_unchecked_assertions(
        subject: Envelope,
        mut assertions: Vec<Envelope>,
    ) -> Self {
        if assertions.is_empty() {
            return subject;
        }
        debug_assert!(!subject.is_node());
        assertions.sort_by_key(|a| a.digest());
        assertions.dedup_by_key(|a| a.digest());

        let mut digests = Vec::with_capacity(assertions.len() + 1);
        digests.push(subject.digest());
        digests.extend(assertions.iter().map(|a| a.digest()));
        let digest = Digest::from_digests(&digests);

        Self::from_case(EnvelopeCase::Node {
            subject,
            assertions,
            digest,
        })
    }

    /// Encrypted stand-in whose digest is already known to match `message`.
    pub(crate) fn new_encrypted_unchecked(message: EncryptedMessage, digest: Digest) -> Self {
        Self::from_case(EnvelopeCase::Encrypted { message, digest })
    }

    pub(crate) fn new_compressed_unchecked(compressed: Compressed, digest: Digest) -> Self {
        Self::from_case(EnvelopeCase::Compressed { compressed, digest })
    }
}

// Digests and identity.
impl Envelope {
    /// The semantic digest of this element.
    pub fn digest(&self) -> Digest {
        match self.case() {
            EnvelopeCase::Node { digest, .. }
            | EnvelopeCase::Leaf { digest, .. }
            | EnvelopeCase::Wrapped { digest, .. }
            | EnvelopeCase::KnownValue { digest, .. }
            | EnvelopeCase::Encrypted { digest, .. }
            | EnvelopeCase::Compressed { digest, .. }
            | EnvelopeCase::Elided(digest) => *digest,
            EnvelopeCase::Assertion(assertion) => assertion.digest(),
        }
    }

    /// Digest of the wire encoding. Differs between an element and its
    /// obscured forms even though their digests agree.
    pub fn structure_digest(&self) -> Digest {
        Digest::from_image(&self.to_untagged_cbor_data())
    }

    /// Same semantic content.
    pub fn is_equivalent_to(&self, other: &Envelope) -> bool {
        self.digest() == other.digest()
    }

    /// Same semantic content and the same structure.
    pub fn is_identical_to(&self, other: &Envelope) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.is_equivalent_to(other) && self.structure_digest() == other.structure_digest())
    }
}

// Accessors.
impl Envelope {
    /// The subject of a node, or the envelope itself.
    pub fn subject(&self) -> Envelope {
        match self.case() {
            EnvelopeCase::Node { subject, .. } => subject.clone(),
            _ => self.clone(),
        }
    }

    /// The assertions of a node, or nothing.
    pub fn assertions(&self) -> Vec<Envelope> {
        match self.case() {
            EnvelopeCase::Node { assertions, .. } => assertions.clone(),
            _ => Vec::new(),
        }
    }

    pub fn has_assertions(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Node { .. })
    }

    /// The assertion this envelope's subject holds, if any.
    pub fn as_assertion(&self) -> Option<Assertion> {
        match self.subject().case() {
            EnvelopeCase::Assertion(assertion) => Some(assertion.clone()),
            _ => None,
        }
    }

    /// Predicate of the subject assertion.
    pub fn as_predicate(&self) -> Option<Envelope> {
        self.as_assertion().map(|a| a.predicate())
    }

    /// Object of the subject assertion.
    pub fn as_object(&self) -> Option<Envelope> {
        self.as_assertion().map(|a| a.object())
    }

    pub fn as_known_value(&self) -> Option<&KnownValue> {
        match self.case() {
            EnvelopeCase::KnownValue { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Value> {
        match self.case() {
            EnvelopeCase::Leaf { cbor, .. } => Some(cbor),
            _ => None,
        }
    }

    /// The envelope inside a wrapped subject.
    pub fn as_wrapped(&self) -> Option<Envelope> {
        match self.subject().case() {
            EnvelopeCase::Wrapped { envelope, .. } => Some(envelope.clone()),
            _ => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Node { .. })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Leaf { .. })
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Wrapped { .. })
    }

    pub fn is_known_value(&self) -> bool {
        matches!(self.case(), EnvelopeCase::KnownValue { .. })
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Assertion(_))
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Encrypted { .. })
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Compressed { .. })
    }

    pub fn is_elided(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Elided(_))
    }

    /// Elided, encrypted or compressed.
    pub fn is_obscured(&self) -> bool {
        self.is_elided() || self.is_encrypted() || self.is_compressed()
    }

    pub fn is_subject_assertion(&self) -> bool {
        self.subject().is_assertion()
    }

    pub fn is_subject_encrypted(&self) -> bool {
        self.subject().is_encrypted()
    }

    pub fn is_subject_compressed(&self) -> bool {
        self.subject().is_compressed()
    }

    pub fn is_subject_elided(&self) -> bool {
        self.subject().is_elided()
    }

    pub fn is_subject_obscured(&self) -> bool {
        self.subject().is_obscured()
    }

    /// Nodes, wrapped envelopes and assertions have children.
    pub fn is_internal(&self) -> bool {
        matches!(
            self.case(),
            EnvelopeCase::Node { .. } | EnvelopeCase::Wrapped { .. } | EnvelopeCase::Assertion(_)
        )
    }

    /// Whether this envelope may sit in a node's assertion list.
    pub(crate) fn is_assertion_shaped(&self) -> bool {
        self.is_subject_assertion() || self.is_subject_obscured()
    }
}

impl DigestProvider for Envelope {
    fn digest(&self) -> Digest {
        Envelope::digest(self)
    }
}

impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        self.is_identical_to(other)
    }
}

impl Eq for Envelope {}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Envelope({})", self.format_flat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::known_values;

    #[test]
    fn test_leaf_digest_is_stable() {
        let a = Envelope::new("Hello.");
        let b = Envelope::new_leaf(String::from("Hello."));
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), Envelope::new("Hello!").digest());
        assert!(a.is_leaf());
    }

    #[test]
    fn test_wrapped_digest_adds_a_step() {
        let inner = Envelope::new("Alice");
        let wrapped = inner.wrap();
        assert!(wrapped.is_wrapped());
        assert_eq!(wrapped.digest(), Digest::from_digests(&[inner.digest()]));
        assert_ne!(wrapped.digest(), inner.digest());
    }

    #[test]
    fn test_envelope_operand_is_wrapped() {
        let bob = Envelope::new("Bob");
        let assertion = Envelope::new_assertion("knows", bob.clone());
        assert_eq!(assertion.as_object().unwrap(), bob.wrap());

        let direct = Envelope::new_assertion_with_envelopes(Envelope::new("knows"), bob.clone());
        assert_eq!(direct.as_object().unwrap(), bob);
    }

    #[test]
    fn test_known_value_operand() {
        let assertion = Envelope::new_assertion(known_values::IS_A, "Person");
        let predicate = assertion.as_predicate().unwrap();
        assert_eq!(predicate.as_known_value(), Some(&known_values::IS_A));
    }

    #[test]
    fn test_node_digest_composition() {
        let alice = Envelope::new("Alice");
        let knows = Envelope::new_assertion("knows", "Bob");
        let node = alice.add_assertion("knows", "Bob");

        assert!(node.is_node());
        assert_eq!(node.subject().digest(), alice.digest());
        assert_eq!(
            node.digest(),
            Digest::from_digests(&[alice.digest(), knows.digest()])
        );
    }

    #[test]
    fn test_assertions_are_sorted() {
        let node = Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .add_assertion("knows", "Carol")
            .add_assertion("knows", "Dan");
        let digests: Vec<Digest> = node.assertions().iter().map(|a| a.digest()).collect();
        let mut sorted = digests.clone();
        sorted.sort();
        assert_eq!(digests, sorted);
    }

    #[test]
    fn test_new_with_assertions_rejects_non_assertions() {
        let result = Envelope::new_with_assertions(
            Envelope::new("Alice"),
            vec![Envelope::new("not an assertion")],
        );
        assert!(matches!(result, Err(EnvelopeError::InvalidFormat(_))));

        let empty = Envelope::new_with_assertions(Envelope::new("Alice"), vec![]).unwrap();
        assert!(empty.is_leaf());

        let node = Envelope::new("Alice").add_assertion("knows", "Bob");
        let nested = Envelope::new_with_assertions(node, vec![Envelope::new_assertion("knows", "Carol")]);
        assert!(matches!(nested, Err(EnvelopeError::InvalidFormat(_))));
    }

    #[test]
    fn test_obscured_constructors_require_digest() {
        let key = veil_crypto::SymmetricKey::generate();
        let message = key.encrypt_message(b"x", None).unwrap();
        assert!(matches!(
            Envelope::new_with_encrypted(message),
            Err(EnvelopeError::MissingDigest)
        ));

        let compressed = Compressed::new(vec![], 0, None);
        assert!(matches!(
            Envelope::new_with_compressed(compressed),
            Err(EnvelopeError::MissingDigest)
        ));
    }

    #[test]
    fn test_equivalent_but_not_identical() {
        let envelope = Envelope::new("Alice").add_assertion("knows", "Bob");
        let elided = envelope.elide();
        assert!(envelope.is_equivalent_to(&elided));
        assert!(!envelope.is_identical_to(&elided));
        assert_ne!(envelope, elided);
        assert_eq!(envelope, envelope.clone());
    }

    #[test]
    fn test_accessors_on_other_variants() {
        let leaf = Envelope::new(42u64);
        assert!(leaf.as_assertion().is_none());
        assert!(leaf.as_predicate().is_none());
        assert!(leaf.as_known_value().is_none());
        assert!(leaf.as_wrapped().is_none());
        assert!(leaf.assertions().is_empty());
        assert_eq!(leaf.subject(), leaf);
    }

    #[test]
    fn test_envelope_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Envelope>();
    }
}
