//! Predicate/object pairs.

use std::hash::{Hash, Hasher};

use veil_core::{Digest, DigestProvider};

use crate::encodable::EnvelopeEncodable;
use crate::envelope::Envelope;

/// A predicate/object pair attached to a subject.
///
/// Equality and hashing use the digest only, so an assertion and an
/// obscured copy of it compare equal.
#[derive(Debug, Clone)]
pub struct Assertion {
    predicate: Envelope,
    object: Envelope,
    digest: Digest,
}

impl Assertion {
    /// Create an assertion, promoting both operands to envelopes.
    pub fn new(predicate: impl EnvelopeEncodable, object: impl EnvelopeEncodable) -> Self {
        Self::from_envelopes(predicate.into_envelope(), object.into_envelope())
    }

    /// Create an assertion from envelopes used exactly as given.
    pub fn from_envelopes(predicate: Envelope, object: Envelope) -> Self {
        let digest = Digest::from_digests(&[predicate.digest(), object.digest()]);
        Self {
            predicate,
            object,
            digest,
        }
    }

    pub fn predicate(&self) -> Envelope {
        self.predicate.clone()
    }

    pub fn object(&self) -> Envelope {
        self.object.clone()
    }

    pub fn digest(&self) -> Digest {
        self.digest
    }
}

impl PartialEq for Assertion {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

impl Eq for Assertion {}

impl Hash for Assertion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest.hash(state);
    }
}

impl DigestProvider for Assertion {
    fn digest(&self) -> Digest {
        self.digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_digest_is_pair_digest() {
        let assertion = Assertion::new("knows", "Bob");
        let expected = Digest::from_digests(&[
            Envelope::new("knows").digest(),
            Envelope::new("Bob").digest(),
        ]);
        assert_eq!(assertion.digest(), expected);
    }

    #[test]
    fn test_equality_ignores_obscuring() {
        let plain = Assertion::new("knows", "Bob");
        let obscured = Assertion::from_envelopes(
            Envelope::new("knows"),
            Envelope::new("Bob").elide(),
        );
        assert_eq!(plain, obscured);

        let set: HashSet<Assertion> = [plain, obscured].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_order_matters() {
        assert_ne!(Assertion::new("a", "b"), Assertion::new("b", "a"));
    }
}
