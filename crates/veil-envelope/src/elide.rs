//! Selective obscuring of subtrees.
//!
//! A walk over the tree decides, per element, whether it is obscured:
//! `target.contains(digest) != is_revealing`. An obscured element is replaced
//! wholesale and the walk does not descend into it. Everything else is
//! rebuilt from its (possibly obscured) children, so every digest on the
//! way back up is unchanged.

use std::collections::HashSet;
use std::convert::Infallible;

use veil_core::{CompressionConfig, Digest, DigestProvider};
use veil_crypto::SymmetricKey;

use crate::assertion::Assertion;
use crate::envelope::{Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, Result};

/// What to turn a selected element into.
#[derive(Debug, Clone)]
pub enum ObscureAction {
    /// Keep only the digest.
    Elide,
    /// Encrypt the element under the key.
    Encrypt(SymmetricKey),
    /// Compress the element.
    Compress,
}

impl Envelope {
    /// Replace this element with its digest.
    pub fn elide(&self) -> Self {
        match self.case() {
            EnvelopeCase::Elided(_) => self.clone(),
            _ => Envelope::new_elided(self.digest()),
        }
    }

    /// Obscure with `action` every element selected by `target` and
    /// `is_revealing`.
    ///
    /// Elements already obscured in a way that rules out `action` (elided
    /// or encrypted, for encrypt and compress) are left as they are.
    pub fn elide_set_with_action(
        &self,
        target: &HashSet<Digest>,
        is_revealing: bool,
        action: &ObscureAction,
    ) -> Result<Self> {
        match action {
            ObscureAction::Elide => Ok(self.elide_set(target, is_revealing)),
            ObscureAction::Encrypt(key) => self.obscure_walk(target, is_revealing, &mut |e| {
                if e.is_encrypted() || e.is_elided() {
                    Ok(e.clone())
                } else {
                    e.encrypt_element(key, None)
                }
            }),
            ObscureAction::Compress => {
                let config = CompressionConfig::default();
                self.obscure_walk(target, is_revealing, &mut |e| {
                    if e.is_obscured() {
                        Ok(e.clone())
                    } else {
                        e.compress_with(&config)
                    }
                })
            }
        }
    }

    /// Elide every element selected by `target` and `is_revealing`.
    pub fn elide_set(&self, target: &HashSet<Digest>, is_revealing: bool) -> Self {
        let result = self.obscure_walk::<Infallible>(target, is_revealing, &mut |e| Ok(e.elide()));
        match result {
            Ok(envelope) => envelope,
            Err(never) => match never {},
        }
    }

    /// Elide everything in `target`.
    pub fn elide_removing_set(&self, target: &HashSet<Digest>) -> Self {
        self.elide_set(target, false)
    }

    /// Elide everything not in `target`.
    pub fn elide_revealing_set(&self, target: &HashSet<Digest>) -> Self {
        self.elide_set(target, true)
    }

    pub fn elide_removing_set_with_action(
        &self,
        target: &HashSet<Digest>,
        action: &ObscureAction,
    ) -> Result<Self> {
        self.elide_set_with_action(target, false, action)
    }

    pub fn elide_revealing_set_with_action(
        &self,
        target: &HashSet<Digest>,
        action: &ObscureAction,
    ) -> Result<Self> {
        self.elide_set_with_action(target, true, action)
    }

    pub fn elide_removing_array(&self, target: &[&dyn DigestProvider]) -> Self {
        self.elide_removing_set(&digest_set(target))
    }

    pub fn elide_revealing_array(&self, target: &[&dyn DigestProvider]) -> Self {
        self.elide_revealing_set(&digest_set(target))
    }

    pub fn elide_removing_array_with_action(
        &self,
        target: &[&dyn DigestProvider],
        action: &ObscureAction,
    ) -> Result<Self> {
        self.elide_removing_set_with_action(&digest_set(target), action)
    }

    pub fn elide_revealing_array_with_action(
        &self,
        target: &[&dyn DigestProvider],
        action: &ObscureAction,
    ) -> Result<Self> {
        self.elide_revealing_set_with_action(&digest_set(target), action)
    }

    pub fn elide_removing_target(&self, target: &dyn DigestProvider) -> Self {
        self.elide_removing_array(&[target])
    }

    pub fn elide_revealing_target(&self, target: &dyn DigestProvider) -> Self {
        self.elide_revealing_array(&[target])
    }

    pub fn elide_removing_target_with_action(
        &self,
        target: &dyn DigestProvider,
        action: &ObscureAction,
    ) -> Result<Self> {
        self.elide_removing_array_with_action(&[target], action)
    }

    pub fn elide_revealing_target_with_action(
        &self,
        target: &dyn DigestProvider,
        action: &ObscureAction,
    ) -> Result<Self> {
        self.elide_revealing_array_with_action(&[target], action)
    }

    /// Restore an obscured element from a candidate with the same digest.
    pub fn unelide(&self, envelope: &Envelope) -> Result<Self> {
        if self.digest() == envelope.digest() {
            Ok(envelope.clone())
        } else {
            Err(EnvelopeError::InvalidDigest)
        }
    }

    fn obscure_walk<E>(
        &self,
        target: &HashSet<Digest>,
        is_revealing: bool,
        obscure: &mut impl FnMut(&Envelope) -> std::result::Result<Envelope, E>,
    ) -> std::result::Result<Envelope, E> {
        let digest = self.digest();
        if target.contains(&digest) != is_revealing {
            let obscured = obscure(self)?;
            debug_assert_eq!(obscured.digest(), digest);
            return Ok(obscured);
        }

        let rebuilt = match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => {
                let subject = subject.obscure_walk(target, is_revealing, obscure)?;
                let assertions = assertions
                    .iter()
                    .map(|a| a.obscure_walk(target, is_revealing, obscure))
                    .collect::<std::result::Result<Vec<_>, E>>()?;
                Envelope::new_with_unchecked_assertions(subject, assertions)
            }
            EnvelopeCase::Wrapped { envelope, .. } => {
                Envelope::new_wrapped(envelope.obscure_walk(target, is_revealing, obscure)?)
            }
            EnvelopeCase::Assertion(assertion) => {
                let predicate = assertion
                    .predicate()
                    .obscure_walk(target, is_revealing, obscure)?;
                let object = assertion
                    .object()
                    .obscure_walk(target, is_revealing, obscure)?;
                Envelope::new_with_assertion(Assertion::from_envelopes(predicate, object))
            }
            _ => self.clone(),
        };
        debug_assert_eq!(rebuilt.digest(), digest);
        Ok(rebuilt)
    }
}

fn digest_set(target: &[&dyn DigestProvider]) -> HashSet<Digest> {
    target.iter().map(|t| t.digest()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::known_values;

    fn alice() -> Envelope {
        Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .add_assertion(known_values::IS_A, "Person")
    }

    #[test]
    fn test_elide_removing_object() {
        let envelope = Envelope::new("Alice").add_assertion("knows", "Bob");
        let elided = envelope.elide_removing_target(&Envelope::new("Bob"));
        assert_eq!(elided.digest(), envelope.digest());
        assert_eq!(elided.format_flat(), r#""Alice" [ "knows": ELIDED ]"#);
    }

    #[test]
    fn test_reveal_nothing_and_everything() {
        let envelope = alice();
        let nothing = envelope.elide_revealing_set(&HashSet::new());
        assert_eq!(nothing.format(), "ELIDED");
        assert_eq!(nothing.digest(), envelope.digest());

        let everything = envelope.elide_revealing_set(&envelope.deep_digests());
        assert_eq!(everything, envelope);
    }

    #[test]
    fn test_elide_is_idempotent() {
        let envelope = alice();
        let target = envelope.assertion_with_predicate("knows").unwrap();
        let once = envelope.elide_removing_target(&target);
        let twice = once.elide_removing_target(&target);
        assert_eq!(once, twice);
        assert_eq!(envelope.elide().elide(), envelope.elide());
    }

    #[test]
    fn test_digest_preserved_at_every_position() {
        let envelope = alice().wrap().add_assertion(known_values::NOTE, "signed");
        for digest in envelope.deep_digests() {
            let elided = envelope.elide_removing_set(&HashSet::from([digest]));
            assert_eq!(elided.digest(), envelope.digest());
        }
    }

    #[test]
    fn test_encrypt_action() {
        let envelope = alice();
        let key = SymmetricKey::generate();
        let bob = Envelope::new("Bob");
        let encrypted = envelope
            .elide_removing_target_with_action(&bob, &ObscureAction::Encrypt(key.clone()))
            .unwrap();
        assert_eq!(encrypted.digest(), envelope.digest());
        assert!(encrypted.format_flat().contains("ENCRYPTED"));

        // Already-elided targets are left alone.
        let elided = envelope.elide_removing_target(&bob);
        let again = elided
            .elide_removing_target_with_action(&bob, &ObscureAction::Encrypt(key))
            .unwrap();
        assert_eq!(again, elided);
    }

    #[test]
    fn test_compress_action() {
        let envelope = alice();
        let assertion = envelope.assertion_with_predicate("knows").unwrap();
        let compressed = envelope
            .elide_removing_target_with_action(&assertion, &ObscureAction::Compress)
            .unwrap();
        assert_eq!(compressed.digest(), envelope.digest());
        assert!(compressed.format_flat().contains("COMPRESSED"));

        let twice = compressed
            .elide_removing_target_with_action(&assertion, &ObscureAction::Compress)
            .unwrap();
        assert_eq!(twice, compressed);
    }

    #[test]
    fn test_unelide() {
        let envelope = alice();
        let elided = envelope.elide();
        assert_eq!(elided.unelide(&envelope).unwrap(), envelope);
        assert!(matches!(
            elided.unelide(&Envelope::new("Mallory")),
            Err(EnvelopeError::InvalidDigest)
        ));
    }
}
