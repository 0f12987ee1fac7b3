//! Adding, removing and replacing assertions.

use rand::{CryptoRng, RngCore};

use veil_core::DigestProvider;

use crate::encodable::EnvelopeEncodable;
use crate::envelope::{Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, Result};

impl Envelope {
    /// Add the assertion `predicate: object`.
    pub fn add_assertion(
        &self,
        predicate: impl EnvelopeEncodable,
        object: impl EnvelopeEncodable,
    ) -> Self {
        self.insert_assertion(Envelope::new_assertion(predicate, object))
    }

    /// Add an assertion, salting it first when `salted` is set.
    pub fn add_assertion_salted(
        &self,
        predicate: impl EnvelopeEncodable,
        object: impl EnvelopeEncodable,
        salted: bool,
    ) -> Self {
        let assertion = Envelope::new_assertion(predicate, object);
        if salted {
            self.insert_assertion(assertion.add_salt())
        } else {
            self.insert_assertion(assertion)
        }
    }

    /// Add a salted assertion using a caller-supplied random source.
    pub fn add_assertion_salted_using<R: RngCore + CryptoRng>(
        &self,
        predicate: impl EnvelopeEncodable,
        object: impl EnvelopeEncodable,
        rng: &mut R,
    ) -> Self {
        let assertion = Envelope::new_assertion(predicate, object).add_salt_using(rng);
        self.insert_assertion(assertion)
    }

    /// Add an assertion given as an envelope.
    ///
    /// The envelope must be an assertion, a node whose subject is an
    /// assertion, or an obscured element standing in for one.
    pub fn add_assertion_envelope(&self, assertion: Envelope) -> Result<Self> {
        self.add_assertion_envelope_salted(assertion, false)
    }

    pub fn add_assertion_envelope_salted(&self, assertion: Envelope, salted: bool) -> Result<Self> {
        if !assertion.is_assertion_shaped() {
            return Err(EnvelopeError::InvalidFormat(format!(
                "not an assertion: {}",
                assertion.digest().short_description()
            )));
        }
        let assertion = if salted { assertion.add_salt() } else { assertion };
        Ok(self.insert_assertion(assertion))
    }

    pub fn add_assertion_envelopes(&self, assertions: &[Envelope]) -> Result<Self> {
        assertions
            .iter()
            .try_fold(self.clone(), |envelope, assertion| {
                envelope.add_assertion_envelope(assertion.clone())
            })
    }

    /// Add the assertion only if `object` is present.
    pub fn add_optional_assertion<O: EnvelopeEncodable>(
        &self,
        predicate: impl EnvelopeEncodable,
        object: Option<O>,
    ) -> Self {
        match object {
            Some(object) => self.add_assertion(predicate, object),
            None => self.clone(),
        }
    }

    /// Add the assertion only if `condition` holds.
    pub fn add_assertion_if(
        &self,
        condition: bool,
        predicate: impl EnvelopeEncodable,
        object: impl EnvelopeEncodable,
    ) -> Self {
        if condition {
            self.add_assertion(predicate, object)
        } else {
            self.clone()
        }
    }

    /// Remove the assertion whose digest matches `target`.
    ///
    /// Returns the envelope unchanged if nothing matches and the bare
    /// subject if the last assertion is removed.
    pub fn remove_assertion(&self, target: impl DigestProvider) -> Self {
        let target = target.digest();
        let EnvelopeCase::Node {
            subject,
            assertions,
            ..
        } = self.case()
        else {
            return self.clone();
        };
        if !assertions.iter().any(|a| a.digest() == target) {
            return self.clone();
        }
        let remaining: Vec<Envelope> = assertions
            .iter()
            .filter(|a| a.digest() != target)
            .cloned()
            .collect();
        Envelope::new_with_unchecked_assertions(subject.clone(), remaining)
    }

    /// Replace the assertion matching `target` with `replacement`.
    pub fn replace_assertion(
        &self,
        target: impl DigestProvider,
        replacement: Envelope,
    ) -> Result<Self> {
        self.remove_assertion(target)
            .add_assertion_envelope(replacement)
    }

    /// Keep the assertions, swap the subject.
    pub fn replace_subject(&self, subject: Envelope) -> Self {
        self.assertions()
            .into_iter()
            .fold(subject, |envelope, assertion| envelope.insert_assertion(assertion))
    }

    /// Insert an already validated assertion, merging into an existing node.
    pub(crate) fn insert_assertion(&self, assertion: Envelope) -> Self {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => {
                if assertions.iter().any(|a| a.digest() == assertion.digest()) {
                    return self.clone();
                }
                let mut assertions = assertions.clone();
                assertions.push(assertion);
                Envelope::new_with_unchecked_assertions(subject.clone(), assertions)
            }
            _ => Envelope::new_with_unchecked_assertions(self.clone(), vec![assertion]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::known_values;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_add_is_deduplicated() {
        let once = Envelope::new("Alice").add_assertion("knows", "Bob");
        let twice = once.add_assertion("knows", "Bob");
        assert_eq!(once, twice);
        assert_eq!(twice.assertions().len(), 1);
    }

    #[test]
    fn test_add_order_does_not_matter() {
        let a = Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .add_assertion("knows", "Carol");
        let b = Envelope::new("Alice")
            .add_assertion("knows", "Carol")
            .add_assertion("knows", "Bob");
        assert_eq!(a, b);
    }

    #[test]
    fn test_add_assertion_envelope_validates_shape() {
        let alice = Envelope::new("Alice");
        assert!(matches!(
            alice.add_assertion_envelope(Envelope::new("Bob")),
            Err(EnvelopeError::InvalidFormat(_))
        ));

        let assertion = Envelope::new_assertion("knows", "Bob");
        let elided = assertion.elide();
        let with_elided = alice.add_assertion_envelope(elided).unwrap();
        assert_eq!(with_elided.digest(), alice.add_assertion("knows", "Bob").digest());
    }

    #[test]
    fn test_remove_assertion() {
        let alice = Envelope::new("Alice");
        let knows_bob = Envelope::new_assertion("knows", "Bob");
        let knows_carol = Envelope::new_assertion("knows", "Carol");
        let envelope = alice
            .add_assertion_envelopes(&[knows_bob.clone(), knows_carol.clone()])
            .unwrap();

        let one = envelope.remove_assertion(&knows_bob);
        assert_eq!(one.assertions(), vec![knows_carol.clone()]);

        let none = one.remove_assertion(&knows_carol);
        assert_eq!(none, alice);

        let unchanged = envelope.remove_assertion(Envelope::new("missing"));
        assert_eq!(unchanged, envelope);
    }

    #[test]
    fn test_replace_subject_and_assertion() {
        let envelope = Envelope::new("Alice").add_assertion("knows", "Bob");
        let replaced = envelope.replace_subject(Envelope::new("Carol"));
        assert_eq!(replaced.extract_subject::<String>().unwrap(), "Carol");
        assert_eq!(replaced.assertions(), envelope.assertions());

        let old = Envelope::new_assertion("knows", "Bob");
        let new = Envelope::new_assertion("knows", "Dan");
        let swapped = envelope.replace_assertion(&old, new.clone()).unwrap();
        assert_eq!(swapped.assertions(), vec![new]);
    }

    #[test]
    fn test_optional_and_conditional() {
        let alice = Envelope::new("Alice");
        assert_eq!(alice.add_optional_assertion("note", None::<&str>), alice);
        assert!(alice.add_optional_assertion("note", Some("hi")).is_node());
        assert_eq!(alice.add_assertion_if(false, known_values::NOTE, "x"), alice);
        assert!(alice.add_assertion_if(true, known_values::NOTE, "x").is_node());
    }

    #[test]
    fn test_salted_assertions_decorrelate() {
        let alice = Envelope::new("Alice");
        let mut rng = StdRng::seed_from_u64(3);
        let a = alice.add_assertion_salted_using("knows", "Bob", &mut rng);
        let b = alice.add_assertion_salted_using("knows", "Bob", &mut rng);
        assert_ne!(a.digest(), b.digest());

        let plain_a = alice.add_assertion_salted("knows", "Bob", false);
        let plain_b = alice.add_assertion("knows", "Bob");
        assert_eq!(plain_a.digest(), plain_b.digest());

        // The salted assertion is still found by predicate.
        assert_eq!(a.objects_for_predicate("knows").len(), 1);
    }
}
