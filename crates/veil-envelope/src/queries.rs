//! Predicate queries, typed extraction and digest sets.

use std::collections::HashSet;

use veil_core::Digest;

use crate::encodable::{EnvelopeDecodable, EnvelopeEncodable};
use crate::envelope::{Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, Result};

impl Envelope {
    /// All assertions whose predicate has the digest of `predicate`.
    ///
    /// `predicate` is promoted the same way as when the assertion was
    /// built. Obscured assertions never match.
    pub fn assertions_with_predicate(&self, predicate: impl EnvelopeEncodable) -> Vec<Envelope> {
        let target = predicate.into_envelope().digest();
        self.assertions()
            .into_iter()
            .filter(|assertion| {
                assertion
                    .as_predicate()
                    .map(|p| p.digest() == target)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// The single assertion with `predicate`.
    pub fn assertion_with_predicate(&self, predicate: impl EnvelopeEncodable) -> Result<Envelope> {
        self.optional_assertion_with_predicate(predicate)?
            .ok_or(EnvelopeError::NonexistentPredicate)
    }

    /// The assertion with `predicate`, `None` if absent, an error if more
    /// than one matches.
    pub fn optional_assertion_with_predicate(
        &self,
        predicate: impl EnvelopeEncodable,
    ) -> Result<Option<Envelope>> {
        let mut matches = self.assertions_with_predicate(predicate);
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => Err(EnvelopeError::AmbiguousPredicate),
        }
    }

    pub fn object_for_predicate(&self, predicate: impl EnvelopeEncodable) -> Result<Envelope> {
        self.optional_object_for_predicate(predicate)?
            .ok_or(EnvelopeError::NonexistentPredicate)
    }

    pub fn optional_object_for_predicate(
        &self,
        predicate: impl EnvelopeEncodable,
    ) -> Result<Option<Envelope>> {
        Ok(self
            .optional_assertion_with_predicate(predicate)?
            .and_then(|assertion| assertion.as_object()))
    }

    pub fn objects_for_predicate(&self, predicate: impl EnvelopeEncodable) -> Vec<Envelope> {
        self.assertions_with_predicate(predicate)
            .iter()
            .filter_map(Envelope::as_object)
            .collect()
    }

    /// Decode the subject as `T`.
    pub fn extract_subject<T: EnvelopeDecodable>(&self) -> Result<T> {
        T::try_from_envelope(self)
    }

    pub fn extract_object_for_predicate<T: EnvelopeDecodable>(
        &self,
        predicate: impl EnvelopeEncodable,
    ) -> Result<T> {
        T::try_from_envelope(&self.object_for_predicate(predicate)?)
    }

    pub fn extract_optional_object_for_predicate<T: EnvelopeDecodable>(
        &self,
        predicate: impl EnvelopeEncodable,
    ) -> Result<Option<T>> {
        self.optional_object_for_predicate(predicate)?
            .map(|object| T::try_from_envelope(&object))
            .transpose()
    }

    pub fn extract_objects_for_predicate<T: EnvelopeDecodable>(
        &self,
        predicate: impl EnvelopeEncodable,
    ) -> Result<Vec<T>> {
        self.objects_for_predicate(predicate)
            .iter()
            .map(T::try_from_envelope)
            .collect()
    }

    /// Number of structural elements reachable from here, this one included.
    pub fn elements_count(&self) -> usize {
        let children = match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => {
                subject.elements_count()
                    + assertions.iter().map(Envelope::elements_count).sum::<usize>()
            }
            EnvelopeCase::Assertion(assertion) => {
                assertion.predicate().elements_count() + assertion.object().elements_count()
            }
            EnvelopeCase::Wrapped { envelope, .. } => envelope.elements_count(),
            _ => 0,
        };
        1 + children
    }

    /// Digests of every element (and its subject) above `level_limit`.
    pub fn digests(&self, level_limit: usize) -> HashSet<Digest> {
        let mut result = HashSet::new();
        self.walk(false, (), &mut |envelope, level, _, _| {
            if level < level_limit {
                result.insert(envelope.digest());
                result.insert(envelope.subject().digest());
            }
            ((), level + 1 >= level_limit)
        });
        result
    }

    /// Every digest in the tree.
    pub fn deep_digests(&self) -> HashSet<Digest> {
        self.digests(usize::MAX)
    }

    /// This element, its subject, and its immediate assertions.
    pub fn shallow_digests(&self) -> HashSet<Digest> {
        self.digests(2)
    }
}
