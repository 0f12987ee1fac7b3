//! Inclusion proofs.
//!
//! A proof is the original envelope with everything elided except the
//! digest path from the root down to each target, and the targets
//! themselves elided. Holding the root digest, a verifier can confirm the
//! targets are present without seeing anything else.

use std::collections::HashSet;

use veil_core::{Digest, DigestProvider};

use crate::envelope::{Envelope, EnvelopeCase};

impl Envelope {
    /// Digests of every element on a path from the root to any target.
    pub fn reveal_set(&self, target: &HashSet<Digest>) -> HashSet<Digest> {
        let mut result = HashSet::new();
        self.reveal_paths(target, &mut Vec::new(), &mut result);
        result
    }

    fn reveal_paths(&self, target: &HashSet<Digest>, path: &mut Vec<Digest>, result: &mut HashSet<Digest>) {
        let digest = self.digest();
        path.push(digest);
        if target.contains(&digest) {
            result.extend(path.iter().copied());
        }
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => {
                subject.reveal_paths(target, path, result);
                for assertion in assertions {
                    assertion.reveal_paths(target, path, result);
                }
            }
            EnvelopeCase::Wrapped { envelope, .. } => envelope.reveal_paths(target, path, result),
            EnvelopeCase::Assertion(assertion) => {
                assertion.predicate().reveal_paths(target, path, result);
                assertion.object().reveal_paths(target, path, result);
            }
            _ => {}
        }
        path.pop();
    }

    /// A proof that this envelope contains every digest in `target`, or
    /// `None` if some target is not reachable.
    pub fn proof_contains_set(&self, target: &HashSet<Digest>) -> Option<Envelope> {
        let reveal = self.reveal_set(target);
        if !target.is_subset(&reveal) {
            tracing::debug!(
                targets = target.len(),
                "proof requested for unreachable target"
            );
            return None;
        }
        Some(self.elide_revealing_set(&reveal).elide_removing_set(target))
    }

    pub fn proof_contains_target(&self, target: &dyn DigestProvider) -> Option<Envelope> {
        self.proof_contains_set(&HashSet::from([target.digest()]))
    }

    /// Whether `proof` shows that this envelope contains every target.
    pub fn confirm_contains_set(&self, target: &HashSet<Digest>, proof: &Envelope) -> bool {
        self.digest() == proof.digest() && proof.contains_all(target)
    }

    pub fn confirm_contains_target(&self, target: &dyn DigestProvider, proof: &Envelope) -> bool {
        self.confirm_contains_set(&HashSet::from([target.digest()]), proof)
    }

    /// Whether every target digest occurs somewhere in this tree,
    /// obscured positions included.
    pub fn contains_all(&self, target: &HashSet<Digest>) -> bool {
        let mut remaining = target.clone();
        self.remove_all_found(&mut remaining);
        remaining.is_empty()
    }

    fn remove_all_found(&self, remaining: &mut HashSet<Digest>) {
        self.walk(false, (), &mut |envelope, _, _, _| {
            remaining.remove(&envelope.digest());
            ((), remaining.is_empty())
        });
    }
}
