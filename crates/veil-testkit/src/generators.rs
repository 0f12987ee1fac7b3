//! Proptest generators for property-based testing.

use proptest::prelude::*;

use veil_core::Digest;
use veil_envelope::{Envelope, KnownValue};

/// Short text.
pub fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z ]{0,12}".prop_map(String::from)
}

/// A leaf of one of the common value types.
pub fn leaf() -> impl Strategy<Value = Envelope> {
    prop_oneof![
        text().prop_map(Envelope::new),
        any::<u64>().prop_map(Envelope::new),
        any::<i64>().prop_map(Envelope::new),
        any::<bool>().prop_map(Envelope::new),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(|b| Envelope::new(b.as_slice())),
    ]
}

/// A known value from the predefined range.
pub fn known_value() -> impl Strategy<Value = Envelope> {
    (1u64..=18).prop_map(|code| Envelope::new(KnownValue::new(code)))
}

/// An arbitrary envelope of bounded depth built from leaves, known values,
/// wrapping and nodes.
pub fn envelope() -> impl Strategy<Value = Envelope> {
    let base = prop_oneof![3 => leaf(), 1 => known_value()];
    base.prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| e.wrap()),
            (
                inner.clone(),
                prop::collection::vec((inner.clone(), inner), 1..4)
            )
                .prop_filter_map("node", |(subject, pairs)| node(subject, pairs)),
        ]
    })
}

/// Place assertions on `subject` without promoting their parts. A node
/// subject is wrapped first.
fn node(subject: Envelope, pairs: Vec<(Envelope, Envelope)>) -> Option<Envelope> {
    let subject = if subject.is_node() {
        subject.wrap()
    } else {
        subject
    };
    let assertions = pairs
        .into_iter()
        .map(|(p, o)| Envelope::new_assertion_with_envelopes(p, o))
        .collect();
    Envelope::new_with_assertions(subject, assertions).ok()
}

/// Every digest in `envelope`, sorted so the sampling below is stable.
fn sorted_digests(envelope: &Envelope) -> Vec<Digest> {
    let mut digests: Vec<Digest> = envelope.deep_digests().into_iter().collect();
    digests.sort_unstable();
    digests
}

/// An envelope together with a random subset of its own digests.
pub fn envelope_with_targets() -> impl Strategy<Value = (Envelope, Vec<Digest>)> {
    envelope().prop_flat_map(|e| {
        let digests = sorted_digests(&e);
        let len = digests.len();
        (Just(e), prop::sample::subsequence(digests, 0..=len))
    })
}

/// An envelope together with one of its own digests.
pub fn envelope_with_target() -> impl Strategy<Value = (Envelope, Digest)> {
    envelope().prop_flat_map(|e| {
        let digests = sorted_digests(&e);
        (Just(e), prop::sample::select(digests))
    })
}

/// An envelope and a copy of it with a random part elided.
pub fn envelope_and_redaction() -> impl Strategy<Value = (Envelope, Envelope)> {
    envelope_with_targets().prop_map(|(e, targets)| {
        let redacted = e.elide_removing_set(&targets.into_iter().collect());
        (e, redacted)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use veil_diff::{diff, transform};

    proptest! {
        #[test]
        fn test_digest_stable_under_elision((e, targets) in envelope_with_targets()) {
            let target: HashSet<Digest> = targets.into_iter().collect();
            prop_assert_eq!(e.elide_removing_set(&target).digest(), e.digest());
            prop_assert_eq!(e.elide_revealing_set(&target).digest(), e.digest());
        }

        #[test]
        fn test_wire_roundtrip((_, redacted) in envelope_and_redaction()) {
            let decoded = Envelope::from_cbor_data(&redacted.to_cbor_data()).unwrap();
            prop_assert_eq!(decoded, redacted);
        }

        #[test]
        fn test_elide_complement(e in envelope()) {
            prop_assert_eq!(e.elide_revealing_set(&HashSet::new()).format(), "ELIDED");
            let everything = e.deep_digests();
            prop_assert!(e.elide_revealing_set(&everything).is_identical_to(&e));
        }

        #[test]
        fn test_elide_idempotent((e, targets) in envelope_with_targets()) {
            let target: HashSet<Digest> = targets.into_iter().collect();
            let once = e.elide_removing_set(&target);
            prop_assert!(once.elide_removing_set(&target).is_identical_to(&once));
        }

        #[test]
        fn test_proof_confirms((e, target) in envelope_with_target()) {
            let proof = e.proof_contains_target(&target).unwrap();
            prop_assert_eq!(proof.digest(), e.digest());
            prop_assert!(e.confirm_contains_target(&target, &proof));
            prop_assert!(!e.confirm_contains_target(&Digest::from_image(b"absent"), &proof));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_diff_transforms_to_target(a in envelope(), b in envelope()) {
            prop_assert_eq!(transform(&a, &diff(&a, &b)).unwrap(), b);
        }

        #[test]
        fn test_diff_against_redaction((e, redacted) in envelope_and_redaction()) {
            prop_assert_eq!(transform(&e, &diff(&e, &redacted)).unwrap(), redacted.clone());
            prop_assert_eq!(transform(&redacted, &diff(&redacted, &e)).unwrap(), e);
        }
    }
}
