//! Computing and applying diffs.
//!
//! A diff is itself an envelope:
//!
//! ```text
//! Digest(source) [
//!     'edits': [edit...]
//! ]
//! ```
//!
//! The script renames every mapped position whose label differs, deletes
//! every unmapped source position, then inserts the unmapped target
//! positions in pre-order. Replaying it against the source rebuilds the
//! target exactly, obscured forms included.

use veil_core::Digest;
use veil_envelope::{known_values, Envelope};

use crate::config::DiffConfig;
use crate::edits::{script_from_cbor, script_to_cbor, Edit};
use crate::error::{DiffError, Result};
use crate::ted::TreeDistance;
use crate::tree::{labels_match, Forest, LabeledTree};

/// The diff envelope that turns `source` into `target`.
pub fn diff(source: &Envelope, target: &Envelope) -> Envelope {
    diff_envelope(source, &edit_script(source, target))
}

/// Like [`diff`], optionally replaying the script to check it.
pub fn diff_with(source: &Envelope, target: &Envelope, config: &DiffConfig) -> Result<Envelope> {
    let edits = edit_script(source, target);
    if config.verify {
        let replayed = apply(source, &edits)?;
        if replayed != *target {
            return Err(DiffError::invalid("script does not reproduce the target"));
        }
    }
    Ok(diff_envelope(source, &edits))
}

/// Apply a diff envelope produced by [`diff`] against `source`.
pub fn transform(source: &Envelope, diff: &Envelope) -> Result<Envelope> {
    let expected: Digest = diff
        .extract_subject()
        .map_err(|_| DiffError::invalid("diff subject is not a digest"))?;
    if expected != source.digest() {
        tracing::warn!(
            expected = %expected.short_description(),
            actual = %source.digest().short_description(),
            "diff does not apply to this envelope"
        );
        return Err(DiffError::invalid("diff was made for a different envelope"));
    }
    let script = diff
        .object_for_predicate(known_values::EDITS)
        .map_err(|_| DiffError::invalid("diff has no edits"))?;
    let value = script
        .as_leaf()
        .ok_or_else(|| DiffError::invalid("edits are not a leaf"))?;
    let edits = script_from_cbor(value).map_err(|e| DiffError::InvalidDiff(e.to_string()))?;
    apply(source, &edits)
}

/// The raw edit script from `source` to `target`.
pub fn edit_script(source: &Envelope, target: &Envelope) -> Vec<Edit> {
    let a = LabeledTree::from_envelope(source);
    let b = LabeledTree::from_envelope(target);
    let mut ted = TreeDistance::new(&a, &b, |x, y| {
        usize::from(!labels_match(&a.nodes[x], &b.nodes[y]))
    });
    let distance = ted.distance();
    let mut pairs = ted.mapping();
    pairs.sort_unstable();

    let mut b_to_a = vec![None; b.len()];
    let mut a_mapped = vec![false; a.len()];
    for &(x, y) in &pairs {
        b_to_a[y] = Some(x);
        a_mapped[x] = true;
    }

    let mut edits = Vec::new();
    for &(x, y) in &pairs {
        let label = &b.nodes[y].label;
        if a.nodes[x].label.encoded() != label.encoded() {
            edits.push(Edit::Rename {
                id: x,
                label: label.clone(),
            });
        }
    }
    edits.extend(
        (0..a.len())
            .filter(|&x| !a_mapped[x])
            .map(|id| Edit::Delete { id }),
    );

    // Inserted nodes take ids after the source's, in target pre-order.
    let mut next_id = a.len();
    let working: Vec<usize> = b_to_a
        .iter()
        .map(|mapped| {
            mapped.unwrap_or_else(|| {
                next_id += 1;
                next_id - 1
            })
        })
        .collect();

    let mut present: Vec<bool> = b_to_a.iter().map(Option::is_some).collect();
    for v in 0..b.len() {
        if present[v] {
            continue;
        }
        let label = b.nodes[v].label.clone();
        match b.nodes[v].parent {
            None => edits.push(Edit::InsertRoot { label }),
            Some(p) => {
                let end = b.subtree_end(v);
                let siblings = present_children(&b, &present, p);
                edits.push(Edit::Insert {
                    label,
                    parent: working[p],
                    position: siblings.iter().filter(|&&u| u < v).count(),
                    children_count: siblings.iter().filter(|&&u| u > v && u < end).count(),
                    descendants: (v + 1..end).filter(|&u| present[u]).count(),
                });
            }
        }
        present[v] = true;
    }

    tracing::debug!(
        distance,
        source = a.len(),
        target = b.len(),
        edits = edits.len(),
        "computed edit script"
    );
    edits
}

/// Children of `p` in the target restricted to the present positions.
fn present_children(tree: &LabeledTree, present: &[bool], p: usize) -> Vec<usize> {
    (p + 1..tree.subtree_end(p))
        .filter(|&u| present[u] && nearest_present_ancestor(tree, present, u) == Some(p))
        .collect()
}

fn nearest_present_ancestor(tree: &LabeledTree, present: &[bool], u: usize) -> Option<usize> {
    let mut current = tree.nodes[u].parent;
    while let Some(c) = current {
        if present[c] {
            return Some(c);
        }
        current = tree.nodes[c].parent;
    }
    None
}

/// Replay `edits` against `source`.
pub fn apply(source: &Envelope, edits: &[Edit]) -> Result<Envelope> {
    let mut forest = Forest::from_tree(&LabeledTree::from_envelope(source));
    for edit in edits {
        match edit {
            Edit::Delete { id } => forest.delete(*id)?,
            Edit::Rename { id, label } => forest.rename(*id, label.clone())?,
            Edit::InsertRoot { label } => {
                forest.insert_root(label.clone());
            }
            Edit::Insert {
                label,
                parent,
                position,
                children_count,
                descendants,
            } => {
                let id = forest.insert(label.clone(), *parent, *position, *children_count)?;
                let actual = forest.descendant_count(id)?;
                if actual != *descendants {
                    return Err(DiffError::InvalidDiff(format!(
                        "insert {id} expected {descendants} descendants, found {actual}"
                    )));
                }
            }
        }
    }
    forest.into_envelope()
}

fn diff_envelope(source: &Envelope, edits: &[Edit]) -> Envelope {
    Envelope::new(source.digest()).add_assertion(known_values::EDITS, script_to_cbor(edits))
}

/// Method-call forms of [`diff`] and [`transform`].
pub trait EnvelopeDiff {
    fn diff(&self, target: &Envelope) -> Envelope;
    fn transform(&self, diff: &Envelope) -> Result<Envelope>;
}

impl EnvelopeDiff for Envelope {
    fn diff(&self, target: &Envelope) -> Envelope {
        diff(self, target)
    }

    fn transform(&self, diff: &Envelope) -> Result<Envelope> {
        transform(self, diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_crypto::SymmetricKey;
    use veil_envelope::ObscureAction;

    fn roundtrip(a: &Envelope, b: &Envelope) -> Envelope {
        let d = diff(a, b);
        let rebuilt = transform(a, &d).unwrap();
        assert_eq!(&rebuilt, b, "diff:\n{}", d.format());
        d
    }

    fn alice() -> Envelope {
        Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .add_assertion(known_values::IS_A, "Person")
    }

    #[test]
    fn test_identical_has_empty_script() {
        let a = alice();
        assert!(edit_script(&a, &a).is_empty());
        roundtrip(&a, &a);
    }

    #[test]
    fn test_changed_leaf() {
        let a = alice();
        let b = Envelope::new("Alice")
            .add_assertion("knows", "Carol")
            .add_assertion(known_values::IS_A, "Person");
        assert!(!edit_script(&a, &b).is_empty());
        roundtrip(&a, &b);

        let single = Envelope::new("Alice").add_assertion("knows", "Bob");
        let renamed = Envelope::new("Alice").add_assertion("knows", "Carol");
        assert_eq!(edit_script(&single, &renamed).len(), 1);
    }

    #[test]
    fn test_added_and_removed_assertions() {
        let a = alice();
        let b = alice().add_assertion("age", 30u64);
        roundtrip(&a, &b);
        roundtrip(&b, &a);
        roundtrip(&Envelope::new("Alice"), &a);
        roundtrip(&a, &Envelope::new("Alice"));
    }

    #[test]
    fn test_unrelated_trees() {
        let a = alice();
        let b = Envelope::new(known_values::NOTE).wrap().add_assertion("x", 1u64);
        roundtrip(&a, &b);
        roundtrip(&b, &a);
        roundtrip(&Envelope::new(1u64), &Envelope::new(2u64));
    }

    #[test]
    fn test_wrap_and_unwrap() {
        let a = alice();
        let b = alice().wrap().add_assertion(known_values::NOTE, "wrapped");
        roundtrip(&a, &b);
        roundtrip(&b, &a);
    }

    #[test]
    fn test_obscured_counterparts() {
        let a = alice();
        let elided = a.elide_removing_target(&Envelope::new("Bob"));
        let d = roundtrip(&a, &elided);
        assert_eq!(d.extract_subject::<Digest>().unwrap(), a.digest());
        roundtrip(&elided, &a);

        let key = SymmetricKey::generate();
        let knows = a.assertion_with_predicate("knows").unwrap();
        let encrypted = a
            .elide_removing_target_with_action(&knows, &ObscureAction::Encrypt(key))
            .unwrap();
        roundtrip(&a, &encrypted);
        roundtrip(&encrypted, &elided);

        let compressed = a.compress().unwrap();
        roundtrip(&a, &compressed);
        roundtrip(&compressed, &a);
    }

    #[test]
    fn test_method_forms_and_verify() {
        let a = alice();
        let b = alice().add_assertion("age", 30u64);
        let d = a.diff(&b);
        assert_eq!(a.transform(&d).unwrap(), b);
        let checked = diff_with(&a, &b, &DiffConfig { verify: true }).unwrap();
        assert_eq!(checked.digest(), d.digest());
    }

    #[test]
    fn test_wrong_source_is_rejected() {
        let a = alice();
        let b = alice().add_assertion("age", 30u64);
        let d = diff(&a, &b);
        assert!(matches!(
            transform(&b, &d),
            Err(DiffError::InvalidDiff(_))
        ));
        assert!(matches!(
            transform(&a, &Envelope::new("not a diff")),
            Err(DiffError::InvalidDiff(_))
        ));
    }

    #[test]
    fn test_malformed_scripts_are_rejected() {
        let a = alice();
        let scripts = [
            vec![Edit::Delete { id: 99 }],
            vec![Edit::Delete { id: 0 }],
            vec![Edit::Delete { id: 1 }, Edit::Delete { id: 1 }],
            vec![Edit::Insert {
                label: LabeledTree::from_envelope(&a).nodes[0].label.clone(),
                parent: 0,
                position: 5,
                children_count: 0,
                descendants: 0,
            }],
        ];
        for script in scripts {
            let d = diff_envelope(&a, &script);
            assert!(
                matches!(transform(&a, &d), Err(DiffError::InvalidDiff(_))),
                "{script:?}"
            );
        }
    }
}
