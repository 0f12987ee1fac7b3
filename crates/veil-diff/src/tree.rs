//! Envelopes as ordered labeled trees.
//!
//! The tree follows the hidden-nodes walk: a node wrapper disappears, its
//! subject takes the node's place and its assertions hang off the subject
//! with an `Assertion` edge. The conversion is invertible because a node's
//! subject is never itself a node.

use veil_core::cbor::{expect_array, expect_byte_array, expect_u64};
use veil_core::{Compressed, Digest, FromCbor, ToCbor, Value};
use veil_crypto::EncryptedMessage;
use veil_envelope::{Assertion, EdgeType, Envelope, EnvelopeCase, KnownValue};

use crate::error::{DiffError, Result};

/// What kind of element sits at a position, with enough content to
/// rebuild it.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelKind {
    Leaf(Value),
    KnownValue(u64),
    Wrapped,
    Assertion,
    Encrypted(EncryptedMessage),
    Compressed(Compressed),
    Elided(Digest),
}

impl LabelKind {
    fn of(envelope: &Envelope) -> Option<Self> {
        Some(match envelope.case() {
            EnvelopeCase::Node { .. } => return None,
            EnvelopeCase::Leaf { cbor, .. } => LabelKind::Leaf(cbor.clone()),
            EnvelopeCase::KnownValue { value, .. } => LabelKind::KnownValue(value.value()),
            EnvelopeCase::Wrapped { .. } => LabelKind::Wrapped,
            EnvelopeCase::Assertion(_) => LabelKind::Assertion,
            EnvelopeCase::Encrypted { message, .. } => LabelKind::Encrypted(message.clone()),
            EnvelopeCase::Compressed { compressed, .. } => LabelKind::Compressed(compressed.clone()),
            EnvelopeCase::Elided(digest) => LabelKind::Elided(*digest),
        })
    }

    pub fn is_obscured(&self) -> bool {
        matches!(
            self,
            LabelKind::Encrypted(_) | LabelKind::Compressed(_) | LabelKind::Elided(_)
        )
    }

    fn code(&self) -> u64 {
        match self {
            LabelKind::Leaf(_) => 0,
            LabelKind::KnownValue(_) => 1,
            LabelKind::Wrapped => 2,
            LabelKind::Assertion => 3,
            LabelKind::Encrypted(_) => 4,
            LabelKind::Compressed(_) => 5,
            LabelKind::Elided(_) => 6,
        }
    }

    fn payload(&self) -> Value {
        match self {
            LabelKind::Leaf(value) => value.clone(),
            LabelKind::KnownValue(code) => Value::Integer((*code).into()),
            LabelKind::Wrapped | LabelKind::Assertion => Value::Null,
            LabelKind::Encrypted(message) => message.to_cbor(),
            LabelKind::Compressed(compressed) => compressed.to_cbor(),
            LabelKind::Elided(digest) => Value::Bytes(digest.as_bytes().to_vec()),
        }
    }

    fn from_parts(code: u64, payload: &Value) -> veil_core::Result<Self> {
        Ok(match code {
            0 => LabelKind::Leaf(payload.clone()),
            1 => LabelKind::KnownValue(expect_u64(payload)?),
            2 => LabelKind::Wrapped,
            3 => LabelKind::Assertion,
            4 => LabelKind::Encrypted(EncryptedMessage::from_cbor(payload)?),
            5 => LabelKind::Compressed(Compressed::from_cbor(payload)?),
            6 => LabelKind::Elided(Digest::from(expect_byte_array::<32>(payload)?)),
            _ => return Err(veil_core::CoreError::invalid_format("unknown label kind")),
        })
    }
}

/// The label of one tree position: how it is attached and what it is.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub edge: EdgeType,
    pub kind: LabelKind,
}

fn edge_code(edge: EdgeType) -> u64 {
    match edge {
        EdgeType::None => 0,
        EdgeType::Subject => 1,
        EdgeType::Assertion => 2,
        EdgeType::Predicate => 3,
        EdgeType::Object => 4,
        EdgeType::Content => 5,
    }
}

fn edge_from_code(code: u64) -> Option<EdgeType> {
    Some(match code {
        0 => EdgeType::None,
        1 => EdgeType::Subject,
        2 => EdgeType::Assertion,
        3 => EdgeType::Predicate,
        4 => EdgeType::Object,
        5 => EdgeType::Content,
        _ => return None,
    })
}

impl Label {
    /// Canonical bytes, used to decide whether a mapped position needs a
    /// rename.
    pub fn encoded(&self) -> Vec<u8> {
        veil_core::canonical::encode(&self.to_cbor())
    }
}

impl ToCbor for Label {
    fn to_cbor(&self) -> Value {
        Value::Array(vec![
            Value::Integer(edge_code(self.edge).into()),
            Value::Integer(self.kind.code().into()),
            self.kind.payload(),
        ])
    }
}

impl FromCbor for Label {
    fn from_cbor(value: &Value) -> veil_core::Result<Self> {
        let [edge, kind, payload] = expect_array(value)? else {
            return Err(veil_core::CoreError::invalid_format("label must have 3 elements"));
        };
        let edge = edge_from_code(expect_u64(edge)?)
            .ok_or_else(|| veil_core::CoreError::invalid_format("unknown edge type"))?;
        Ok(Self {
            edge,
            kind: LabelKind::from_parts(expect_u64(kind)?, payload)?,
        })
    }
}

/// One position of a [`LabeledTree`].
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub label: Label,
    /// Digest of the element at this position (the subject, for a node).
    pub digest: Digest,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// An envelope flattened into a pre-order arena. Index 0 is the root.
#[derive(Debug, Clone)]
pub struct LabeledTree {
    pub nodes: Vec<TreeNode>,
}

impl LabeledTree {
    pub fn from_envelope(envelope: &Envelope) -> Self {
        let mut nodes: Vec<TreeNode> = Vec::new();
        envelope.walk(true, None, &mut |element, _, edge, parent: Option<usize>| {
            // Nodes are never visited in hidden-nodes mode.
            let Some(kind) = LabelKind::of(element) else {
                return (parent, true);
            };
            let id = nodes.len();
            nodes.push(TreeNode {
                label: Label { edge, kind },
                digest: element.digest(),
                parent,
                children: Vec::new(),
            });
            if let Some(parent) = parent {
                nodes[parent].children.push(id);
            }
            (Some(id), false)
        });
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Exclusive end of the pre-order range covered by `id`'s subtree.
    pub fn subtree_end(&self, id: usize) -> usize {
        let mut end = id + 1;
        let mut current = id;
        while let Some(&last) = self.nodes[current].children.last() {
            current = last;
            end = current + 1;
        }
        end
    }
}

/// Whether two positions count as the same for edit costs.
///
/// Edges must agree. Obscured content is opaque, so if either side is
/// obscured the digests decide; otherwise the content does.
pub fn labels_match(a: &TreeNode, b: &TreeNode) -> bool {
    if a.label.edge != b.label.edge {
        return false;
    }
    if a.label.kind.is_obscured() || b.label.kind.is_obscured() {
        return a.digest == b.digest;
    }
    a.label.kind == b.label.kind
}

/// A forest being edited in place; nodes keep their ids for the whole
/// replay.
#[derive(Debug)]
pub(crate) struct Forest {
    nodes: Vec<Option<ForestNode>>,
    roots: Vec<usize>,
}

#[derive(Debug)]
struct ForestNode {
    label: Label,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl Forest {
    pub(crate) fn from_tree(tree: &LabeledTree) -> Self {
        let nodes = tree
            .nodes
            .iter()
            .map(|n| {
                Some(ForestNode {
                    label: n.label.clone(),
                    parent: n.parent,
                    children: n.children.clone(),
                })
            })
            .collect();
        Self {
            nodes,
            roots: vec![0],
        }
    }

    fn node(&self, id: usize) -> Result<&ForestNode> {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or_else(|| DiffError::InvalidDiff(format!("no node {id}")))
    }

    fn node_mut(&mut self, id: usize) -> Result<&mut ForestNode> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or_else(|| DiffError::InvalidDiff(format!("no node {id}")))
    }

    fn siblings_mut(&mut self, parent: Option<usize>) -> Result<&mut Vec<usize>> {
        match parent {
            Some(parent) => Ok(&mut self.node_mut(parent)?.children),
            None => Ok(&mut self.roots),
        }
    }

    pub(crate) fn rename(&mut self, id: usize, label: Label) -> Result<()> {
        self.node_mut(id)?.label = label;
        Ok(())
    }

    /// Remove `id`, splicing its children into its place.
    pub(crate) fn delete(&mut self, id: usize) -> Result<()> {
        let ForestNode {
            parent, children, ..
        } = self
            .nodes
            .get_mut(id)
            .and_then(Option::take)
            .ok_or_else(|| DiffError::InvalidDiff(format!("no node {id}")))?;
        for &child in &children {
            self.node_mut(child)?.parent = parent;
        }
        let siblings = self.siblings_mut(parent)?;
        let position = siblings
            .iter()
            .position(|&s| s == id)
            .ok_or_else(|| DiffError::invalid("dangling node"))?;
        siblings.splice(position..=position, children);
        Ok(())
    }

    /// Add a new root that adopts every current root.
    pub(crate) fn insert_root(&mut self, label: Label) -> usize {
        let id = self.nodes.len();
        let children = std::mem::replace(&mut self.roots, vec![id]);
        for &child in &children {
            if let Some(Some(node)) = self.nodes.get_mut(child) {
                node.parent = Some(id);
            }
        }
        self.nodes.push(Some(ForestNode {
            label,
            parent: None,
            children,
        }));
        id
    }

    /// Add a child of `parent` at `position`, adopting the `count`
    /// children that currently start there.
    pub(crate) fn insert(&mut self, label: Label, parent: usize, position: usize, count: usize) -> Result<usize> {
        let id = self.nodes.len();
        let siblings = &mut self.node_mut(parent)?.children;
        let end = position
            .checked_add(count)
            .filter(|&end| end <= siblings.len())
            .ok_or_else(|| DiffError::invalid("insert position out of range"))?;
        let adopted: Vec<usize> = siblings.splice(position..end, [id]).collect();
        for &child in &adopted {
            self.node_mut(child)?.parent = Some(id);
        }
        self.nodes.push(Some(ForestNode {
            label,
            parent: Some(parent),
            children: adopted,
        }));
        Ok(id)
    }

    pub(crate) fn descendant_count(&self, id: usize) -> Result<usize> {
        let mut count = 0;
        let mut stack = self.node(id)?.children.clone();
        while let Some(next) = stack.pop() {
            count += 1;
            stack.extend(self.node(next)?.children.iter().copied());
        }
        Ok(count)
    }

    /// Rebuild the single remaining tree as an envelope.
    pub(crate) fn into_envelope(self) -> Result<Envelope> {
        let [root] = self.roots.as_slice() else {
            return Err(DiffError::InvalidDiff(format!(
                "expected one root, found {}",
                self.roots.len()
            )));
        };
        self.build(*root)
    }

    fn build(&self, id: usize) -> Result<Envelope> {
        let node = self.node(id)?;
        let mut content = Vec::new();
        let mut assertions = Vec::new();
        for &child in &node.children {
            let child_node = self.node(child)?;
            if child_node.label.edge == EdgeType::Assertion {
                assertions.push(self.build(child)?);
            } else {
                content.push((child_node.label.edge, child));
            }
        }

        let base = match (&node.label.kind, content.as_slice()) {
            (LabelKind::Leaf(value), []) => Envelope::new_leaf_value(value.clone()),
            (LabelKind::KnownValue(code), []) => Envelope::new_known_value(KnownValue::new(*code)),
            (LabelKind::Wrapped, [(EdgeType::Content, inner)]) => {
                Envelope::new_wrapped(self.build(*inner)?)
            }
            (LabelKind::Assertion, [(EdgeType::Predicate, predicate), (EdgeType::Object, object)]) => {
                Envelope::new_with_assertion(Assertion::from_envelopes(
                    self.build(*predicate)?,
                    self.build(*object)?,
                ))
            }
            (LabelKind::Encrypted(message), []) => Envelope::new_with_encrypted(message.clone())
                .map_err(|e| DiffError::InvalidDiff(e.to_string()))?,
            (LabelKind::Compressed(compressed), []) => {
                Envelope::new_with_compressed(compressed.clone())
                    .map_err(|e| DiffError::InvalidDiff(e.to_string()))?
            }
            (LabelKind::Elided(digest), []) => Envelope::new_elided(*digest),
            (kind, _) => {
                return Err(DiffError::InvalidDiff(format!(
                    "node {id} has the wrong children for {kind:?}"
                )))
            }
        };
        Envelope::new_with_assertions(base, assertions)
            .map_err(|e| DiffError::InvalidDiff(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_envelope::known_values;

    #[test]
    fn test_tree_shape_follows_hidden_nodes() {
        let envelope = Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .wrap()
            .add_assertion(known_values::NOTE, "signed");
        let tree = LabeledTree::from_envelope(&envelope);

        // wrapped, "Alice", knows-assertion, pred, obj, note-assertion, pred, obj
        assert_eq!(tree.len(), 8);
        let root = &tree.nodes[0];
        assert_eq!(root.label.kind, LabelKind::Wrapped);
        assert_eq!(root.label.edge, EdgeType::None);
        let edges: Vec<EdgeType> = root
            .children
            .iter()
            .map(|&c| tree.nodes[c].label.edge)
            .collect();
        assert_eq!(edges, vec![EdgeType::Content, EdgeType::Assertion]);
        assert_eq!(tree.subtree_end(0), 8);
        assert_eq!(tree.subtree_end(1), 5);
    }

    #[test]
    fn test_forest_rebuilds_identical_envelope() {
        let envelope = Envelope::new("Alice")
            .add_assertion("knows", Envelope::new("Bob").add_assertion("age", 30u64))
            .add_assertion(known_values::IS_A, "Person")
            .elide_removing_target(&Envelope::new("Person"));
        let tree = LabeledTree::from_envelope(&envelope);
        let rebuilt = Forest::from_tree(&tree).into_envelope().unwrap();
        assert_eq!(rebuilt, envelope);
    }

    #[test]
    fn test_label_cbor() {
        let label = Label {
            edge: EdgeType::Object,
            kind: LabelKind::Elided(Digest::from_image(b"x")),
        };
        assert_eq!(Label::from_cbor(&label.to_cbor()).unwrap(), label);
        assert!(Label::from_cbor(&Value::Array(vec![Value::Integer(9.into())])).is_err());
    }

    #[test]
    fn test_obscured_labels_match_by_digest() {
        let envelope = Envelope::new("Alice").add_assertion("knows", "Bob");
        let elided = envelope.elide_removing_target(&Envelope::new("Bob"));
        let a = LabeledTree::from_envelope(&envelope);
        let b = LabeledTree::from_envelope(&elided);
        assert!(labels_match(&a.nodes[3], &b.nodes[3]));
        assert_ne!(a.nodes[3].label, b.nodes[3].label);
        assert!(!labels_match(&a.nodes[2], &b.nodes[3]));
    }
}
