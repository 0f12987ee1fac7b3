//! The portable edit script.
//!
//! Source positions are numbered in pre-order starting at 0. Each insert
//! takes the next free id, so later edits can refer to inserted nodes.
//!
//! ```text
//! delete      = [0, id]
//! rename      = [1, id, label]
//! insert-root = [2, label]
//! insert      = [3, label, parent, position, children-count, descendants]
//! label       = [edge, kind, payload]
//! ```

use veil_core::cbor::{expect_array, expect_u64};
use veil_core::{CoreError, FromCbor, ToCbor, Value};

use crate::tree::Label;

/// One step of an edit script.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Remove a node; its children take its place.
    Delete { id: usize },
    /// Replace a node's label.
    Rename { id: usize, label: Label },
    /// Add a new root above every current root.
    InsertRoot { label: Label },
    /// Add a child of `parent` at `position` that adopts the
    /// `children_count` children currently starting there. `descendants`
    /// is the size of the adopted subtrees, checked on replay.
    Insert {
        label: Label,
        parent: usize,
        position: usize,
        children_count: usize,
        descendants: usize,
    },
}

fn uint(n: usize) -> Value {
    Value::Integer((n as u64).into())
}

fn expect_usize(value: &Value) -> veil_core::Result<usize> {
    usize::try_from(expect_u64(value)?).map_err(|_| CoreError::invalid_format("index out of range"))
}

impl ToCbor for Edit {
    fn to_cbor(&self) -> Value {
        Value::Array(match self {
            Edit::Delete { id } => vec![uint(0), uint(*id)],
            Edit::Rename { id, label } => vec![uint(1), uint(*id), label.to_cbor()],
            Edit::InsertRoot { label } => vec![uint(2), label.to_cbor()],
            Edit::Insert {
                label,
                parent,
                position,
                children_count,
                descendants,
            } => vec![
                uint(3),
                label.to_cbor(),
                uint(*parent),
                uint(*position),
                uint(*children_count),
                uint(*descendants),
            ],
        })
    }
}

impl FromCbor for Edit {
    fn from_cbor(value: &Value) -> veil_core::Result<Self> {
        let items = expect_array(value)?;
        let Some((op, args)) = items.split_first() else {
            return Err(CoreError::invalid_format("empty edit"));
        };
        Ok(match (expect_u64(op)?, args) {
            (0, [id]) => Edit::Delete {
                id: expect_usize(id)?,
            },
            (1, [id, label]) => Edit::Rename {
                id: expect_usize(id)?,
                label: Label::from_cbor(label)?,
            },
            (2, [label]) => Edit::InsertRoot {
                label: Label::from_cbor(label)?,
            },
            (3, [label, parent, position, children_count, descendants]) => Edit::Insert {
                label: Label::from_cbor(label)?,
                parent: expect_usize(parent)?,
                position: expect_usize(position)?,
                children_count: expect_usize(children_count)?,
                descendants: expect_usize(descendants)?,
            },
            _ => return Err(CoreError::invalid_format("malformed edit")),
        })
    }
}

/// Encode a whole script.
pub fn script_to_cbor(edits: &[Edit]) -> Value {
    Value::Array(edits.iter().map(ToCbor::to_cbor).collect())
}

/// Decode a whole script.
pub fn script_from_cbor(value: &Value) -> veil_core::Result<Vec<Edit>> {
    expect_array(value)?.iter().map(Edit::from_cbor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::LabelKind;
    use veil_envelope::EdgeType;

    #[test]
    fn test_script_cbor() {
        let label = Label {
            edge: EdgeType::Assertion,
            kind: LabelKind::Assertion,
        };
        let script = vec![
            Edit::Delete { id: 4 },
            Edit::Rename {
                id: 1,
                label: label.clone(),
            },
            Edit::Insert {
                label,
                parent: 0,
                position: 1,
                children_count: 0,
                descendants: 0,
            },
        ];
        let decoded = script_from_cbor(&script_to_cbor(&script)).unwrap();
        assert_eq!(decoded, script);
    }

    #[test]
    fn test_rejects_malformed() {
        let bad = [
            Value::Array(vec![]),
            Value::Array(vec![uint(0)]),
            Value::Array(vec![uint(9), uint(1)]),
            Value::Text("delete".into()),
        ];
        for value in bad {
            assert!(Edit::from_cbor(&value).is_err(), "{value:?}");
        }
    }
}
