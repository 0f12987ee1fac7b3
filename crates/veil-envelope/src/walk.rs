//! Depth-first traversal.
//!
//! Two modes:
//!
//! - **structural**: every element is visited, nodes included.
//! - **hidden nodes**: node wrappers are skipped. A node's subject is
//!   visited in the node's own position (same level, same incoming edge)
//!   and the node's assertions become children of that subject.
//!
//! The visitor receives the element, its depth, the edge it was reached
//! by, and the state handed down by its parent. It returns the state for
//! its children and whether to stop descending below this element.

use crate::envelope::{Envelope, EnvelopeCase};

/// How an element is attached to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeType {
    None,
    Subject,
    Assertion,
    Predicate,
    Object,
    Content,
}

impl EdgeType {
    /// Short label used in tree diagrams.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            EdgeType::Subject => Some("subj"),
            EdgeType::Content => Some("cont"),
            EdgeType::Predicate => Some("pred"),
            EdgeType::Object => Some("obj"),
            EdgeType::None | EdgeType::Assertion => None,
        }
    }
}

impl Envelope {
    /// Walk the tree, depth first, calling `visit` on each element.
    pub fn walk<S, F>(&self, hide_nodes: bool, state: S, visit: &mut F)
    where
        S: Clone,
        F: FnMut(&Envelope, usize, EdgeType, S) -> (S, bool),
    {
        if hide_nodes {
            self.walk_tree(0, EdgeType::None, state, visit);
        } else {
            self.walk_structure(0, EdgeType::None, state, visit);
        }
    }

    fn walk_structure<S, F>(&self, level: usize, incoming: EdgeType, state: S, visit: &mut F)
    where
        S: Clone,
        F: FnMut(&Envelope, usize, EdgeType, S) -> (S, bool),
    {
        let (state, stop) = visit(self, level, incoming, state);
        if stop {
            return;
        }
        let next = level + 1;
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => {
                subject.walk_structure(next, EdgeType::Subject, state.clone(), visit);
                for assertion in assertions {
                    assertion.walk_structure(next, EdgeType::Assertion, state.clone(), visit);
                }
            }
            EnvelopeCase::Wrapped { envelope, .. } => {
                envelope.walk_structure(next, EdgeType::Content, state, visit);
            }
            EnvelopeCase::Assertion(assertion) => {
                assertion
                    .predicate()
                    .walk_structure(next, EdgeType::Predicate, state.clone(), visit);
                assertion
                    .object()
                    .walk_structure(next, EdgeType::Object, state, visit);
            }
            _ => {}
        }
    }

    /// Returns the state produced by visiting this position, so a node's
    /// assertions can be handed the state of its subject.
    fn walk_tree<S, F>(&self, level: usize, incoming: EdgeType, state: S, visit: &mut F) -> Option<S>
    where
        S: Clone,
        F: FnMut(&Envelope, usize, EdgeType, S) -> (S, bool),
    {
        if let EnvelopeCase::Node {
            subject,
            assertions,
            ..
        } = self.case()
        {
            let subject_state = subject.walk_tree(level, incoming, state, visit)?;
            for assertion in assertions {
                assertion.walk_tree(level + 1, EdgeType::Assertion, subject_state.clone(), visit);
            }
            return Some(subject_state);
        }

        let (state, stop) = visit(self, level, incoming, state);
        if stop {
            return None;
        }
        let next = level + 1;
        match self.case() {
            EnvelopeCase::Wrapped { envelope, .. } => {
                envelope.walk_tree(next, EdgeType::Content, state.clone(), visit);
            }
            EnvelopeCase::Assertion(assertion) => {
                assertion
                    .predicate()
                    .walk_tree(next, EdgeType::Predicate, state.clone(), visit);
                assertion
                    .object()
                    .walk_tree(next, EdgeType::Object, state.clone(), visit);
            }
            _ => {}
        }
        Some(state)
    }
}
