//! # Veil Diff
//!
//! Structural diffs between envelopes.
//!
//! Both envelopes are flattened into labeled ordered trees (assertion
//! nodes hidden, so a node's subject carries its position), an optimal
//! edit mapping is computed with Zhang–Shasha, and the result is packed
//! into a diff envelope whose subject is the digest of the source.
//! An obscured element and its revealed counterpart share a digest, so
//! they map onto each other at no cost.
//!
//! ## Example
//!
//! ```
//! use veil_diff::EnvelopeDiff;
//! use veil_envelope::Envelope;
//!
//! let a = Envelope::new("Alice").add_assertion("knows", "Bob");
//! let b = Envelope::new("Alice").add_assertion("knows", "Carol");
//!
//! let diff = a.diff(&b);
//! assert_eq!(a.transform(&diff).unwrap(), b);
//! ```

pub mod config;
pub mod diff;
pub mod edits;
pub mod error;
mod ted;
pub mod tree;

pub use config::DiffConfig;
pub use diff::{apply, diff, diff_with, edit_script, transform, EnvelopeDiff};
pub use edits::{script_from_cbor, script_to_cbor, Edit};
pub use error::{DiffError, Result};
pub use tree::{labels_match, Label, LabelKind, LabeledTree, TreeNode};
