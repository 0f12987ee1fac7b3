//! Human-readable envelope notation.
//!
//! ```text
//! {
//!     "Alice" [
//!         "knows": "Bob"
//!         'isA': "Person"
//!     ]
//! } [
//!     'verifiedBy': Signature
//! ]
//! ```
//!
//! Presentation only: nothing here is parsed back.

use veil_core::cbor::diagnostic;

use crate::envelope::{Envelope, EnvelopeCase};

const INDENT: &str = "    ";

/// Layout-independent shape of the notation.
enum Notation {
    Atom(String),
    Wrapped(Box<Notation>),
    Assertion(Box<Notation>, Box<Notation>),
    Node(Box<Notation>, Vec<Notation>),
}

impl Notation {
    fn flat(&self) -> String {
        match self {
            Notation::Atom(s) => s.clone(),
            Notation::Wrapped(inner) => format!("{{ {} }}", inner.flat()),
            Notation::Assertion(predicate, object) => {
                format!("{}: {}", predicate.flat(), object.flat())
            }
            Notation::Node(subject, items) => {
                let items: Vec<String> = items.iter().map(Notation::flat).collect();
                format!("{} [ {} ]", subject.flat(), items.join(", "))
            }
        }
    }

    fn lines(&self) -> Vec<String> {
        match self {
            Notation::Atom(s) => vec![s.clone()],
            Notation::Wrapped(inner) => {
                let mut lines = vec!["{".to_string()];
                lines.extend(indented(inner.lines()));
                lines.push("}".to_string());
                lines
            }
            Notation::Assertion(predicate, object) => {
                let mut lines = predicate.lines();
                let mut object = object.lines().into_iter();
                if let (Some(last), Some(first)) = (lines.last_mut(), object.next()) {
                    last.push_str(": ");
                    last.push_str(&first);
                }
                lines.extend(object);
                lines
            }
            Notation::Node(subject, items) => {
                let mut lines = subject.lines();
                if let Some(last) = lines.last_mut() {
                    last.push_str(" [");
                }
                for item in items {
                    lines.extend(indented(item.lines()));
                }
                lines.push("]".to_string());
                lines
            }
        }
    }
}

fn indented(lines: Vec<String>) -> impl Iterator<Item = String> {
    lines.into_iter().map(|line| format!("{INDENT}{line}"))
}

impl Envelope {
    /// Multi-line envelope notation.
    pub fn format(&self) -> String {
        self.notation().lines().join("\n")
    }

    /// Single-line envelope notation.
    pub fn format_flat(&self) -> String {
        self.notation().flat()
    }

    fn notation(&self) -> Notation {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => Notation::Node(
                Box::new(subject.notation()),
                assertion_items(assertions),
            ),
            EnvelopeCase::Wrapped { envelope, .. } => {
                Notation::Wrapped(Box::new(envelope.notation()))
            }
            EnvelopeCase::Assertion(assertion) => Notation::Assertion(
                Box::new(assertion.predicate().notation()),
                Box::new(assertion.object().notation()),
            ),
            _ => Notation::Atom(self.summary()),
        }
    }

    /// One-word description of this element, as used in notation and trees.
    pub fn summary(&self) -> String {
        match self.case() {
            EnvelopeCase::Node { .. } => "NODE".to_string(),
            EnvelopeCase::Leaf { cbor, .. } => diagnostic(cbor),
            EnvelopeCase::Wrapped { .. } => "WRAPPED".to_string(),
            EnvelopeCase::KnownValue { value, .. } => format!("'{}'", value.name()),
            EnvelopeCase::Assertion(_) => "ASSERTION".to_string(),
            EnvelopeCase::Encrypted { .. } => "ENCRYPTED".to_string(),
            EnvelopeCase::Compressed { .. } => "COMPRESSED".to_string(),
            EnvelopeCase::Elided(_) => "ELIDED".to_string(),
        }
    }

    /// One line per element in structural walk order, with short digests
    /// and edge labels.
    pub fn tree_format(&self) -> String {
        let mut lines = Vec::new();
        self.walk(false, (), &mut |envelope, level, edge, _| {
            let mut line = format!(
                "{}{}",
                INDENT.repeat(level),
                envelope.digest().short_description()
            );
            if let Some(label) = edge.label() {
                line.push(' ');
                line.push_str(label);
            }
            line.push(' ');
            line.push_str(&envelope.summary());
            lines.push(line);
            ((), false)
        });
        lines.join("\n")
    }
}

/// Plain assertions sorted by their text, then obscured ones grouped.
fn assertion_items(assertions: &[Envelope]) -> Vec<Notation> {
    let mut plain: Vec<(String, Notation)> = Vec::new();
    let (mut elided, mut encrypted, mut compressed) = (0usize, 0usize, 0usize);
    for assertion in assertions {
        match assertion.case() {
            EnvelopeCase::Elided(_) => elided += 1,
            EnvelopeCase::Encrypted { .. } => encrypted += 1,
            EnvelopeCase::Compressed { .. } => compressed += 1,
            _ => {
                let notation = assertion.notation();
                plain.push((notation.flat(), notation));
            }
        }
    }
    plain.sort_by(|a, b| a.0.cmp(&b.0));

    let mut items: Vec<Notation> = plain.into_iter().map(|(_, n)| n).collect();
    for (count, word) in [
        (elided, "ELIDED"),
        (encrypted, "ENCRYPTED"),
        (compressed, "COMPRESSED"),
    ] {
        match count {
            0 => {}
            1 => items.push(Notation::Atom(word.to_string())),
            n => items.push(Notation::Atom(format!("{word} ({n})"))),
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::known_values;

    #[test]
    fn test_leaf_and_known_value() {
        assert_eq!(Envelope::new("Hello.").format(), r#""Hello.""#);
        assert_eq!(Envelope::new(42u64).format(), "42");
        assert_eq!(Envelope::new(known_values::IS_A).format(), "'isA'");
    }

    #[test]
    fn test_flat_node() {
        let envelope = Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .add_assertion(known_values::IS_A, "Person");
        assert_eq!(
            envelope.format_flat(),
            r#""Alice" [ "knows": "Bob", 'isA': "Person" ]"#
        );
    }

    #[test]
    fn test_multiline_wrapped() {
        let envelope = Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .wrap()
            .add_assertion(known_values::NOTE, "signed");
        let expected = [
            "{",
            r#"    "Alice" ["#,
            r#"        "knows": "Bob""#,
            "    ]",
            "} [",
            r#"    'note': "signed""#,
            "]",
        ]
        .join("\n");
        assert_eq!(envelope.format(), expected);
    }

    #[test]
    fn test_obscured_runs_collapse() {
        let envelope = Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .add_assertion("knows", "Carol")
            .add_assertion("knows", "Dave");
        let elided = envelope.elide_revealing_set(
            &[envelope.digest(), envelope.subject().digest()].into(),
        );
        assert_eq!(elided.format_flat(), r#""Alice" [ ELIDED (3) ]"#);

        let one = envelope.elide_removing_target(&Envelope::new_assertion("knows", "Carol"));
        assert_eq!(
            one.format_flat(),
            r#""Alice" [ "knows": "Bob", "knows": "Dave", ELIDED ]"#
        );
    }

    #[test]
    fn test_nested_object_multiline() {
        let envelope = Envelope::new("Alice")
            .add_assertion("knows", Envelope::new("Bob").add_assertion("age", 30u64));
        let expected = [
            r#""Alice" ["#,
            r#"    "knows": {"#,
            r#"        "Bob" ["#,
            r#"            "age": 30"#,
            "        ]",
            "    }",
            "]",
        ]
        .join("\n");
        assert_eq!(envelope.format(), expected);
    }

    #[test]
    fn test_tree_format() {
        let envelope = Envelope::new("Alice").add_assertion("knows", "Bob");
        let tree = envelope.tree_format();
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].ends_with(" NODE"));
        assert!(lines[1].starts_with(INDENT) && lines[1].ends_with(r#" subj "Alice""#));
        assert!(lines[2].ends_with(" ASSERTION"));
        assert!(lines[3].ends_with(r#" pred "knows""#));
        assert!(lines[4].ends_with(r#" obj "Bob""#));
    }
}
