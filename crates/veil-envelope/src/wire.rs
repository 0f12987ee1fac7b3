//! Wire encoding.
//!
//! ```text
//! envelope   = tag(200, untagged)
//! untagged   = node / leaf / wrapped / assertion / known-value
//!            / encrypted / compressed / elided
//! node       = [untagged, untagged...]     ; subject, then sorted assertions
//! leaf       = tag(24, any)
//! wrapped    = tag(203, untagged)
//! assertion  = tag(201, [untagged, untagged])
//! known-value= tag(202, uint)
//! encrypted  = tag(204, [ciphertext, nonce, digest])
//! compressed = tag(205, [data, size, digest])
//! elided     = tag(206, bytes .size 32)
//! ```
//!
//! Encrypted and compressed payloads hold the untagged encoding of the
//! element they stand for.

use veil_core::cbor::{expect_array, expect_bytes};
use veil_core::{canonical, tags, Compressed, Digest, FromCbor, ToCbor, Value};
use veil_crypto::EncryptedMessage;

use crate::assertion::Assertion;
use crate::config::CodecConfig;
use crate::envelope::{Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, Result};
use crate::known_values::KnownValue;

impl Envelope {
    /// CBOR item without the outer envelope tag.
    pub fn untagged_cbor(&self) -> Value {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => {
                let mut items = Vec::with_capacity(assertions.len() + 1);
                items.push(subject.untagged_cbor());
                items.extend(assertions.iter().map(Envelope::untagged_cbor));
                Value::Array(items)
            }
            EnvelopeCase::Leaf { cbor, .. } => Value::Tag(tags::LEAF, Box::new(cbor.clone())),
            EnvelopeCase::Wrapped { envelope, .. } => {
                Value::Tag(tags::WRAPPED, Box::new(envelope.untagged_cbor()))
            }
            EnvelopeCase::KnownValue { value, .. } => value.to_cbor(),
            EnvelopeCase::Assertion(assertion) => Value::Tag(
                tags::ASSERTION,
                Box::new(Value::Array(vec![
                    assertion.predicate().untagged_cbor(),
                    assertion.object().untagged_cbor(),
                ])),
            ),
            EnvelopeCase::Encrypted { message, .. } => message.to_cbor(),
            EnvelopeCase::Compressed { compressed, .. } => compressed.to_cbor(),
            EnvelopeCase::Elided(digest) => {
                Value::Tag(tags::ELIDED, Box::new(Value::Bytes(digest.as_bytes().to_vec())))
            }
        }
    }

    pub fn tagged_cbor(&self) -> Value {
        Value::Tag(tags::ENVELOPE, Box::new(self.untagged_cbor()))
    }

    pub fn to_cbor_data(&self) -> Vec<u8> {
        canonical::encode(&self.tagged_cbor())
    }

    pub fn to_untagged_cbor_data(&self) -> Vec<u8> {
        canonical::encode(&self.untagged_cbor())
    }

    pub fn from_cbor_data(data: &[u8]) -> Result<Self> {
        Self::from_cbor_data_with(data, &CodecConfig::default())
    }

    pub fn from_cbor_data_with(data: &[u8], config: &CodecConfig) -> Result<Self> {
        let value = canonical::decode_with_limits(data, &config.into())?;
        Self::from_tagged_cbor(&value)
    }

    pub fn from_untagged_cbor_data(data: &[u8]) -> Result<Self> {
        Self::from_untagged_cbor_data_with(data, &CodecConfig::default())
    }

    pub fn from_untagged_cbor_data_with(data: &[u8], config: &CodecConfig) -> Result<Self> {
        let value = canonical::decode_with_limits(data, &config.into())?;
        Self::from_untagged_cbor(&value)
    }

    pub fn from_tagged_cbor(value: &Value) -> Result<Self> {
        match value {
            Value::Tag(tags::ENVELOPE, inner) => Self::from_untagged_cbor(inner),
            _ => Err(EnvelopeError::invalid_format("missing envelope tag")),
        }
    }

    pub fn from_untagged_cbor(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => Self::node_from_items(items),
            Value::Tag(tags::LEAF, inner) => Ok(Envelope::new_leaf_value((**inner).clone())),
            Value::Tag(tags::WRAPPED, inner) => {
                Ok(Envelope::new_wrapped(Self::from_untagged_cbor(inner)?))
            }
            Value::Tag(tags::ASSERTION, inner) => {
                let [predicate, object] = expect_array(inner)? else {
                    return Err(EnvelopeError::invalid_format(
                        "assertion must have 2 elements",
                    ));
                };
                Ok(Envelope::new_with_assertion(Assertion::from_envelopes(
                    Self::from_untagged_cbor(predicate)?,
                    Self::from_untagged_cbor(object)?,
                )))
            }
            Value::Tag(tags::KNOWN_VALUE, _) => {
                Ok(Envelope::new_known_value(KnownValue::from_cbor(value)?))
            }
            Value::Tag(tags::ENCRYPTED, _) => {
                Envelope::new_with_encrypted(EncryptedMessage::from_cbor(value)?)
            }
            Value::Tag(tags::COMPRESSED, _) => {
                Envelope::new_with_compressed(Compressed::from_cbor(value)?)
            }
            Value::Tag(tags::ELIDED, inner) => {
                Ok(Envelope::new_elided(Digest::from_slice(expect_bytes(inner)?)?))
            }
            Value::Tag(tag, _) => Err(EnvelopeError::InvalidFormat(format!(
                "unknown envelope tag {tag}"
            ))),
            _ => Err(EnvelopeError::invalid_format("not an envelope")),
        }
    }

    fn node_from_items(items: &[Value]) -> Result<Self> {
        let Some((subject, assertions)) = items.split_first() else {
            return Err(EnvelopeError::invalid_format("empty node"));
        };
        if assertions.is_empty() {
            return Err(EnvelopeError::invalid_format("node without assertions"));
        }
        let subject = Self::from_untagged_cbor(subject)?;
        let assertions = assertions
            .iter()
            .map(Self::from_untagged_cbor)
            .collect::<Result<Vec<_>>>()?;

        if assertions.windows(2).any(|w| w[0].digest() >= w[1].digest()) {
            return Err(EnvelopeError::invalid_format(
                "node assertions not in ascending digest order",
            ));
        }
        Envelope::new_with_assertions(subject, assertions)
    }

    /// Hex of the tagged wire encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_cbor_data())
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let data = hex::decode(s).map_err(|e| EnvelopeError::InvalidFormat(e.to_string()))?;
        Self::from_cbor_data(&data)
    }
}

impl ToCbor for Envelope {
    fn to_cbor(&self) -> Value {
        self.tagged_cbor()
    }
}
