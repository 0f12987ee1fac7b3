//! Conversion of values into and out of envelopes.
//!
//! [`EnvelopeEncodable`] is the promotion rule used wherever an operand may
//! be "anything": leaf-encodable values become leaves, known values and
//! assertions keep their variant, and an envelope is wrapped.
//! [`EnvelopeDecodable`] reads a typed value back out of an envelope's
//! subject.

use bytes::Bytes;

use veil_core::{Date, Digest, FromCbor, ToCbor, Value};
use veil_crypto::{PublicKey, SealedMessage, Signature, SskrShare, X25519PublicKey};

use crate::assertion::Assertion;
use crate::envelope::{Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, Result};
use crate::known_values::KnownValue;
use crate::salt::Salt;

/// Types that can be turned into an envelope.
pub trait EnvelopeEncodable {
    fn into_envelope(self) -> Envelope;
}

/// Types that can be extracted from an envelope's subject.
pub trait EnvelopeDecodable: Sized {
    fn try_from_envelope(envelope: &Envelope) -> Result<Self>;
}

impl EnvelopeEncodable for Envelope {
    fn into_envelope(self) -> Envelope {
        Envelope::new_wrapped(self)
    }
}

impl EnvelopeEncodable for &Envelope {
    fn into_envelope(self) -> Envelope {
        Envelope::new_wrapped(self.clone())
    }
}

impl EnvelopeEncodable for Assertion {
    fn into_envelope(self) -> Envelope {
        Envelope::new_with_assertion(self)
    }
}

impl EnvelopeEncodable for KnownValue {
    fn into_envelope(self) -> Envelope {
        Envelope::new_known_value(self)
    }
}

impl EnvelopeEncodable for &KnownValue {
    fn into_envelope(self) -> Envelope {
        Envelope::new_known_value(self.clone())
    }
}

macro_rules! impl_envelope_leaf {
    ($($t:ty),* $(,)?) => {
        $(
            impl EnvelopeEncodable for $t {
                fn into_envelope(self) -> Envelope {
                    Envelope::new_leaf_value(self.to_cbor())
                }
            }
        )*
    };
}

impl_envelope_leaf!(
    &str,
    String,
    &String,
    bool,
    u8,
    u16,
    u32,
    u64,
    usize,
    i8,
    i16,
    i32,
    i64,
    f64,
    Bytes,
    &[u8],
    Value,
    Date,
    Digest,
    Salt,
    PublicKey,
    Signature,
    X25519PublicKey,
    SealedMessage,
    SskrShare,
);

/// A list becomes one leaf holding a CBOR array.
impl<T: ToCbor> EnvelopeEncodable for Vec<T> {
    fn into_envelope(self) -> Envelope {
        Envelope::new_leaf_value(self.to_cbor())
    }
}

impl EnvelopeDecodable for Envelope {
    fn try_from_envelope(envelope: &Envelope) -> Result<Self> {
        Ok(envelope.clone())
    }
}

impl EnvelopeDecodable for Assertion {
    fn try_from_envelope(envelope: &Envelope) -> Result<Self> {
        envelope
            .as_assertion()
            .ok_or_else(|| EnvelopeError::invalid_format("subject is not an assertion"))
    }
}

impl EnvelopeDecodable for KnownValue {
    fn try_from_envelope(envelope: &Envelope) -> Result<Self> {
        match envelope.subject().case() {
            EnvelopeCase::KnownValue { value, .. } => Ok(value.clone()),
            _ => Err(EnvelopeError::invalid_format("subject is not a known value")),
        }
    }
}

macro_rules! impl_envelope_decodable_leaf {
    ($($t:ty),* $(,)?) => {
        $(
            impl EnvelopeDecodable for $t {
                fn try_from_envelope(envelope: &Envelope) -> Result<Self> {
                    match envelope.subject().case() {
                        EnvelopeCase::Leaf { cbor, .. } => <$t>::from_cbor(cbor)
                            .map_err(|e| EnvelopeError::InvalidFormat(e.to_string())),
                        _ => Err(EnvelopeError::invalid_format("subject is not a leaf")),
                    }
                }
            }
        )*
    };
}

impl_envelope_decodable_leaf!(
    String,
    bool,
    u8,
    u16,
    u32,
    u64,
    usize,
    i8,
    i16,
    i32,
    i64,
    f64,
    Bytes,
    Value,
    Date,
    Digest,
    Salt,
    PublicKey,
    Signature,
    X25519PublicKey,
    SealedMessage,
    SskrShare,
);

impl<T: FromCbor> EnvelopeDecodable for Vec<T> {
    fn try_from_envelope(envelope: &Envelope) -> Result<Self> {
        match envelope.subject().case() {
            EnvelopeCase::Leaf { cbor, .. } => {
                Vec::<T>::from_cbor(cbor).map_err(|e| EnvelopeError::InvalidFormat(e.to_string()))
            }
            _ => Err(EnvelopeError::invalid_format("subject is not a leaf")),
        }
    }
}
