//! Blake3 digests: the identity of every envelope element.

use serde::{Deserialize, Serialize};
use std::fmt;

use ciborium::value::Value;

use crate::cbor::{expect_tagged, FromCbor, ToCbor};
use crate::error::{CoreError, Result};
use crate::tags;

/// Size of a digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// A 32-byte Blake3 digest.
///
/// Digests are totally ordered (byte-wise), which is what gives the
/// assertions of a node their canonical order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest(pub [u8; DIGEST_LEN]);

impl Digest {
    /// Compute the digest of an image (arbitrary bytes).
    pub fn from_image(image: &[u8]) -> Self {
        Self(*blake3::hash(image).as_bytes())
    }

    /// Compute the digest of the concatenation of several digests.
    pub fn from_digests(digests: &[Digest]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for digest in digests {
            hasher.update(&digest.0);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> std::result::Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != DIGEST_LEN {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; DIGEST_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The first four bytes as hex, used in diagnostics and tree output.
    pub fn short_description(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Check that `image` hashes to this digest.
    pub fn validate(&self, image: &[u8]) -> Result<()> {
        let actual = Digest::from_image(image);
        if actual != *self {
            return Err(CoreError::InvalidDigest {
                expected: self.to_hex(),
                actual: actual.to_hex(),
            });
        }
        Ok(())
    }

    /// Parse from a byte slice of exactly [`DIGEST_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; DIGEST_LEN] = bytes
            .try_into()
            .map_err(|_| CoreError::invalid_format("digest must be 32 bytes"))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> std::result::Result<Self, Self::Error> {
        let arr: [u8; DIGEST_LEN] = slice.try_into()?;
        Ok(Self(arr))
    }
}

/// Anything that can report the digest it stands for.
///
/// Envelopes, assertions and bare digests all implement this, so targets for
/// elision, removal and proofs can be given in whichever form is at hand.
pub trait DigestProvider {
    fn digest(&self) -> Digest;
}

impl DigestProvider for Digest {
    fn digest(&self) -> Digest {
        *self
    }
}

impl<T: DigestProvider + ?Sized> DigestProvider for &T {
    fn digest(&self) -> Digest {
        (**self).digest()
    }
}

impl ToCbor for Digest {
    fn to_cbor(&self) -> Value {
        Value::Tag(tags::DIGEST, Box::new(Value::Bytes(self.0.to_vec())))
    }
}

impl FromCbor for Digest {
    fn from_cbor(value: &Value) -> Result<Self> {
        match expect_tagged(value, tags::DIGEST)? {
            Value::Bytes(b) => Digest::from_slice(b),
            _ => Err(CoreError::invalid_format("digest content must be a byte string")),
        }
    }
}
