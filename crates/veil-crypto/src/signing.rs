//! Ed25519 signing keys, public keys and signatures.
//!
//! Envelopes sign the digest of their subject, so messages here are always
//! 32 bytes in practice. Verification is strict: small-order keys and
//! non-canonical signatures are rejected.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

use veil_core::cbor::{expect_byte_array, expect_tagged};
use veil_core::{tags, FromCbor, ToCbor, Value};

use crate::error::{CryptoError, Result};

/// An Ed25519 verification key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Check `signature` over `message`.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        let key = VerifyingKey::from_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;
        key.verify_strict(message, &ed25519_dalek::Signature::from_bytes(&signature.0))
            .map_err(|_| CryptoError::InvalidSignature)
    }
}

impl From<[u8; 32]> for PublicKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey")
            .field(&&self.to_hex()[..16])
            .finish()
    }
}

impl ToCbor for PublicKey {
    fn to_cbor(&self) -> Value {
        Value::Tag(tags::PUBLIC_KEY, Box::new(Value::Bytes(self.0.to_vec())))
    }
}

impl FromCbor for PublicKey {
    fn from_cbor(value: &Value) -> veil_core::Result<Self> {
        Ok(Self(expect_byte_array::<32>(expect_tagged(value, tags::PUBLIC_KEY)?)?))
    }
}

/// A detached Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 64]> for Signature {
    fn from(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signature")
            .field(&&self.to_hex()[..16])
            .finish()
    }
}

impl ToCbor for Signature {
    fn to_cbor(&self) -> Value {
        Value::Tag(tags::SIGNATURE, Box::new(Value::Bytes(self.0.to_vec())))
    }
}

impl FromCbor for Signature {
    fn from_cbor(value: &Value) -> veil_core::Result<Self> {
        Ok(Self(expect_byte_array::<64>(expect_tagged(value, tags::SIGNATURE)?)?))
    }
}

/// A signing key together with its public key.
#[derive(Clone)]
pub struct Keypair(SigningKey);

impl Keypair {
    pub fn generate() -> Self {
        Self::generate_using(&mut rand::thread_rng())
    }

    pub fn generate_using<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(SigningKey::generate(rng))
    }

    /// Deterministic keypair from a 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self(SigningKey::from_bytes(seed))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key().to_bytes())
    }

    /// Deterministic Ed25519 signature over `message`.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message).to_bytes())
    }

    /// The secret seed. Handle with care.
    pub fn seed(&self) -> [u8; 32] {
        self.0.to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Keypair").field(&self.public_key()).finish()
    }
}
