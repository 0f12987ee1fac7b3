//! X25519 key agreement.
//!
//! Agreement keys are kept apart from signing keys. The raw Diffie-Hellman
//! output never leaves this module: callers get a [`SymmetricKey`] derived
//! from it with Blake3 in key-derivation mode, bound to a caller context.

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use x25519_dalek::StaticSecret;

use veil_core::cbor::{expect_byte_array, expect_tagged};
use veil_core::{tags, FromCbor, ToCbor, Value};

use crate::symmetric::SymmetricKey;

const AGREEMENT_KDF_CONTEXT: &str = "veil-sealed-v0-encryption";

/// Public half of an agreement key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct X25519PublicKey(pub [u8; 32]);

impl X25519PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 32]> for X25519PublicKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for X25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("X25519PublicKey")
            .field(&&self.to_hex()[..16])
            .finish()
    }
}

impl ToCbor for X25519PublicKey {
    fn to_cbor(&self) -> Value {
        Value::Tag(tags::X25519_PUBLIC_KEY, Box::new(Value::Bytes(self.0.to_vec())))
    }
}

impl FromCbor for X25519PublicKey {
    fn from_cbor(value: &Value) -> veil_core::Result<Self> {
        let inner = expect_tagged(value, tags::X25519_PUBLIC_KEY)?;
        Ok(Self(expect_byte_array::<32>(inner)?))
    }
}

/// Private half of an agreement key. Also used for the one-shot sender
/// keys of sealed messages.
#[derive(Clone)]
pub struct X25519StaticSecret(StaticSecret);

impl X25519StaticSecret {
    pub fn generate() -> Self {
        Self::generate_using(&mut rand::thread_rng())
    }

    pub fn generate_using<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(StaticSecret::random_from_rng(rng))
    }

    /// A secret from fixed bytes (clamped on use).
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey(x25519_dalek::PublicKey::from(&self.0).to_bytes())
    }

    /// The symmetric key both sides of an exchange with `peer` arrive at
    /// for the same `context`.
    pub fn derive_key(&self, peer: &X25519PublicKey, context: &[u8]) -> SymmetricKey {
        let shared = self.0.diffie_hellman(&x25519_dalek::PublicKey::from(peer.0));
        let mut hasher = blake3::Hasher::new_derive_key(AGREEMENT_KDF_CONTEXT);
        hasher.update(shared.as_bytes());
        hasher.update(context);
        SymmetricKey::from_bytes(*hasher.finalize().as_bytes())
    }
}

impl fmt::Debug for X25519StaticSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("X25519StaticSecret")
            .field(&self.public_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_both_sides_derive_same_key() {
        let mut rng = StdRng::seed_from_u64(1);
        let alice = X25519StaticSecret::generate_using(&mut rng);
        let bob = X25519StaticSecret::generate_using(&mut rng);

        let from_alice = alice.derive_key(&bob.public_key(), b"ctx");
        let from_bob = bob.derive_key(&alice.public_key(), b"ctx");
        assert_eq!(from_alice, from_bob);
    }

    #[test]
    fn test_context_separates_keys() {
        let alice = X25519StaticSecret::from_bytes([0x42; 32]);
        let bob = X25519StaticSecret::from_bytes([0x24; 32]).public_key();

        assert_ne!(alice.derive_key(&bob, b"context-a"), alice.derive_key(&bob, b"context-b"));
        assert_eq!(alice.derive_key(&bob, b"context-a"), alice.derive_key(&bob, b"context-a"));
    }

    #[test]
    fn test_third_party_derives_different_key() {
        let alice = X25519StaticSecret::from_bytes([1; 32]);
        let bob = X25519StaticSecret::from_bytes([2; 32]);
        let eve = X25519StaticSecret::from_bytes([3; 32]);

        let key = alice.derive_key(&bob.public_key(), b"");
        assert_ne!(eve.derive_key(&alice.public_key(), b""), key);
    }

    #[test]
    fn test_public_key_cbor() {
        let public = X25519StaticSecret::from_bytes([9; 32]).public_key();
        let decoded = X25519PublicKey::from_cbor(&public.to_cbor()).unwrap();
        assert_eq!(decoded, public);
        assert!(X25519PublicKey::from_cbor(&Value::Bytes(public.0.to_vec())).is_err());
    }
}
