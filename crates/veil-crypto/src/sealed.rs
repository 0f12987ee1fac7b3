//! Sealed messages: public-key encryption to a single recipient.
//!
//! The sender generates an ephemeral X25519 key, agrees a shared secret with
//! the recipient's public key, and derives a one-time symmetric key from it.
//! Only the ephemeral public key and the ciphertext travel with the message.

use rand::{CryptoRng, RngCore};

use veil_core::cbor::{expect_array, expect_tagged};
use veil_core::{tags, CoreError, FromCbor, ToCbor, Value};

use crate::agreement::{X25519PublicKey, X25519StaticSecret};
use crate::error::Result;
use crate::symmetric::{EncryptedMessage, Nonce};

/// A message encrypted to one recipient's X25519 public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    message: EncryptedMessage,
    ephemeral_public: X25519PublicKey,
}

impl SealedMessage {
    /// Seal `plaintext` for `recipient`.
    pub fn seal(plaintext: &[u8], recipient: &X25519PublicKey) -> Result<Self> {
        Self::seal_using(plaintext, recipient, &mut rand::thread_rng())
    }

    /// Seal with a caller-supplied random source.
    pub fn seal_using<R: RngCore + CryptoRng>(
        plaintext: &[u8],
        recipient: &X25519PublicKey,
        rng: &mut R,
    ) -> Result<Self> {
        let ephemeral = X25519StaticSecret::generate_using(rng);
        let ephemeral_public = ephemeral.public_key();
        let nonce = Nonce::generate_using(rng);

        let key = ephemeral.derive_key(recipient, &key_context(&ephemeral_public, recipient));
        let message = key.encrypt_message(plaintext, Some(nonce))?;

        Ok(Self {
            message,
            ephemeral_public,
        })
    }

    /// Open the message with the recipient's secret key.
    ///
    /// Fails with a decryption error if the message was sealed for someone
    /// else.
    pub fn open(&self, secret: &X25519StaticSecret) -> Result<Vec<u8>> {
        let context = key_context(&self.ephemeral_public, &secret.public_key());
        let key = secret.derive_key(&self.ephemeral_public, &context);
        key.decrypt_message(&self.message)
    }

    /// The ephemeral public key of the sender.
    pub fn ephemeral_public_key(&self) -> &X25519PublicKey {
        &self.ephemeral_public
    }
}

fn key_context(ephemeral: &X25519PublicKey, recipient: &X25519PublicKey) -> [u8; 64] {
    let mut context = [0u8; 64];
    context[..32].copy_from_slice(ephemeral.as_bytes());
    context[32..].copy_from_slice(recipient.as_bytes());
    context
}

impl ToCbor for SealedMessage {
    fn to_cbor(&self) -> Value {
        Value::Tag(
            tags::SEALED_MESSAGE,
            Box::new(Value::Array(vec![
                self.message.to_cbor(),
                self.ephemeral_public.to_cbor(),
            ])),
        )
    }
}

impl FromCbor for SealedMessage {
    fn from_cbor(value: &Value) -> veil_core::Result<Self> {
        let items = expect_array(expect_tagged(value, tags::SEALED_MESSAGE)?)?;
        let [message, ephemeral] = items else {
            return Err(CoreError::invalid_format("sealed message must have 2 elements"));
        };
        Ok(Self {
            message: EncryptedMessage::from_cbor(message)?,
            ephemeral_public: X25519PublicKey::from_cbor(ephemeral)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CryptoError;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_seal_open() {
        let bob = X25519StaticSecret::generate();
        let sealed = SealedMessage::seal(b"content key", &bob.public_key()).unwrap();
        assert_eq!(sealed.open(&bob).unwrap(), b"content key");
    }

    #[test]
    fn test_wrong_recipient_cannot_open() {
        let bob = X25519StaticSecret::generate();
        let carol = X25519StaticSecret::generate();
        let sealed = SealedMessage::seal(b"content key", &bob.public_key()).unwrap();
        assert!(matches!(sealed.open(&carol), Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn test_seeded_seal_is_reproducible() {
        let bob = X25519StaticSecret::from_bytes([5; 32]);
        let a = SealedMessage::seal_using(b"k", &bob.public_key(), &mut StdRng::seed_from_u64(9))
            .unwrap();
        let b = SealedMessage::seal_using(b"k", &bob.public_key(), &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_cbor_roundtrip_then_open() {
        let bob = X25519StaticSecret::generate();
        let sealed = SealedMessage::seal(b"payload", &bob.public_key()).unwrap();
        let decoded = SealedMessage::from_cbor(&sealed.to_cbor()).unwrap();
        assert_eq!(decoded.open(&bob).unwrap(), b"payload");
    }
}
