//! Symmetric authenticated encryption (ChaCha20-Poly1305).
//!
//! An [`EncryptedMessage`] may carry the digest of its plaintext. When it
//! does, the digest is bound into the ciphertext as associated data, so the
//! recorded digest cannot be swapped without decryption failing.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce as AeadNonce,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

use veil_core::cbor::{expect_array, expect_byte_array, expect_bytes, expect_tagged};
use veil_core::{tags, CoreError, Digest, FromCbor, ToCbor, Value};

use crate::error::{CryptoError, Result};

/// A 256-bit symmetric encryption key for ChaCha20-Poly1305.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; 32]);

impl SymmetricKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        Self::generate_using(&mut rand::thread_rng())
    }

    /// Generate a key from a caller-supplied random source.
    pub fn generate_using<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, which must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encrypt raw bytes with associated data.
    pub fn encrypt(&self, plaintext: &[u8], aad: &[u8], nonce: &Nonce) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let nonce = AeadNonce::from_slice(&nonce.0);
        cipher
            .encrypt(nonce, Payload { msg: plaintext, aad })
            .map_err(|e| CryptoError::Encryption(e.to_string()))
    }

    /// Decrypt raw bytes with associated data.
    pub fn decrypt(&self, ciphertext: &[u8], aad: &[u8], nonce: &Nonce) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CryptoError::Decryption(e.to_string()))?;

        let nonce = AeadNonce::from_slice(&nonce.0);
        cipher
            .decrypt(nonce, Payload { msg: ciphertext, aad })
            .map_err(|e| CryptoError::Decryption(e.to_string()))
    }

    /// Encrypt `plaintext`, recording and authenticating `digest`.
    ///
    /// A fresh random nonce is used unless one is supplied.
    pub fn encrypt_with_digest(
        &self,
        plaintext: &[u8],
        digest: Digest,
        nonce: Option<Nonce>,
    ) -> Result<EncryptedMessage> {
        let nonce = nonce.unwrap_or_else(Nonce::generate);
        let ciphertext = self.encrypt(plaintext, digest.as_bytes(), &nonce)?;
        Ok(EncryptedMessage {
            ciphertext,
            nonce,
            aad_digest: Some(digest),
        })
    }

    /// Encrypt `plaintext` without a recorded digest.
    pub fn encrypt_message(&self, plaintext: &[u8], nonce: Option<Nonce>) -> Result<EncryptedMessage> {
        let nonce = nonce.unwrap_or_else(Nonce::generate);
        let ciphertext = self.encrypt(plaintext, &[], &nonce)?;
        Ok(EncryptedMessage {
            ciphertext,
            nonce,
            aad_digest: None,
        })
    }

    /// Decrypt a message produced by [`SymmetricKey::encrypt_with_digest`]
    /// or [`SymmetricKey::encrypt_message`].
    pub fn decrypt_message(&self, message: &EncryptedMessage) -> Result<Vec<u8>> {
        self.decrypt(&message.ciphertext, &message.aad(), &message.nonce)
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey(..)")
    }
}

/// A 96-bit nonce for ChaCha20-Poly1305.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nonce(pub [u8; 12]);

impl Nonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        Self::generate_using(&mut rand::thread_rng())
    }

    /// Generate a nonce from a caller-supplied random source.
    pub fn generate_using<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 12];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

/// Ciphertext (with its authentication tag), nonce, and optional digest of
/// the plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedMessage {
    ciphertext: Vec<u8>,
    nonce: Nonce,
    aad_digest: Option<Digest>,
}

impl EncryptedMessage {
    /// Assemble from parts (e.g. decoded from CBOR).
    pub fn new(ciphertext: Vec<u8>, nonce: Nonce, aad_digest: Option<Digest>) -> Self {
        Self {
            ciphertext,
            nonce,
            aad_digest,
        }
    }

    /// The encrypted data, including the authentication tag.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Nonce used for encryption.
    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    /// Digest of the plaintext, if recorded.
    pub fn aad_digest(&self) -> Option<Digest> {
        self.aad_digest
    }

    /// Whether a plaintext digest was recorded.
    pub fn has_digest(&self) -> bool {
        self.aad_digest.is_some()
    }

    fn aad(&self) -> Vec<u8> {
        self.aad_digest
            .map(|d| d.as_bytes().to_vec())
            .unwrap_or_default()
    }
}

impl ToCbor for EncryptedMessage {
    fn to_cbor(&self) -> Value {
        let mut items = vec![
            Value::Bytes(self.ciphertext.clone()),
            Value::Bytes(self.nonce.0.to_vec()),
        ];
        if let Some(digest) = &self.aad_digest {
            items.push(Value::Bytes(digest.0.to_vec()));
        }
        Value::Tag(tags::ENCRYPTED, Box::new(Value::Array(items)))
    }
}

impl FromCbor for EncryptedMessage {
    fn from_cbor(value: &Value) -> veil_core::Result<Self> {
        let items = expect_array(expect_tagged(value, tags::ENCRYPTED)?)?;
        if items.len() < 2 || items.len() > 3 {
            return Err(CoreError::invalid_format(
                "encrypted message must have 2 or 3 elements",
            ));
        }
        let ciphertext = expect_bytes(&items[0])?.to_vec();
        let nonce = Nonce(expect_byte_array::<12>(&items[1])?);
        let aad_digest = match items.get(2) {
            Some(d) => Some(Digest::from_slice(expect_bytes(d)?)?),
            None => None,
        };
        Ok(Self::new(ciphertext, nonce, aad_digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_encrypt_decrypt() {
        let key = SymmetricKey::generate();
        let nonce = Nonce::generate();
        let plaintext = b"hello, world!";

        let ciphertext = key.encrypt(plaintext, b"", &nonce).unwrap();
        assert_ne!(ciphertext, plaintext);

        let decrypted = key.decrypt(&ciphertext, b"", &nonce).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let key1 = SymmetricKey::generate();
        let key2 = SymmetricKey::generate();

        let message = key1.encrypt_message(b"secret", None).unwrap();

        // Wrong key should fail
        assert!(key2.decrypt_message(&message).is_err());
    }

    #[test]
    fn test_digest_is_authenticated() {
        let key = SymmetricKey::generate();
        let digest = Digest::from_image(b"plaintext");
        let message = key.encrypt_with_digest(b"plaintext", digest, None).unwrap();
        assert_eq!(key.decrypt_message(&message).unwrap(), b"plaintext");

        let forged = EncryptedMessage::new(
            message.ciphertext().to_vec(),
            *message.nonce(),
            Some(Digest::from_image(b"other")),
        );
        assert!(matches!(
            key.decrypt_message(&forged),
            Err(CryptoError::Decryption(_))
        ));
    }

    #[test]
    fn test_injected_nonce_is_deterministic() {
        let key = SymmetricKey::from_bytes([7; 32]);
        let nonce = Nonce::from_bytes([1; 12]);
        let digest = Digest::from_image(b"x");
        let a = key.encrypt_with_digest(b"x", digest, Some(nonce)).unwrap();
        let b = key.encrypt_with_digest(b"x", digest, Some(nonce)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_seeded_generation() {
        let mut rng1 = StdRng::seed_from_u64(1);
        let mut rng2 = StdRng::seed_from_u64(1);
        assert_eq!(
            SymmetricKey::generate_using(&mut rng1),
            SymmetricKey::generate_using(&mut rng2)
        );
    }

    #[test]
    fn test_message_cbor_roundtrip() {
        let key = SymmetricKey::generate();
        let with_digest = key
            .encrypt_with_digest(b"data", Digest::from_image(b"data"), None)
            .unwrap();
        let without_digest = key.encrypt_message(b"data", None).unwrap();

        for message in [with_digest, without_digest] {
            let recovered = EncryptedMessage::from_cbor(&message.to_cbor()).unwrap();
            assert_eq!(recovered, message);
        }
    }

    #[test]
    fn test_key_from_slice_checks_length() {
        assert!(SymmetricKey::from_slice(&[0; 31]).is_err());
        assert!(SymmetricKey::from_slice(&[0; 32]).is_ok());
    }
}
