//! Subject encryption.
//!
//! Only the subject is encrypted; assertions stay readable. To hide the
//! assertions too, wrap first so the whole node becomes the subject.

use rand::{CryptoRng, RngCore};

use veil_crypto::{Nonce, SymmetricKey};

use crate::envelope::{Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, Result};

impl Envelope {
    /// Encrypt the subject under `key` with a fresh random nonce.
    pub fn encrypt_subject(&self, key: &SymmetricKey) -> Result<Self> {
        self.encrypt_subject_opt(key, None)
    }

    /// Encrypt the subject with an explicit nonce.
    pub fn encrypt_subject_with_nonce(&self, key: &SymmetricKey, nonce: Nonce) -> Result<Self> {
        self.encrypt_subject_opt(key, Some(nonce))
    }

    /// Encrypt the subject, drawing the nonce from `rng`.
    pub fn encrypt_subject_using<R: RngCore + CryptoRng>(
        &self,
        key: &SymmetricKey,
        rng: &mut R,
    ) -> Result<Self> {
        self.encrypt_subject_opt(key, Some(Nonce::generate_using(rng)))
    }

    fn encrypt_subject_opt(&self, key: &SymmetricKey, nonce: Option<Nonce>) -> Result<Self> {
        let subject = self.subject();
        match subject.case() {
            EnvelopeCase::Encrypted { .. } => return Err(EnvelopeError::AlreadyEncrypted),
            EnvelopeCase::Elided(_) => return Err(EnvelopeError::AlreadyElided),
            _ => {}
        }
        let encrypted = subject.encrypt_element(key, nonce)?;
        Ok(self.with_subject(encrypted))
    }

    /// Encrypt this whole element. The plaintext is its untagged encoding
    /// and its digest is authenticated alongside.
    pub(crate) fn encrypt_element(&self, key: &SymmetricKey, nonce: Option<Nonce>) -> Result<Self> {
        let digest = self.digest();
        let message = key.encrypt_with_digest(&self.to_untagged_cbor_data(), digest, nonce)?;
        tracing::debug!(digest = %digest.short_description(), "encrypted element");
        Ok(Envelope::new_encrypted_unchecked(message, digest))
    }

    /// Decrypt an encrypted subject.
    pub fn decrypt_subject(&self, key: &SymmetricKey) -> Result<Self> {
        let subject = self.subject();
        let EnvelopeCase::Encrypted { message, .. } = subject.case() else {
            return Err(EnvelopeError::NotEncrypted);
        };
        let expected = message.aad_digest().ok_or(EnvelopeError::MissingDigest)?;

        let plaintext = key.decrypt_message(message).map_err(|_| {
            tracing::debug!(digest = %expected.short_description(), "decryption failed");
            EnvelopeError::InvalidKey
        })?;
        let decrypted = Envelope::from_untagged_cbor_data(&plaintext)?;
        if decrypted.digest() != expected {
            tracing::warn!(
                expected = %expected.short_description(),
                actual = %decrypted.digest().short_description(),
                "decrypted subject digest mismatch"
            );
            return Err(EnvelopeError::InvalidDigest);
        }
        Ok(self.with_subject(decrypted))
    }

    /// Wrap, then encrypt the wrapped envelope, hiding assertions as well.
    pub fn encrypt(&self, key: &SymmetricKey) -> Result<Self> {
        self.wrap().encrypt_subject(key)
    }

    /// Inverse of [`Envelope::encrypt`].
    pub fn decrypt(&self, key: &SymmetricKey) -> Result<Self> {
        self.decrypt_subject(key)?.unwrap_envelope()
    }

    /// Box this envelope.
    pub fn wrap(&self) -> Self {
        Envelope::new_wrapped(self.clone())
    }

    /// Unbox a wrapped subject.
    pub fn unwrap_envelope(&self) -> Result<Self> {
        self.as_wrapped().ok_or(EnvelopeError::NotWrapped)
    }

    /// Same assertions, different subject, without re-sorting work for
    /// bare envelopes. The replacement must have the same digest for the
    /// node digest to stay valid.
    pub(crate) fn with_subject(&self, subject: Envelope) -> Self {
        match self.case() {
            EnvelopeCase::Node { assertions, .. } => {
                Envelope::new_with_unchecked_assertions(subject, assertions.clone())
            }
            _ => subject,
        }
    }
}
