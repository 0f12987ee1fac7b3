//! Public-key encryption to one or more recipients.
//!
//! The subject is encrypted under a fresh content key; the content key is
//! sealed to each recipient and attached as `'hasRecipient': SealedMessage`.

use rand::{CryptoRng, RngCore};

use veil_crypto::{SealedMessage, SymmetricKey, X25519PublicKey, X25519StaticSecret};

use crate::envelope::Envelope;
use crate::error::{EnvelopeError, Result};
use crate::known_values;

impl Envelope {
    /// Seal `content_key` to `recipient` and attach it.
    pub fn add_recipient(&self, recipient: &X25519PublicKey, content_key: &SymmetricKey) -> Result<Self> {
        self.add_recipient_using(recipient, content_key, &mut rand::thread_rng())
    }

    pub fn add_recipient_using<R: RngCore + CryptoRng>(
        &self,
        recipient: &X25519PublicKey,
        content_key: &SymmetricKey,
        rng: &mut R,
    ) -> Result<Self> {
        let sealed = SealedMessage::seal_using(content_key.as_bytes(), recipient, rng)?;
        Ok(self.add_assertion(known_values::HAS_RECIPIENT, sealed))
    }

    /// Sealed content keys attached to this envelope.
    pub fn recipients(&self) -> Vec<SealedMessage> {
        self.objects_for_predicate(known_values::HAS_RECIPIENT)
            .iter()
            .filter_map(|object| object.extract_subject::<SealedMessage>().ok())
            .collect()
    }

    /// Encrypt the subject under a fresh key sealed to every recipient.
    pub fn encrypt_subject_to_recipients(&self, recipients: &[&X25519PublicKey]) -> Result<Self> {
        self.encrypt_subject_to_recipients_using(recipients, &mut rand::thread_rng())
    }

    pub fn encrypt_subject_to_recipients_using<R: RngCore + CryptoRng>(
        &self,
        recipients: &[&X25519PublicKey],
        rng: &mut R,
    ) -> Result<Self> {
        let content_key = SymmetricKey::generate_using(rng);
        let encrypted = self.encrypt_subject_using(&content_key, rng)?;
        recipients.iter().try_fold(encrypted, |envelope, recipient| {
            envelope.add_recipient_using(recipient, &content_key, rng)
        })
    }

    pub fn encrypt_subject_to_recipient(&self, recipient: &X25519PublicKey) -> Result<Self> {
        self.encrypt_subject_to_recipients(&[recipient])
    }

    /// Find a sealed key that opens with `secret` and decrypt the subject.
    pub fn decrypt_subject_to_recipient(&self, secret: &X25519StaticSecret) -> Result<Self> {
        let content_key = self
            .recipients()
            .iter()
            .find_map(|sealed| sealed.open(secret).ok())
            .and_then(|bytes| SymmetricKey::from_slice(&bytes).ok());
        let Some(content_key) = content_key else {
            tracing::warn!("no sealed content key opens for this recipient");
            return Err(EnvelopeError::InvalidRecipient);
        };
        self.decrypt_subject(&content_key)
    }

    /// Wrap, then encrypt to one recipient so the assertions are hidden too.
    pub fn encrypt_to_recipient(&self, recipient: &X25519PublicKey) -> Result<Self> {
        self.wrap().encrypt_subject_to_recipient(recipient)
    }

    pub fn decrypt_to_recipient(&self, secret: &X25519StaticSecret) -> Result<Self> {
        self.decrypt_subject_to_recipient(secret)?.unwrap_envelope()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_each_recipient_can_decrypt() {
        let mut rng = StdRng::seed_from_u64(11);
        let bob = X25519StaticSecret::generate_using(&mut rng);
        let carol = X25519StaticSecret::generate_using(&mut rng);
        let envelope = Envelope::new("Meet at noon.");

        let encrypted = envelope
            .encrypt_subject_to_recipients_using(&[&bob.public_key(), &carol.public_key()], &mut rng)
            .unwrap();
        assert!(encrypted.is_subject_encrypted());
        assert_eq!(encrypted.recipients().len(), 2);

        for secret in [&bob, &carol] {
            let decrypted = encrypted.decrypt_subject_to_recipient(secret).unwrap();
            assert_eq!(decrypted.subject(), envelope);
        }
    }

    #[test]
    fn test_outsider_is_rejected() {
        let bob = X25519StaticSecret::generate();
        let eve = X25519StaticSecret::generate();
        let encrypted = Envelope::new("Meet at noon.")
            .encrypt_subject_to_recipient(&bob.public_key())
            .unwrap();
        assert!(matches!(
            encrypted.decrypt_subject_to_recipient(&eve),
            Err(EnvelopeError::InvalidRecipient)
        ));
    }

    #[test]
    fn test_whole_envelope_to_recipient() {
        let bob = X25519StaticSecret::generate();
        let envelope = Envelope::new("Alice").add_assertion("knows", "Bob");
        let encrypted = envelope.encrypt_to_recipient(&bob.public_key()).unwrap();
        assert!(encrypted.assertions_with_predicate("knows").is_empty());
        assert_eq!(encrypted.decrypt_to_recipient(&bob).unwrap(), envelope);
    }
}
