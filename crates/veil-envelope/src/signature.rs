//! Ed25519 signatures over an envelope's subject.
//!
//! A signature signs the subject digest and is attached as a
//! `'verifiedBy': Signature` assertion. Because only the subject is
//! covered, signing a whole envelope means wrapping it first; see
//! [`Envelope::sign`].

use veil_crypto::{Keypair, PublicKey, Signature};

use crate::envelope::Envelope;
use crate::error::{EnvelopeError, Result};
use crate::known_values;

impl Envelope {
    /// Sign the subject and attach the signature.
    pub fn add_signature(&self, signer: &Keypair) -> Self {
        let signature = signer.sign(self.subject().digest().as_bytes());
        self.add_assertion(known_values::VERIFIED_BY, signature)
    }

    pub fn add_signatures(&self, signers: &[&Keypair]) -> Self {
        signers
            .iter()
            .fold(self.clone(), |envelope, signer| envelope.add_signature(signer))
    }

    /// Wrap, then sign, so the signature covers the assertions too.
    pub fn sign(&self, signer: &Keypair) -> Self {
        self.wrap().add_signature(signer)
    }

    /// Signatures attached to this envelope. Obscured or malformed
    /// `'verifiedBy'` objects are skipped.
    pub fn signatures(&self) -> Vec<Signature> {
        self.objects_for_predicate(known_values::VERIFIED_BY)
            .iter()
            .filter_map(|object| object.extract_subject::<Signature>().ok())
            .collect()
    }

    /// Whether a valid signature by `key` is attached.
    pub fn has_signature_from(&self, key: &PublicKey) -> bool {
        let message = self.subject().digest();
        self.signatures()
            .iter()
            .any(|signature| key.verify(message.as_bytes(), signature).is_ok())
    }

    pub fn verify_signature_from(&self, key: &PublicKey) -> Result<Self> {
        if self.has_signature_from(key) {
            Ok(self.clone())
        } else {
            tracing::warn!(key = %key.to_hex(), "no valid signature from key");
            Err(EnvelopeError::UnverifiedSignature)
        }
    }

    /// Require a valid signature from every key.
    pub fn verify_signatures_from(&self, keys: &[&PublicKey]) -> Result<Self> {
        self.verify_signatures_from_threshold(keys, None)
    }

    /// Require valid signatures from at least `threshold` of `keys`
    /// (all of them when `None`).
    pub fn verify_signatures_from_threshold(
        &self,
        keys: &[&PublicKey],
        threshold: Option<usize>,
    ) -> Result<Self> {
        let threshold = threshold.unwrap_or(keys.len());
        let verified = keys
            .iter()
            .filter(|key| self.has_signature_from(key))
            .count();
        if verified >= threshold {
            Ok(self.clone())
        } else {
            tracing::warn!(verified, threshold, "signature threshold not met");
            Err(EnvelopeError::UnverifiedSignature)
        }
    }

    /// Inverse of [`Envelope::sign`]: check the signature, then unwrap.
    pub fn verify(&self, key: &PublicKey) -> Result<Self> {
        self.verify_signature_from(key)?.unwrap_envelope()
    }
}
