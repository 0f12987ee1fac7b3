//! Threshold sharing of an encrypted envelope.
//!
//! The subject is encrypted under a content key, the key is split with
//! SSKR, and one copy of the encrypted envelope is produced per share,
//! each carrying its share as `'sskrShare': SskrShare`.

use std::collections::BTreeMap;

use rand::{CryptoRng, RngCore};

use veil_crypto::{sskr_combine, sskr_generate_using, SskrShare, SskrSpec, SymmetricKey};

use crate::envelope::Envelope;
use crate::error::{EnvelopeError, Result};
use crate::known_values;

impl Envelope {
    /// Encrypt the subject under `content_key` and produce one envelope per
    /// share of that key.
    pub fn sskr_split(&self, spec: &SskrSpec, content_key: &SymmetricKey) -> Result<Vec<Envelope>> {
        self.sskr_split_using(spec, content_key, &mut rand::thread_rng())
    }

    pub fn sskr_split_using<R: RngCore + CryptoRng>(
        &self,
        spec: &SskrSpec,
        content_key: &SymmetricKey,
        rng: &mut R,
    ) -> Result<Vec<Envelope>> {
        let encrypted = self.encrypt_subject_using(content_key, rng)?;
        let shares = sskr_generate_using(spec, content_key.as_bytes(), rng)?;
        tracing::debug!(
            threshold = spec.threshold(),
            count = spec.count(),
            "split content key"
        );
        Ok(shares
            .into_iter()
            .map(|share| encrypted.add_assertion(known_values::SSKR_SHARE, share))
            .collect())
    }

    /// Recover the original subject from share envelopes.
    ///
    /// Shares are grouped by split identifier; the first group that yields
    /// a key able to decrypt its envelope wins.
    pub fn sskr_join(envelopes: &[Envelope]) -> Result<Envelope> {
        let mut groups: BTreeMap<u16, (Vec<SskrShare>, &Envelope)> = BTreeMap::new();
        for envelope in envelopes {
            let shares = envelope
                .objects_for_predicate(known_values::SSKR_SHARE)
                .iter()
                .filter_map(|object| object.extract_subject::<SskrShare>().ok())
                .collect::<Vec<_>>();
            for share in shares {
                groups
                    .entry(share.identifier())
                    .or_insert_with(|| (Vec::new(), envelope))
                    .0
                    .push(share);
            }
        }

        for (identifier, (shares, envelope)) in &groups {
            let Ok(secret) = sskr_combine(shares) else {
                tracing::debug!(identifier, shares = shares.len(), "share group did not combine");
                continue;
            };
            let Ok(content_key) = SymmetricKey::from_slice(&secret) else {
                continue;
            };
            match envelope.decrypt_subject(&content_key) {
                Ok(decrypted) => return Ok(decrypted.subject()),
                Err(err) => {
                    tracing::warn!(identifier, %err, "recovered key does not decrypt");
                }
            }
        }
        Err(EnvelopeError::InvalidShares)
    }
}
