//! Compression as an obscuring state.
//!
//! A compressed element keeps the digest of what it holds, so it can sit
//! anywhere in a tree without disturbing the digests above it.

use veil_core::{Compressed, CompressionConfig};

use crate::config::CodecConfig;
use crate::envelope::{Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, Result};

impl Envelope {
    /// Compress this whole element with the default level.
    pub fn compress(&self) -> Result<Self> {
        self.compress_with(&CompressionConfig::default())
    }

    pub fn compress_with(&self, config: &CompressionConfig) -> Result<Self> {
        match self.case() {
            EnvelopeCase::Compressed { .. } => Ok(self.clone()),
            EnvelopeCase::Encrypted { .. } => Err(EnvelopeError::AlreadyEncrypted),
            EnvelopeCase::Elided(_) => Err(EnvelopeError::AlreadyElided),
            _ => {
                let digest = self.digest();
                let compressed = Compressed::from_decompressed_data(
                    &self.to_untagged_cbor_data(),
                    Some(digest),
                    config,
                )?;
                Ok(Envelope::new_compressed_unchecked(compressed, digest))
            }
        }
    }

    /// Restore a compressed element.
    pub fn decompress(&self) -> Result<Self> {
        self.decompress_with(&CodecConfig::default())
    }

    /// Restore a compressed element, holding both the inflated size and the
    /// decoded payload to `config`.
    pub fn decompress_with(&self, config: &CodecConfig) -> Result<Self> {
        let EnvelopeCase::Compressed { compressed, digest } = self.case() else {
            return Err(EnvelopeError::NotCompressed);
        };
        let data = compressed.decompress_with_limit(config.max_input_len)?;
        let envelope = Envelope::from_untagged_cbor_data_with(&data, config)?;
        if envelope.digest() != *digest {
            tracing::warn!(
                expected = %digest.short_description(),
                actual = %envelope.digest().short_description(),
                "decompressed digest mismatch"
            );
            return Err(EnvelopeError::InvalidDigest);
        }
        Ok(envelope)
    }

    /// Compress only the subject, leaving assertions readable.
    pub fn compress_subject(&self) -> Result<Self> {
        let subject = self.subject();
        if subject.is_compressed() {
            return Ok(self.clone());
        }
        Ok(self.with_subject(subject.compress()?))
    }

    pub fn decompress_subject(&self) -> Result<Self> {
        self.decompress_subject_with(&CodecConfig::default())
    }

    pub fn decompress_subject_with(&self, config: &CodecConfig) -> Result<Self> {
        let subject = self.subject();
        if !subject.is_compressed() {
            return Err(EnvelopeError::NotCompressed);
        }
        Ok(self.with_subject(subject.decompress_with(config)?))
    }
}
