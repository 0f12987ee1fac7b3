//! One configuration for the operations that take options.

use veil_core::CompressionConfig;
use veil_diff::DiffConfig;
use veil_envelope::{CodecConfig, Envelope};

use crate::error::Result;

/// Decoder limits, compression level and diff options together.
#[derive(Debug, Clone, Default)]
pub struct VeilConfig {
    pub codec: CodecConfig,
    pub compression: CompressionConfig,
    pub diff: DiffConfig,
}

impl VeilConfig {
    /// Decode untrusted wire bytes under the configured limits.
    pub fn decode(&self, data: &[u8]) -> Result<Envelope> {
        let envelope = Envelope::from_cbor_data_with(data, &self.codec)?;
        tracing::debug!(
            bytes = data.len(),
            digest = %envelope.digest().short_description(),
            "decoded envelope"
        );
        Ok(envelope)
    }

    pub fn compress(&self, envelope: &Envelope) -> Result<Envelope> {
        Ok(envelope.compress_with(&self.compression)?)
    }

    /// Decompress under the configured decoder limits.
    pub fn decompress(&self, envelope: &Envelope) -> Result<Envelope> {
        Ok(envelope.decompress_with(&self.codec)?)
    }

    pub fn diff(&self, source: &Envelope, target: &Envelope) -> Result<Envelope> {
        Ok(veil_diff::diff_with(source, target, &self.diff)?)
    }

    pub fn transform(&self, source: &Envelope, diff: &Envelope) -> Result<Envelope> {
        Ok(veil_diff::transform(source, diff)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VeilError;
    use veil_envelope::EnvelopeError;

    #[test]
    fn test_decode_respects_limits() {
        let envelope = Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .wrap()
            .wrap();
        let data = envelope.to_cbor_data();

        let config = VeilConfig::default();
        assert_eq!(config.decode(&data).unwrap(), envelope);

        let tight = VeilConfig {
            codec: CodecConfig {
                max_depth: 2,
                ..CodecConfig::default()
            },
            ..VeilConfig::default()
        };
        assert!(tight.decode(&data).is_err());

        let short = VeilConfig {
            codec: CodecConfig {
                max_input_len: 4,
                ..CodecConfig::default()
            },
            ..VeilConfig::default()
        };
        assert!(short.decode(&data).is_err());
    }

    #[test]
    fn test_compress_and_diff() {
        let config = VeilConfig {
            compression: CompressionConfig { level: 19 },
            diff: DiffConfig { verify: true },
            ..VeilConfig::default()
        };
        let a = Envelope::new("Alice").add_assertion("note", "x".repeat(200));
        let compressed = config.compress(&a).unwrap();
        assert!(compressed.is_compressed());
        assert_eq!(compressed.digest(), a.digest());
        assert_eq!(config.decompress(&compressed).unwrap(), a);

        let small = VeilConfig {
            codec: CodecConfig {
                max_input_len: 64,
                ..CodecConfig::default()
            },
            ..VeilConfig::default()
        };
        assert!(matches!(
            small.decompress(&compressed),
            Err(VeilError::Envelope(EnvelopeError::Core(_)))
        ));

        let b = a.add_assertion("knows", "Bob");
        let d = config.diff(&a, &b).unwrap();
        assert_eq!(config.transform(&a, &d).unwrap(), b);

        let err = config.compress(&a.elide()).unwrap_err();
        assert!(matches!(
            err,
            VeilError::Envelope(EnvelopeError::AlreadyElided)
        ));
    }
}
