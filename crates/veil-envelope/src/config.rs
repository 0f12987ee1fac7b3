//! Decoder configuration.

use veil_core::DecodeLimits;

/// Limits applied when decoding envelopes from untrusted bytes.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Maximum nesting depth of the CBOR item tree.
    pub max_depth: usize,
    /// Maximum accepted input size in bytes.
    pub max_input_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        let limits = DecodeLimits::default();
        Self {
            max_depth: limits.max_depth,
            max_input_len: limits.max_input_len,
        }
    }
}

impl From<&CodecConfig> for DecodeLimits {
    fn from(config: &CodecConfig) -> Self {
        DecodeLimits {
            max_depth: config.max_depth,
            max_input_len: config.max_input_len,
        }
    }
}
