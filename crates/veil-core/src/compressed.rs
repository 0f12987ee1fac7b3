//! Zstd-compressed payloads that remember the digest of what they hold.
//!
//! The digest always refers to the *uncompressed* bytes' envelope, so a
//! compressed element can stand in for the original without changing any
//! digest above it.

use ciborium::value::Value;

use crate::canonical::DecodeLimits;
use crate::cbor::{expect_array, expect_bytes, expect_tagged, expect_u64, FromCbor, ToCbor};
use crate::digest::Digest;
use crate::error::{CoreError, Result};
use crate::tags;

/// Configuration for compression.
#[derive(Debug, Clone)]
pub struct CompressionConfig {
    /// Compression level (1-22, default 3)
    /// 1-3 = fast, 10-15 = balanced, 19-22 = max compression
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self { level: 3 }
    }
}

/// Compressed data plus the size and digest of the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed {
    compressed_data: Vec<u8>,
    decompressed_size: usize,
    digest: Option<Digest>,
}

impl Compressed {
    /// Assemble from parts already produced elsewhere (e.g. decoded from CBOR).
    pub fn new(compressed_data: Vec<u8>, decompressed_size: usize, digest: Option<Digest>) -> Self {
        Self {
            compressed_data,
            decompressed_size,
            digest,
        }
    }

    /// Compress `data`, recording `digest` as the digest it stands for.
    pub fn from_decompressed_data(
        data: &[u8],
        digest: Option<Digest>,
        config: &CompressionConfig,
    ) -> Result<Self> {
        let compressed_data = zstd::encode_all(data, config.level)
            .map_err(|e| CoreError::Compression(e.to_string()))?;
        tracing::debug!(
            original = data.len(),
            compressed = compressed_data.len(),
            "compressed payload"
        );
        Ok(Self {
            compressed_data,
            decompressed_size: data.len(),
            digest,
        })
    }

    /// Decompress under the default input limit.
    pub fn decompress(&self) -> Result<Vec<u8>> {
        self.decompress_with_limit(DecodeLimits::default().max_input_len)
    }

    /// Decompress, refusing a recorded size above `max_len` and never
    /// inflating past the recorded size.
    pub fn decompress_with_limit(&self, max_len: usize) -> Result<Vec<u8>> {
        if self.decompressed_size > max_len {
            return Err(CoreError::InputTooLarge {
                len: self.decompressed_size,
                limit: max_len,
            });
        }
        let data = zstd::bulk::decompress(&self.compressed_data, self.decompressed_size)
            .map_err(|e| CoreError::Decompression(e.to_string()))?;
        if data.len() != self.decompressed_size {
            return Err(CoreError::Decompression(format!(
                "expected {} bytes, got {}",
                self.decompressed_size,
                data.len()
            )));
        }
        Ok(data)
    }

    /// The compressed bytes.
    pub fn compressed_data(&self) -> &[u8] {
        &self.compressed_data
    }

    /// Size of the original data.
    pub fn decompressed_size(&self) -> usize {
        self.decompressed_size
    }

    /// Digest of the original, if recorded.
    pub fn digest_ref_opt(&self) -> Option<&Digest> {
        self.digest.as_ref()
    }

    /// Compressed size divided by original size.
    pub fn compression_ratio(&self) -> f64 {
        if self.decompressed_size == 0 {
            return 1.0;
        }
        self.compressed_data.len() as f64 / self.decompressed_size as f64
    }
}

impl ToCbor for Compressed {
    fn to_cbor(&self) -> Value {
        let mut items = vec![
            Value::Bytes(self.compressed_data.clone()),
            Value::Integer((self.decompressed_size as u64).into()),
        ];
        if let Some(digest) = &self.digest {
            items.push(Value::Bytes(digest.0.to_vec()));
        }
        Value::Tag(tags::COMPRESSED, Box::new(Value::Array(items)))
    }
}

impl FromCbor for Compressed {
    fn from_cbor(value: &Value) -> Result<Self> {
        let items = expect_array(expect_tagged(value, tags::COMPRESSED)?)?;
        if items.len() < 2 || items.len() > 3 {
            return Err(CoreError::invalid_format("compressed must have 2 or 3 elements"));
        }
        let compressed_data = expect_bytes(&items[0])?.to_vec();
        let decompressed_size = usize::try_from(expect_u64(&items[1])?)
            .map_err(|_| CoreError::invalid_format("decompressed size out of range"))?;
        let digest = match items.get(2) {
            Some(d) => Some(Digest::from_slice(expect_bytes(d)?)?),
            None => None,
        };
        Ok(Self::new(compressed_data, decompressed_size, digest))
    }
}
