//! Random salt, used to decorrelate otherwise identical elements.

use std::fmt;

use rand::{CryptoRng, Rng, RngCore};

use veil_core::cbor::{expect_bytes, expect_tagged};
use veil_core::{tags, FromCbor, ToCbor, Value};

use crate::envelope::Envelope;
use crate::error::{EnvelopeError, Result};
use crate::known_values;

/// Shortest salt accepted.
pub const MIN_SALT_LEN: usize = 8;

/// Random bytes with no meaning of their own.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Salt(Vec<u8>);

impl Salt {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A salt of exactly `len` bytes.
    pub fn new_with_len(len: usize) -> Result<Self> {
        Self::new_with_len_using(len, &mut rand::thread_rng())
    }

    pub fn new_with_len_using<R: RngCore + CryptoRng>(len: usize, rng: &mut R) -> Result<Self> {
        if len < MIN_SALT_LEN {
            return Err(EnvelopeError::InvalidFormat(format!(
                "salt must be at least {MIN_SALT_LEN} bytes, got {len}"
            )));
        }
        let mut bytes = vec![0u8; len];
        rng.fill_bytes(&mut bytes);
        Ok(Self(bytes))
    }

    /// A salt sized for data of `size` bytes: between 5% and 25% of it,
    /// never shorter than [`MIN_SALT_LEN`].
    pub fn new_for_size(size: usize) -> Self {
        Self::new_for_size_using(size, &mut rand::thread_rng())
    }

    pub fn new_for_size_using<R: RngCore + CryptoRng>(size: usize, rng: &mut R) -> Self {
        let min = MIN_SALT_LEN.max(size.div_ceil(20));
        let max = (min + 8).max(size.div_ceil(4));
        let len = rng.gen_range(min..=max);
        let mut bytes = vec![0u8; len];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", self.0.len())
    }
}

impl ToCbor for Salt {
    fn to_cbor(&self) -> Value {
        Value::Tag(tags::SALT, Box::new(Value::Bytes(self.0.clone())))
    }
}

impl FromCbor for Salt {
    fn from_cbor(value: &Value) -> veil_core::Result<Self> {
        let bytes = expect_bytes(expect_tagged(value, tags::SALT)?)?;
        Ok(Self(bytes.to_vec()))
    }
}

impl Envelope {
    /// Add a `'salt'` assertion sized in proportion to this envelope.
    pub fn add_salt(&self) -> Self {
        self.add_salt_using(&mut rand::thread_rng())
    }

    pub fn add_salt_using<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Self {
        let salt = Salt::new_for_size_using(self.to_cbor_data().len(), rng);
        self.add_salt_instance(salt)
    }

    /// Add a `'salt'` assertion of exactly `len` bytes.
    pub fn add_salt_with_len(&self, len: usize) -> Result<Self> {
        self.add_salt_with_len_using(len, &mut rand::thread_rng())
    }

    pub fn add_salt_with_len_using<R: RngCore + CryptoRng>(
        &self,
        len: usize,
        rng: &mut R,
    ) -> Result<Self> {
        Ok(self.add_salt_instance(Salt::new_with_len_using(len, rng)?))
    }

    pub fn add_salt_instance(&self, salt: Salt) -> Self {
        self.add_assertion(known_values::SALT, salt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_salt_len_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for size in [0, 10, 100, 1000, 10_000] {
            let salt = Salt::new_for_size_using(size, &mut rng);
            let min = MIN_SALT_LEN.max(size.div_ceil(20));
            assert!(salt.len() >= min, "size {size}: {}", salt.len());
            assert!(salt.len() <= (min + 8).max(size.div_ceil(4)));
        }
        assert!(Salt::new_with_len(7).is_err());
        assert_eq!(Salt::new_with_len(16).unwrap().len(), 16);
    }

    #[test]
    fn test_salt_changes_digest() {
        let envelope = Envelope::new("Hello.");
        let a = envelope.add_salt();
        let b = envelope.add_salt();
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.subject(), envelope);
        let salt: Salt = a
            .extract_object_for_predicate(known_values::SALT)
            .unwrap();
        assert!(salt.len() >= MIN_SALT_LEN);
    }

    #[test]
    fn test_seeded_salt_is_reproducible() {
        let envelope = Envelope::new("Hello.");
        let a = envelope.add_salt_using(&mut StdRng::seed_from_u64(9));
        let b = envelope.add_salt_using(&mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_salt_cbor() {
        let salt = Salt::from_bytes(vec![7; 8]);
        assert_eq!(Salt::from_cbor(&salt.to_cbor()).unwrap(), salt);
        assert!(Salt::from_cbor(&Value::Bytes(vec![7; 8])).is_err());
    }
}
