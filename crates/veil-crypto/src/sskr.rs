//! Threshold secret sharing over GF(2^8).
//!
//! A secret of `len` bytes is split byte-wise: each byte is the constant
//! term of a random polynomial of degree `threshold - 1`, and share `i`
//! holds the evaluations at `x = i + 1`. Any `threshold` distinct shares
//! recover the secret by Lagrange interpolation at zero.

use rand::{CryptoRng, RngCore};

use veil_core::cbor::{expect_array, expect_bytes, expect_tagged, expect_u64};
use veil_core::{tags, CoreError, FromCbor, ToCbor, Value};

use crate::error::{CryptoError, Result};

/// Upper bound on the number of shares in a split.
pub const MAX_SHARE_COUNT: usize = 16;

/// Largest secret that can be split.
pub const MAX_SECRET_LEN: usize = 64;

/// How many shares to produce and how many are needed to recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SskrSpec {
    threshold: usize,
    count: usize,
}

impl SskrSpec {
    /// Validates `1 <= threshold <= count <= MAX_SHARE_COUNT`.
    pub fn new(threshold: usize, count: usize) -> Result<Self> {
        if threshold == 0 {
            return Err(CryptoError::InvalidSpec("threshold must be positive".into()));
        }
        if threshold > count {
            return Err(CryptoError::InvalidSpec(format!(
                "threshold {threshold} exceeds share count {count}"
            )));
        }
        if count > MAX_SHARE_COUNT {
            return Err(CryptoError::InvalidSpec(format!(
                "share count {count} exceeds {MAX_SHARE_COUNT}"
            )));
        }
        Ok(Self { threshold, count })
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// One share of a split secret.
///
/// Shares from the same split carry the same random `identifier`, so
/// shares of unrelated splits are never mixed during recovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SskrShare {
    identifier: u16,
    threshold: u8,
    count: u8,
    index: u8,
    value: Vec<u8>,
}

impl SskrShare {
    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn threshold(&self) -> usize {
        self.threshold as usize
    }

    pub fn count(&self) -> usize {
        self.count as usize
    }

    /// Zero-based position of this share in its split.
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

impl ToCbor for SskrShare {
    fn to_cbor(&self) -> Value {
        Value::Tag(
            tags::SSKR_SHARE,
            Box::new(Value::Array(vec![
                Value::Integer(self.identifier.into()),
                Value::Integer(self.threshold.into()),
                Value::Integer(self.count.into()),
                Value::Integer(self.index.into()),
                Value::Bytes(self.value.clone()),
            ])),
        )
    }
}

impl FromCbor for SskrShare {
    fn from_cbor(value: &Value) -> veil_core::Result<Self> {
        let items = expect_array(expect_tagged(value, tags::SSKR_SHARE)?)?;
        let [identifier, threshold, count, index, value] = items else {
            return Err(CoreError::invalid_format("SSKR share must have 5 elements"));
        };
        let small = |v: &Value| -> veil_core::Result<u8> {
            u8::try_from(expect_u64(v)?)
                .map_err(|_| CoreError::invalid_format("SSKR share field out of range"))
        };
        let identifier = u16::try_from(expect_u64(identifier)?)
            .map_err(|_| CoreError::invalid_format("SSKR identifier out of range"))?;
        Ok(Self {
            identifier,
            threshold: small(threshold)?,
            count: small(count)?,
            index: small(index)?,
            value: expect_bytes(value)?.to_vec(),
        })
    }
}

/// Split `secret` into shares per `spec`.
pub fn sskr_generate(spec: &SskrSpec, secret: &[u8]) -> Result<Vec<SskrShare>> {
    sskr_generate_using(spec, secret, &mut rand::thread_rng())
}

/// Split with a caller-supplied random source.
pub fn sskr_generate_using<R: RngCore + CryptoRng>(
    spec: &SskrSpec,
    secret: &[u8],
    rng: &mut R,
) -> Result<Vec<SskrShare>> {
    if secret.is_empty() || secret.len() > MAX_SECRET_LEN {
        return Err(CryptoError::InvalidSpec(format!(
            "secret length {} not in 1..={MAX_SECRET_LEN}",
            secret.len()
        )));
    }

    let identifier = (rng.next_u32() & 0xffff) as u16;
    let mut values = vec![Vec::with_capacity(secret.len()); spec.count];

    let mut coefficients = vec![0u8; spec.threshold];
    for &byte in secret {
        coefficients[0] = byte;
        rng.fill_bytes(&mut coefficients[1..]);
        for (i, value) in values.iter_mut().enumerate() {
            value.push(evaluate(&coefficients, share_x(i)));
        }
    }
    coefficients.iter_mut().for_each(|c| *c = 0);

    Ok(values
        .into_iter()
        .enumerate()
        .map(|(i, value)| SskrShare {
            identifier,
            threshold: spec.threshold as u8,
            count: spec.count as u8,
            index: i as u8,
            value,
        })
        .collect())
}

/// Recover the secret from at least `threshold` shares of one split.
///
/// Duplicate shares are ignored. Shares from different splits, shares that
/// disagree on their parameters, or too few distinct shares fail with
/// [`CryptoError::InvalidShares`].
pub fn sskr_combine(shares: &[SskrShare]) -> Result<Vec<u8>> {
    let first = shares
        .first()
        .ok_or_else(|| CryptoError::InvalidShares("no shares".into()))?;

    let mut distinct: Vec<&SskrShare> = Vec::new();
    for share in shares {
        if share.identifier != first.identifier
            || share.threshold != first.threshold
            || share.count != first.count
        {
            return Err(CryptoError::InvalidShares("shares come from different splits".into()));
        }
        if share.value.len() != first.value.len() || share.index >= share.count {
            return Err(CryptoError::InvalidShares("malformed share".into()));
        }
        match distinct.iter().find(|s| s.index == share.index) {
            Some(existing) if existing.value != share.value => {
                return Err(CryptoError::InvalidShares("conflicting shares".into()));
            }
            Some(_) => {}
            None => distinct.push(share),
        }
    }

    let threshold = first.threshold();
    if threshold == 0 || distinct.len() < threshold {
        return Err(CryptoError::InvalidShares(format!(
            "need {threshold} shares, have {}",
            distinct.len()
        )));
    }
    distinct.truncate(threshold);

    let xs: Vec<u8> = distinct.iter().map(|s| share_x(s.index())).collect();
    let basis: Vec<u8> = (0..xs.len()).map(|i| lagrange_at_zero(&xs, i)).collect();

    let secret = (0..first.value.len())
        .map(|byte| {
            distinct
                .iter()
                .zip(&basis)
                .fold(0u8, |acc, (share, &l)| acc ^ gf_mul(share.value[byte], l))
        })
        .collect();
    Ok(secret)
}

fn share_x(index: usize) -> u8 {
    (index + 1) as u8
}

/// Horner evaluation of `coefficients[0] + coefficients[1]*x + ...`.
fn evaluate(coefficients: &[u8], x: u8) -> u8 {
    coefficients
        .iter()
        .rev()
        .fold(0u8, |acc, &c| gf_mul(acc, x) ^ c)
}

/// L_i(0) = prod_{j != i} x_j / (x_i - x_j). Subtraction is XOR in GF(2^8).
fn lagrange_at_zero(xs: &[u8], i: usize) -> u8 {
    xs.iter()
        .enumerate()
        .filter(|&(j, _)| j != i)
        .fold(1u8, |acc, (_, &xj)| gf_mul(acc, gf_mul(xj, gf_inv(xs[i] ^ xj))))
}

/// Multiplication modulo the AES polynomial x^8 + x^4 + x^3 + x + 1.
fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80;
        a <<= 1;
        if carry != 0 {
            a ^= 0x1b;
        }
        b >>= 1;
    }
    product
}

/// Multiplicative inverse as a^254. Zero maps to zero.
fn gf_inv(a: u8) -> u8 {
    let mut result = 1u8;
    let mut base = a;
    let mut exp = 254u8;
    while exp > 0 {
        if exp & 1 != 0 {
            result = gf_mul(result, base);
        }
        base = gf_mul(base, base);
        exp >>= 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_field_inverse() {
        for a in 1..=255u8 {
            assert_eq!(gf_mul(a, gf_inv(a)), 1, "inverse of {a}");
        }
    }

    #[test]
    fn test_spec_bounds() {
        assert!(SskrSpec::new(0, 3).is_err());
        assert!(SskrSpec::new(4, 3).is_err());
        assert!(SskrSpec::new(2, 17).is_err());
        assert!(SskrSpec::new(1, 1).is_ok());
        assert!(SskrSpec::new(16, 16).is_ok());
    }

    #[test]
    fn test_two_of_three_any_pair() {
        let secret = [0x5au8; 32];
        let spec = SskrSpec::new(2, 3).unwrap();
        let shares = sskr_generate_using(&spec, &secret, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(shares.len(), 3);

        for (a, b) in [(0, 1), (0, 2), (1, 2), (2, 0)] {
            let pair = [shares[a].clone(), shares[b].clone()];
            assert_eq!(sskr_combine(&pair).unwrap(), secret);
        }
    }

    #[test]
    fn test_below_threshold_fails() {
        let spec = SskrSpec::new(2, 3).unwrap();
        let shares = sskr_generate(&spec, b"0123456789abcdef").unwrap();

        assert!(matches!(
            sskr_combine(&shares[..1]),
            Err(CryptoError::InvalidShares(_))
        ));
        // A repeated share does not count twice.
        let dup = [shares[0].clone(), shares[0].clone()];
        assert!(matches!(sskr_combine(&dup), Err(CryptoError::InvalidShares(_))));
        assert!(matches!(sskr_combine(&[]), Err(CryptoError::InvalidShares(_))));
    }

    #[test]
    fn test_mixed_splits_rejected() {
        let spec = SskrSpec::new(2, 2).unwrap();
        let a = sskr_generate_using(&spec, b"secret-a", &mut StdRng::seed_from_u64(1)).unwrap();
        let mut b = sskr_generate_using(&spec, b"secret-b", &mut StdRng::seed_from_u64(2)).unwrap();
        b[1].identifier = a[0].identifier.wrapping_add(1);
        assert!(sskr_combine(&[a[0].clone(), b[1].clone()]).is_err());
    }

    #[test]
    fn test_one_of_one_is_the_secret() {
        let spec = SskrSpec::new(1, 1).unwrap();
        let shares = sskr_generate(&spec, b"plain").unwrap();
        assert_eq!(shares[0].value(), b"plain");
        assert_eq!(sskr_combine(&shares).unwrap(), b"plain");
    }

    #[test]
    fn test_share_cbor() {
        let spec = SskrSpec::new(2, 3).unwrap();
        let shares = sskr_generate(&spec, &[1, 2, 3, 4]).unwrap();
        let decoded = SskrShare::from_cbor(&shares[2].to_cbor()).unwrap();
        assert_eq!(decoded, shares[2]);
    }

    proptest! {
        #[test]
        fn test_threshold_subset_recovers(
            secret in proptest::collection::vec(any::<u8>(), 1..=MAX_SECRET_LEN),
            threshold in 1usize..=5,
            extra in 0usize..=3,
            seed in any::<u64>(),
        ) {
            let spec = SskrSpec::new(threshold, threshold + extra).unwrap();
            let shares = sskr_generate_using(&spec, &secret, &mut StdRng::seed_from_u64(seed)).unwrap();
            let tail = &shares[extra..];
            prop_assert_eq!(sskr_combine(tail).unwrap(), secret);
        }
    }
}
