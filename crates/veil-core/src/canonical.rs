//! Deterministic CBOR.
//!
//! Every digest in the crate family is taken over bytes produced here, so
//! one value must always serialize to one byte string. The rules follow
//! RFC 8949 section 4.2:
//!
//! - argument heads use the fewest bytes that hold the value
//! - only definite-length items are produced
//! - map entries are ordered by the bytewise order of their encoded keys
//! - floats holding an integer become that integer, other floats take the
//!   narrowest exact width, and every NaN is `f97e00`
//!
//! Decoding is strict. Input is accepted only when encoding the parsed value
//! reproduces it byte for byte.

use ciborium::value::Value;

use crate::error::{CoreError, Result};

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;
const MAJOR_TAG: u8 = 6;

const FALSE: u8 = 0xf4;
const TRUE: u8 = 0xf5;
const NULL: u8 = 0xf6;
const UNDEFINED: u8 = 0xf7;
const CANONICAL_NAN: [u8; 3] = [0xf9, 0x7e, 0x00];

/// Bounds applied while decoding untrusted bytes.
#[derive(Debug, Clone, Copy)]
pub struct DecodeLimits {
    /// Deepest allowed nesting of arrays, maps and tags.
    pub max_depth: usize,
    /// Longest accepted input.
    pub max_input_len: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_input_len: 16 * 1024 * 1024,
        }
    }
}

/// Serialize `value` deterministically.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    write_item(&mut out, value);
    out
}

/// [`decode_with_limits`] under [`DecodeLimits::default`].
pub fn decode(bytes: &[u8]) -> Result<Value> {
    decode_with_limits(bytes, &DecodeLimits::default())
}

/// Parse `bytes`, accepting only the deterministic encoding of a single item.
pub fn decode_with_limits(bytes: &[u8], limits: &DecodeLimits) -> Result<Value> {
    if bytes.len() > limits.max_input_len {
        return Err(CoreError::InputTooLarge {
            len: bytes.len(),
            limit: limits.max_input_len,
        });
    }

    let parsed: Value =
        ciborium::de::from_reader(bytes).map_err(|e| CoreError::Decoding(e.to_string()))?;
    validate(&parsed, 0, limits.max_depth)?;

    // One comparison covers trailing data, long heads, indefinite lengths
    // and misordered maps.
    if encode(&parsed).as_slice() != bytes {
        tracing::warn!(len = bytes.len(), "rejected non-canonical CBOR input");
        return Err(CoreError::NonCanonical);
    }
    Ok(parsed)
}

fn validate(value: &Value, depth: usize, max_depth: usize) -> Result<()> {
    if depth > max_depth {
        return Err(CoreError::DepthExceeded(max_depth));
    }
    let next = depth + 1;
    match value {
        Value::Tag(_, inner) => validate(inner, next, max_depth),
        Value::Array(items) => items
            .iter()
            .try_for_each(|item| validate(item, next, max_depth)),
        Value::Map(entries) => {
            let mut seen: Vec<Vec<u8>> = Vec::with_capacity(entries.len());
            for (key, item) in entries {
                let encoded = encode(key);
                if seen.contains(&encoded) {
                    return Err(CoreError::NonCanonical);
                }
                seen.push(encoded);
                validate(key, next, max_depth)?;
                validate(item, next, max_depth)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn write_item(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(int) => write_int(out, i128::from(*int)),
        Value::Bytes(data) => {
            write_head(out, MAJOR_BYTES, data.len() as u64);
            out.extend_from_slice(data);
        }
        Value::Text(text) => {
            write_head(out, MAJOR_TEXT, text.len() as u64);
            out.extend_from_slice(text.as_bytes());
        }
        Value::Array(items) => {
            write_head(out, MAJOR_ARRAY, items.len() as u64);
            items.iter().for_each(|item| write_item(out, item));
        }
        Value::Map(entries) => write_map(out, entries),
        Value::Tag(tag, inner) => {
            write_head(out, MAJOR_TAG, *tag);
            write_item(out, inner);
        }
        Value::Float(float) => write_float(out, *float),
        Value::Bool(flag) => out.push(if *flag { TRUE } else { FALSE }),
        Value::Null => out.push(NULL),
        // `Value` is non-exhaustive.
        _ => out.push(UNDEFINED),
    }
}

/// Major types 0 and 1; a negative `n` is stored as `-1 - n`.
fn write_int(out: &mut Vec<u8>, n: i128) {
    match u64::try_from(n) {
        Ok(unsigned) => write_head(out, MAJOR_UNSIGNED, unsigned),
        Err(_) => write_head(out, MAJOR_NEGATIVE, (-1 - n) as u64),
    }
}

/// The initial byte plus the shortest argument that holds `arg`.
pub(crate) fn write_head(out: &mut Vec<u8>, major: u8, arg: u64) {
    let initial = major << 5;
    let be = arg.to_be_bytes();
    let (info, width) = match arg {
        0..=23 => (arg as u8, 0),
        24..=0xff => (24, 1),
        0x100..=0xffff => (25, 2),
        0x1_0000..=0xffff_ffff => (26, 4),
        _ => (27, 8),
    };
    out.push(initial | info);
    out.extend_from_slice(&be[8 - width..]);
}

fn write_float(out: &mut Vec<u8>, float: f64) {
    const BOUND: f64 = 18_446_744_073_709_551_616.0;

    if float.is_nan() {
        out.extend_from_slice(&CANONICAL_NAN);
        return;
    }
    if float.is_finite() && float.fract() == 0.0 {
        if (0.0..BOUND).contains(&float) {
            write_head(out, MAJOR_UNSIGNED, float as u64);
            return;
        }
        if (-BOUND..0.0).contains(&float) {
            write_head(out, MAJOR_NEGATIVE, (-1.0 - float) as u64);
            return;
        }
    }
    let single = float as f32;
    if f64::from(single) == float {
        out.push(0xfa);
        out.extend_from_slice(&single.to_bits().to_be_bytes());
    } else {
        out.push(0xfb);
        out.extend_from_slice(&float.to_bits().to_be_bytes());
    }
}

fn write_map(out: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut sorted: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(key, item)| (encode(key), item))
        .collect();
    sorted.sort_by(|(left, _), (right, _)| left.cmp(right));

    write_head(out, MAJOR_MAP, sorted.len() as u64);
    for (key, item) in sorted {
        out.extend_from_slice(&key);
        write_item(out, item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::Integer(n.into())
    }

    fn head(major: u8, arg: u64) -> Vec<u8> {
        let mut out = Vec::new();
        write_head(&mut out, major, arg);
        out
    }

    #[test]
    fn test_heads_are_shortest() {
        let cases: [(u64, &[u8]); 8] = [
            (0, &[0x00]),
            (23, &[0x17]),
            (24, &[0x18, 0x18]),
            (255, &[0x18, 0xff]),
            (256, &[0x19, 0x01, 0x00]),
            (65_535, &[0x19, 0xff, 0xff]),
            (65_536, &[0x1a, 0x00, 0x01, 0x00, 0x00]),
            (u64::MAX, &[0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]),
        ];
        for (arg, expected) in cases {
            assert_eq!(head(MAJOR_UNSIGNED, arg), expected, "{arg}");
        }
        assert_eq!(head(MAJOR_TAG, 200), vec![0xd8, 0xc8]);
    }

    #[test]
    fn test_negative_integers() {
        assert_eq!(encode(&int(-1)), vec![0x20]);
        assert_eq!(encode(&int(-100)), vec![0x38, 99]);
        assert_eq!(encode(&int(i64::MIN))[0], 0x3b);
    }

    #[test]
    fn test_map_entries_sorted_by_encoded_key() {
        let map = Value::Map(vec![
            (Value::Text("b".into()), int(1)),
            (int(10), int(2)),
            (Value::Text("a".into()), int(3)),
        ]);
        // 10 (0x0a) sorts before the text keys (0x61..).
        assert_eq!(
            encode(&map),
            vec![0xa3, 0x0a, 0x02, 0x61, b'a', 0x03, 0x61, b'b', 0x01]
        );
    }

    #[test]
    fn test_tag_encoding() {
        let value = Value::Tag(24, Box::new(Value::Text("Hi".into())));
        assert_eq!(encode(&value), vec![0xd8, 0x18, 0x62, b'H', b'i']);
    }

    #[test]
    fn test_float_reduction() {
        assert_eq!(encode(&Value::Float(2.0)), vec![0x02]);
        assert_eq!(encode(&Value::Float(-3.0)), vec![0x22]);
        assert_eq!(encode(&Value::Float(f64::NAN)), CANONICAL_NAN.to_vec());
        assert_eq!(encode(&Value::Float(1.5))[0], 0xfa);
        assert_eq!(encode(&Value::Float(0.1))[0], 0xfb);
    }

    #[test]
    fn test_decode_accepts_canonical() {
        let value = Value::Array(vec![
            Value::Text("alice".into()),
            int(42),
            Value::Tag(200, Box::new(Value::Bytes(vec![1, 2, 3]))),
        ]);
        assert_eq!(decode(&encode(&value)).unwrap(), value);
    }

    #[test]
    fn test_decode_rejects_non_canonical_forms() {
        let inputs: [&[u8]; 4] = [
            // 5 with a one-byte argument
            &[0x18, 0x05],
            // {5: 0, 0: 0}
            &[0xa2, 0x05, 0x00, 0x00, 0x00],
            // indefinite-length array
            &[0x9f, 0x01, 0xff],
            // 1.0 as a half float
            &[0xf9, 0x3c, 0x00],
        ];
        for input in inputs {
            assert!(
                matches!(decode(input), Err(CoreError::NonCanonical)),
                "{input:02x?}"
            );
        }
        assert!(decode(&[0x01, 0x02]).is_err());
    }

    #[test]
    fn test_decode_rejects_duplicate_keys() {
        // {1: 0, 1: 0}
        let bytes = [0xa2, 0x01, 0x00, 0x01, 0x00];
        assert!(matches!(decode(&bytes), Err(CoreError::NonCanonical)));
    }

    #[test]
    fn test_decode_limits() {
        let mut nested = Value::Null;
        for _ in 0..10 {
            nested = Value::Array(vec![nested]);
        }
        let shallow = DecodeLimits {
            max_depth: 4,
            ..DecodeLimits::default()
        };
        assert!(matches!(
            decode_with_limits(&encode(&nested), &shallow),
            Err(CoreError::DepthExceeded(4))
        ));

        let short = DecodeLimits {
            max_input_len: 2,
            ..DecodeLimits::default()
        };
        assert!(matches!(
            decode_with_limits(&[0x43, 1, 2, 3], &short),
            Err(CoreError::InputTooLarge { len: 4, limit: 2 })
        ));
    }

    proptest::proptest! {
        #[test]
        fn test_reencoding_is_stable(
            text in ".{0,40}",
            n in proptest::prelude::any::<i64>(),
            bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64),
        ) {
            let value = Value::Map(vec![
                (Value::Text(text), int(n)),
                (int(1), Value::Bytes(bytes)),
            ]);
            let encoded = encode(&value);
            let decoded = decode(&encoded).unwrap();
            proptest::prop_assert_eq!(encode(&decoded), encoded);
        }
    }
}
