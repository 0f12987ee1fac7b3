//! Leaf value codec: typed values to and from CBOR.
//!
//! Every type that can live in an envelope leaf implements [`ToCbor`], and
//! the types that can be extracted again implement [`FromCbor`]. Encoding
//! goes through [`crate::canonical`], so equal values always produce equal
//! bytes.

use bytes::Bytes;
use ciborium::value::{Integer, Value};
use std::fmt;

use crate::canonical;
use crate::error::{CoreError, Result};
use crate::tags;

/// Conversion of a typed value into a CBOR data item.
pub trait ToCbor {
    fn to_cbor(&self) -> Value;

    /// Canonical encoding of [`ToCbor::to_cbor`].
    fn to_cbor_data(&self) -> Vec<u8> {
        canonical::encode(&self.to_cbor())
    }
}

/// Conversion of a CBOR data item back into a typed value.
pub trait FromCbor: Sized {
    fn from_cbor(value: &Value) -> Result<Self>;

    /// Decode canonical bytes and convert.
    fn from_cbor_data(data: &[u8]) -> Result<Self> {
        Self::from_cbor(&canonical::decode(data)?)
    }
}

impl ToCbor for Value {
    fn to_cbor(&self) -> Value {
        self.clone()
    }
}

impl FromCbor for Value {
    fn from_cbor(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl ToCbor for str {
    fn to_cbor(&self) -> Value {
        Value::Text(self.to_owned())
    }
}

impl ToCbor for &str {
    fn to_cbor(&self) -> Value {
        Value::Text((*self).to_owned())
    }
}

impl ToCbor for String {
    fn to_cbor(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FromCbor for String {
    fn from_cbor(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            _ => Err(CoreError::invalid_format("expected text string")),
        }
    }
}

impl ToCbor for bool {
    fn to_cbor(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromCbor for bool {
    fn from_cbor(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(CoreError::invalid_format("expected boolean")),
        }
    }
}

macro_rules! impl_cbor_integer {
    ($($t:ty),*) => {
        $(
            impl ToCbor for $t {
                fn to_cbor(&self) -> Value {
                    Value::Integer(Integer::from(*self))
                }
            }

            impl FromCbor for $t {
                fn from_cbor(value: &Value) -> Result<Self> {
                    match value {
                        Value::Integer(i) => <$t>::try_from(i128::from(*i)).map_err(|_| {
                            CoreError::invalid_format(concat!("integer out of range for ", stringify!($t)))
                        }),
                        _ => Err(CoreError::invalid_format("expected integer")),
                    }
                }
            }
        )*
    };
}

impl_cbor_integer!(u8, u16, u32, u64, i8, i16, i32, i64);

impl ToCbor for usize {
    fn to_cbor(&self) -> Value {
        Value::Integer(Integer::from(*self as u64))
    }
}

impl FromCbor for usize {
    fn from_cbor(value: &Value) -> Result<Self> {
        let n = u64::from_cbor(value)?;
        usize::try_from(n).map_err(|_| CoreError::invalid_format("integer out of range for usize"))
    }
}

impl ToCbor for f64 {
    fn to_cbor(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromCbor for f64 {
    fn from_cbor(value: &Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            // Integral floats are stored reduced to integers.
            Value::Integer(i) => Ok(i128::from(*i) as f64),
            _ => Err(CoreError::invalid_format("expected number")),
        }
    }
}

impl ToCbor for Bytes {
    fn to_cbor(&self) -> Value {
        Value::Bytes(self.to_vec())
    }
}

impl FromCbor for Bytes {
    fn from_cbor(value: &Value) -> Result<Self> {
        Ok(Bytes::from(expect_bytes(value)?.to_vec()))
    }
}

impl ToCbor for [u8] {
    fn to_cbor(&self) -> Value {
        Value::Bytes(self.to_vec())
    }
}

impl ToCbor for &[u8] {
    fn to_cbor(&self) -> Value {
        Value::Bytes(self.to_vec())
    }
}

impl<T: ToCbor> ToCbor for Vec<T> {
    fn to_cbor(&self) -> Value {
        Value::Array(self.iter().map(ToCbor::to_cbor).collect())
    }
}

impl<T: FromCbor> FromCbor for Vec<T> {
    fn from_cbor(value: &Value) -> Result<Self> {
        expect_array(value)?.iter().map(T::from_cbor).collect()
    }
}

/// A point in time, as whole seconds since the Unix epoch.
///
/// Encoded as `tag(1, seconds)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(i64);

impl Date {
    /// Create from seconds since the Unix epoch.
    pub const fn from_timestamp(seconds: i64) -> Self {
        Self(seconds)
    }

    /// The current time.
    pub fn now() -> Self {
        let seconds = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Self(seconds)
    }

    /// Seconds since the Unix epoch.
    pub const fn timestamp(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Date({})", self.0)
    }
}

impl ToCbor for Date {
    fn to_cbor(&self) -> Value {
        Value::Tag(tags::DATE, Box::new(Value::Integer(self.0.into())))
    }
}

impl FromCbor for Date {
    fn from_cbor(value: &Value) -> Result<Self> {
        let seconds = i64::from_cbor(expect_tagged(value, tags::DATE)?)?;
        Ok(Self(seconds))
    }
}

/// Unwrap `tag(expected, inner)`, returning the inner item.
pub fn expect_tagged(value: &Value, expected: u64) -> Result<&Value> {
    match value {
        Value::Tag(tag, inner) if *tag == expected => Ok(inner),
        Value::Tag(tag, _) => Err(CoreError::InvalidFormat(format!(
            "expected tag {}, got tag {}",
            expected, tag
        ))),
        _ => Err(CoreError::InvalidFormat(format!("expected tag {}", expected))),
    }
}

/// Borrow the items of an array.
pub fn expect_array(value: &Value) -> Result<&[Value]> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(CoreError::invalid_format("expected array")),
    }
}

/// Borrow the contents of a byte string.
pub fn expect_bytes(value: &Value) -> Result<&[u8]> {
    match value {
        Value::Bytes(b) => Ok(b),
        _ => Err(CoreError::invalid_format("expected byte string")),
    }
}

/// Read a fixed-size byte array.
pub fn expect_byte_array<const N: usize>(value: &Value) -> Result<[u8; N]> {
    expect_bytes(value)?
        .try_into()
        .map_err(|_| CoreError::InvalidFormat(format!("expected {} bytes", N)))
}

/// Read an unsigned integer.
pub fn expect_u64(value: &Value) -> Result<u64> {
    u64::from_cbor(value)
}

/// Short diagnostic rendering of a CBOR value, used by envelope notation.
pub fn diagnostic(value: &Value) -> String {
    match value {
        Value::Text(s) => format!("{:?}", s),
        Value::Integer(i) => i128::from(*i).to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Bytes(b) => format!("Bytes({})", b.len()),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(diagnostic).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Map(entries) => {
            let inner: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", diagnostic(k), diagnostic(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
        Value::Tag(tags::DATE, inner) => match i64::from_cbor(inner) {
            Ok(seconds) => Date(seconds).to_string(),
            Err(_) => format!("1({})", diagnostic(inner)),
        },
        Value::Tag(tags::DIGEST, inner) => match expect_bytes(inner) {
            Ok(b) if b.len() >= 4 => format!("Digest({})", hex::encode(&b[..4])),
            _ => format!("{}({})", tags::DIGEST, diagnostic(inner)),
        },
        Value::Tag(tag, inner) => match tags::name_for_tag(*tag) {
            Some(name) => capitalized(name),
            None => format!("{}({})", tag, diagnostic(inner)),
        },
        _ => "undefined".to_string(),
    }
}

fn capitalized(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_roundtrip_and_range() {
        let value = 300u16.to_cbor();
        assert_eq!(u16::from_cbor(&value).unwrap(), 300);
        assert!(u8::from_cbor(&value).is_err());
        assert_eq!(i64::from_cbor(&(-5i32).to_cbor()).unwrap(), -5);
    }

    #[test]
    fn test_text_and_bytes_are_distinct() {
        let text = "abc".to_cbor();
        let bytes = Bytes::from_static(b"abc").to_cbor();
        assert_ne!(text.to_cbor_data(), bytes.to_cbor_data());
        assert!(String::from_cbor(&bytes).is_err());
        assert!(Bytes::from_cbor(&text).is_err());
    }

    #[test]
    fn test_array_of_values() {
        let value = vec![1u32, 2, 3].to_cbor();
        assert_eq!(Vec::<u32>::from_cbor(&value).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_date_roundtrip() {
        let date = Date::from_timestamp(1_700_000_000);
        assert_eq!(Date::from_cbor(&date.to_cbor()).unwrap(), date);
        assert!(Date::from_cbor(&Value::Integer(5.into())).is_err());
    }

    #[test]
    fn test_from_cbor_data_requires_canonical() {
        assert_eq!(String::from_cbor_data(&"hi".to_cbor_data()).unwrap(), "hi");
        assert!(u8::from_cbor_data(&[0x18, 0x01]).is_err());
    }

    #[test]
    fn test_diagnostic() {
        assert_eq!(diagnostic(&"Alice".to_cbor()), "\"Alice\"");
        assert_eq!(diagnostic(&42u8.to_cbor()), "42");
        assert_eq!(diagnostic(&Value::Bytes(vec![0; 16])), "Bytes(16)");
        assert_eq!(diagnostic(&vec![1u8, 2].to_cbor()), "[1, 2]");
        assert_eq!(
            diagnostic(&Date::from_timestamp(10).to_cbor()),
            "Date(10)"
        );
        assert_eq!(
            diagnostic(&Value::Tag(tags::SEALED_MESSAGE, Box::new(Value::Null))),
            "SealedMessage"
        );
    }
}
