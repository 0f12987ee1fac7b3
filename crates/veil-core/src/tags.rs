//! CBOR tag numbers used by the Veil wire format.
//!
//! Tags 0-23 encode in a single byte, 24-255 in two. Every envelope
//! variant other than `Node` (a plain array) has its own tag, so a decoder
//! can tell the variants apart without context.

/// Epoch-based date/time (RFC 8949).
pub const DATE: u64 = 1;
/// Leaf: an embedded CBOR data item.
pub const LEAF: u64 = 24;
/// Top-level envelope.
pub const ENVELOPE: u64 = 200;
/// Predicate/object pair.
pub const ASSERTION: u64 = 201;
/// Known value code.
pub const KNOWN_VALUE: u64 = 202;
/// Wrapped envelope.
pub const WRAPPED: u64 = 203;
/// Encrypted envelope.
pub const ENCRYPTED: u64 = 204;
/// Compressed envelope.
pub const COMPRESSED: u64 = 205;
/// Elided envelope (digest only).
pub const ELIDED: u64 = 206;
/// Digest used as a leaf value.
pub const DIGEST: u64 = 207;
/// Ed25519 signature.
pub const SIGNATURE: u64 = 208;
/// Ed25519 public key.
pub const PUBLIC_KEY: u64 = 209;
/// X25519 public key.
pub const X25519_PUBLIC_KEY: u64 = 210;
/// Symmetric key sealed to an X25519 recipient.
pub const SEALED_MESSAGE: u64 = 211;
/// Secret share.
pub const SSKR_SHARE: u64 = 212;
/// Random salt.
pub const SALT: u64 = 213;

/// Human-readable name for a tag, if it is one of ours.
pub fn name_for_tag(tag: u64) -> Option<&'static str> {
    let name = match tag {
        DATE => "date",
        LEAF => "leaf",
        ENVELOPE => "envelope",
        ASSERTION => "assertion",
        KNOWN_VALUE => "known-value",
        WRAPPED => "wrapped",
        ENCRYPTED => "encrypted",
        COMPRESSED => "compressed",
        ELIDED => "elided",
        DIGEST => "digest",
        SIGNATURE => "signature",
        PUBLIC_KEY => "public-key",
        X25519_PUBLIC_KEY => "agreement-public-key",
        SEALED_MESSAGE => "sealed-message",
        SSKR_SHARE => "sskr-share",
        SALT => "salt",
        _ => return None,
    };
    Some(name)
}
