//! Golden test vectors for deterministic verification.
//!
//! Each vector pins the digest and the full wire form of one envelope.
//! Any implementation of the format must reproduce both byte for byte.

use serde::Serialize;

use veil_envelope::{known_values, Envelope};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub description: &'static str,
    /// Builds the envelope under test.
    pub build: fn() -> Envelope,
    /// Expected digest (hex).
    pub digest: &'static str,
    /// Expected tagged wire encoding (hex).
    pub wire: &'static str,
}

/// Serializable form of a vector with the values actually computed.
#[derive(Debug, Serialize)]
pub struct VectorRecord {
    pub name: String,
    pub description: String,
    pub digest: String,
    pub wire: String,
    pub format: String,
}

impl GoldenVector {
    pub fn envelope(&self) -> Envelope {
        (self.build)()
    }

    pub fn record(&self) -> VectorRecord {
        let envelope = self.envelope();
        VectorRecord {
            name: self.name.to_string(),
            description: self.description.to_string(),
            digest: envelope.digest().to_hex(),
            wire: hex::encode(envelope.to_cbor_data()),
            format: envelope.format(),
        }
    }
}

fn alice_knows_bob() -> Envelope {
    Envelope::new("Alice").add_assertion("knows", "Bob")
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "leaf_text",
            description: "Text leaf",
            build: || Envelope::new("Hello."),
            digest: "eeaa7321753376c2c61111a3ab74cea7b87377c455839b3db903e9e79c46de4c",
            wire: "d8c8d8186648656c6c6f2e",
        },
        GoldenVector {
            name: "leaf_uint",
            description: "Unsigned integer leaf",
            build: || Envelope::new(42u64),
            digest: "3b791064a95c35ff26f4816d3d88a50d7c6e5089d925ff2ca9a0cdabd0f8c670",
            wire: "d8c8d818182a",
        },
        GoldenVector {
            name: "leaf_bool",
            description: "Boolean leaf",
            build: || Envelope::new(true),
            digest: "aec3fc2ff78e08a792ad887490545ce1008f20bf2b3113e0111ab49b5fd4dd01",
            wire: "d8c8d818f5",
        },
        GoldenVector {
            name: "leaf_bytes",
            description: "Byte string leaf 00..0f",
            build: || Envelope::new((0u8..16).collect::<Vec<u8>>().as_slice()),
            digest: "28220bb5e72a2aab24e30c75ab7dde6cb64c9c0b55c40deb95ab9eb50b81771f",
            wire: "d8c8d81850000102030405060708090a0b0c0d0e0f",
        },
        GoldenVector {
            name: "known_value",
            description: "The 'isA' known value",
            build: || Envelope::new(known_values::IS_A),
            digest: "3939f5f18c5d296a19f4736d815ce7ffac674276fd78df8b1fdff05b2e736e4b",
            wire: "d8c8d8ca01",
        },
        GoldenVector {
            name: "alice_knows_bob",
            description: "Node with one assertion",
            build: alice_knows_bob,
            digest: "6d8f1326fe13681491328268828e83d4d9148ef0af13d290e325dea12796d955",
            wire: "d8c882d81865416c696365d8c982d818656b6e6f7773d81863426f62",
        },
        GoldenVector {
            name: "wrapped",
            description: "The node above, wrapped",
            build: || alice_knows_bob().wrap(),
            digest: "b9a34fd143884a58946646245c57f3914b5c29647646d2dec4bab181c701bbe5",
            wire: "d8c8d8cb82d81865416c696365d8c982d818656b6e6f7773d81863426f62",
        },
        GoldenVector {
            name: "elided_object",
            description: "Object elided; digest unchanged",
            build: || alice_knows_bob().elide_removing_target(&Envelope::new("Bob")),
            digest: "6d8f1326fe13681491328268828e83d4d9148ef0af13d290e325dea12796d955",
            wire: "d8c882d81865416c696365d8c982d818656b6e6f7773d8ce5820a852c76ddbe1b16d7f6b45880d2aa5202fb4bb481067e2d3517bed2dfc617500",
        },
        GoldenVector {
            name: "elided_root",
            description: "Whole envelope elided",
            build: || alice_knows_bob().elide(),
            digest: "6d8f1326fe13681491328268828e83d4d9148ef0af13d290e325dea12796d955",
            wire: "d8c8d8ce58206d8f1326fe13681491328268828e83d4d9148ef0af13d290e325dea12796d955",
        },
        GoldenVector {
            name: "two_assertions",
            description: "Assertions stored in digest order",
            build: || {
                Envelope::new("Alice")
                    .add_assertion(known_values::IS_A, "Person")
                    .add_assertion("knows", "Bob")
            },
            digest: "2f4501e08af91e58f58742b119e237543f546af9047a50327a3ae690cf315574",
            wire: "d8c883d81865416c696365d8c982d818656b6e6f7773d81863426f62d8c982d8ca01d81866506572736f6e",
        },
    ]
}

/// Check every vector, returning `(name, matches, computed digest)`.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let record = v.record();
            let matches = record.digest == v.digest && record.wire == v.wire;
            (record.name, matches, record.digest)
        })
        .collect()
}
