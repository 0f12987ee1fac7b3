//! Test fixtures and helpers.
//!
//! Common setup code for integration tests. Every key here comes from a
//! fixed seed, so envelopes built from fixtures are reproducible.

use rand::rngs::StdRng;
use rand::SeedableRng;

use veil_crypto::{Keypair, PublicKey, X25519PublicKey, X25519StaticSecret};
use veil_envelope::{known_values, Envelope};

/// One participant: a signing key and an agreement key.
pub struct Party {
    pub name: &'static str,
    pub signing: Keypair,
    pub agreement: X25519StaticSecret,
}

impl Party {
    /// Derive both keys from one seed byte.
    pub fn with_seed(name: &'static str, seed: u8) -> Self {
        let mut agreement_seed = [seed; 32];
        agreement_seed[0] ^= 0xff;
        Self {
            name,
            signing: Keypair::from_seed(&[seed; 32]),
            agreement: X25519StaticSecret::from_bytes(agreement_seed),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.signing.public_key()
    }

    pub fn agreement_public_key(&self) -> X25519PublicKey {
        self.agreement.public_key()
    }
}

/// Alice, Bob and Carol plus a seeded RNG.
pub struct TestFixture {
    pub alice: Party,
    pub bob: Party,
    pub carol: Party,
    seed: u64,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_seed(42)
    }

    /// The seed only affects [`TestFixture::rng`]; party keys are fixed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            alice: Party::with_seed("Alice", 0x01),
            bob: Party::with_seed("Bob", 0x02),
            carol: Party::with_seed("Carol", 0x03),
            seed,
        }
    }

    /// A fresh deterministic RNG; each call starts from the same state.
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    /// `"Alice" [ "knows": "Bob" ]`
    pub fn alice_knows_bob(&self) -> Envelope {
        Envelope::new("Alice").add_assertion("knows", "Bob")
    }

    /// A small credential issued by Alice to Bob, wrapped and signed.
    pub fn credential(&self) -> Envelope {
        Envelope::new("credential-0042")
            .add_assertion(known_values::IS_A, "Certificate")
            .add_assertion(known_values::ISSUER, self.alice.name)
            .add_assertion(known_values::HOLDER, self.bob.name)
            .add_assertion("firstName", "Bob")
            .add_assertion("lastName", "Smith")
            .add_assertion("birthYear", 1990u64)
            .add_assertion("licenseClass", "C")
            .wrap()
            .add_signature(&self.alice.signing)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Parties for multi-recipient and threshold tests.
pub fn multi_party_fixtures(count: usize) -> Vec<Party> {
    (0..count)
        .map(|i| Party::with_seed("party", 0x10 + i as u8))
        .collect()
}
