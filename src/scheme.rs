//! The contract the distance pipeline uses to reach an encryption capability.
//!
//! Implementations own their key material and evaluation context for their
//! whole lifetime. Encoded values and ciphertexts they return are released
//! when dropped; `live_handles` reports how many are still alive.

use crate::error::Result;

pub trait HomomorphicScheme {
    type Plaintext;
    type Ciphertext;

    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Scale values are encoded at unless the caller picks another one.
    fn default_scale(&self) -> f64;

    /// Number of ciphertext-ciphertext multiplications a fresh ciphertext can
    /// go through in sequence before it can no longer be decrypted.
    fn max_depth(&self) -> usize;

    /// Encodes `value` as a single-element vector at `scale`.
    fn encode(&self, value: f64, scale: f64) -> Result<Self::Plaintext>;

    fn encrypt(&mut self, plaintext: &Self::Plaintext) -> Result<Self::Ciphertext>;

    fn add(&self, a: &Self::Ciphertext, b: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    fn sub(&self, a: &Self::Ciphertext, b: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    fn multiply(&self, a: &Self::Ciphertext, b: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    fn decrypt(&self, ciphertext: &Self::Ciphertext) -> Result<Self::Plaintext>;

    /// Approximate value of the first slot.
    fn decode(&self, plaintext: &Self::Plaintext) -> Result<f64>;

    fn live_handles(&self) -> usize;
}
