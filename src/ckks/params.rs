//! Encryption parameters and their validation.
//!
//! Validation mirrors what a CKKS library checks when a context is built: the
//! ring dimension must be a supported power of two, every modulus in the chain
//! must be an NTT-friendly prime of the requested width, and the total width
//! must stay under the HomomorphicEncryption.org bound for the requested
//! security level.

use std::fmt;

use super::arith::is_prime;
use crate::error::{Error, Result};

pub const MIN_RING_DIMENSION: usize = 1024;
pub const MAX_RING_DIMENSION: usize = 32768;
pub const MAX_MODULUS_BITS: u32 = 60;

/// Classical security target of the parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLevel {
    Tc128,
    Tc192,
    Tc256,
}

impl SecurityLevel {
    /// Largest total modulus width, in bits, allowed for `ring_dimension`.
    pub fn max_modulus_bits(self, ring_dimension: usize) -> Option<u32> {
        let table: [(usize, [u32; 3]); 6] = [
            (1024, [27, 19, 14]),
            (2048, [54, 37, 29]),
            (4096, [109, 75, 58]),
            (8192, [218, 152, 118]),
            (16384, [438, 305, 237]),
            (32768, [881, 611, 476]),
        ];
        let column = match self {
            SecurityLevel::Tc128 => 0,
            SecurityLevel::Tc192 => 1,
            SecurityLevel::Tc256 => 2,
        };
        table
            .iter()
            .find(|(n, _)| *n == ring_dimension)
            .map(|(_, bits)| bits[column])
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityLevel::Tc128 => write!(f, "128-bit"),
            SecurityLevel::Tc192 => write!(f, "192-bit"),
            SecurityLevel::Tc256 => write!(f, "256-bit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncryptionParameters {
    /// Polynomial modulus degree N.
    pub ring_dimension: usize,
    /// Bit widths of the modulus chain, first entry at the bottom level.
    pub modulus_bits: Vec<u32>,
    pub security: SecurityLevel,
    /// Global encoding scale.
    pub scale: f64,
}

impl EncryptionParameters {
    pub fn total_modulus_bits(&self) -> u32 {
        self.modulus_bits.iter().sum()
    }

    /// Checks the parameter combination and picks the chain primes.
    pub fn validate(&self) -> Result<Vec<u64>> {
        let n = self.ring_dimension;
        if !n.is_power_of_two() || !(MIN_RING_DIMENSION..=MAX_RING_DIMENSION).contains(&n) {
            return Err(Error::Configuration(format!(
                "ring dimension {n} must be a power of two in [{MIN_RING_DIMENSION}, {MAX_RING_DIMENSION}]"
            )));
        }
        if self.modulus_bits.is_empty() {
            return Err(Error::Configuration("modulus chain is empty".into()));
        }
        if let Some(bits) = self
            .modulus_bits
            .iter()
            .find(|&&b| b < 2 || b > MAX_MODULUS_BITS)
        {
            return Err(Error::Configuration(format!(
                "modulus width {bits} outside [2, {MAX_MODULUS_BITS}] bits"
            )));
        }

        let total = self.total_modulus_bits();
        let limit = self.security.max_modulus_bits(n).ok_or_else(|| {
            Error::Configuration(format!("no security bound known for ring dimension {n}"))
        })?;
        if total > limit {
            return Err(Error::Configuration(format!(
                "modulus chain of {total} bits exceeds {limit} bits allowed at {} security for N={n}",
                self.security
            )));
        }

        if !(self.scale.is_finite() && self.scale > 1.0) {
            return Err(Error::Configuration(format!(
                "scale {} must be a finite value above 1",
                self.scale
            )));
        }
        if self.scale.log2() >= total as f64 {
            return Err(Error::Configuration(format!(
                "scale 2^{:.1} does not fit in a {total}-bit modulus chain",
                self.scale.log2()
            )));
        }

        select_primes(&self.modulus_bits, n)
    }
}

/// Distinct primes q = 1 (mod 2N) of the requested widths, largest first
/// within each width.
pub fn select_primes(bit_sizes: &[u32], ring_dimension: usize) -> Result<Vec<u64>> {
    let two_n = 2 * ring_dimension as u64;
    let mut chosen: Vec<u64> = Vec::with_capacity(bit_sizes.len());
    for &bits in bit_sizes {
        let upper = (1u64 << bits) - 1;
        let lower = 1u64 << (bits - 1);
        let mut candidate = upper - (upper % two_n) + 1;
        if candidate > upper {
            candidate = candidate.saturating_sub(two_n);
        }
        let prime = loop {
            if candidate < lower || candidate <= 1 {
                return Err(Error::Configuration(format!(
                    "not enough {bits}-bit primes congruent to 1 mod {two_n}"
                )));
            }
            if !chosen.contains(&candidate) && is_prime(candidate) {
                break candidate;
            }
            candidate -= two_n;
        };
        chosen.push(prime);
    }
    Ok(chosen)
}
