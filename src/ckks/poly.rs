//! Polynomials in RNS form, kept in the NTT domain.

use super::arith::{mod_add, mod_mul, mod_neg, mod_sub, reduce_signed};
use super::ntt::NttTables;

/// One coefficient vector per prime of the current level.
#[derive(Debug, Clone, PartialEq)]
pub struct RnsPoly {
    pub limbs: Vec<Vec<u64>>,
}

impl RnsPoly {
    pub fn zero(n: usize, num_limbs: usize) -> Self {
        Self {
            limbs: vec![vec![0u64; n]; num_limbs],
        }
    }

    /// Every evaluation of the constant polynomial `value` is `value` itself.
    pub fn constant(value: i128, n: usize, moduli: &[u64]) -> Self {
        Self {
            limbs: moduli
                .iter()
                .map(|&q| vec![reduce_signed(value, q); n])
                .collect(),
        }
    }

    /// Lifts small signed coefficients into every limb and transforms them.
    pub fn from_signed(coeffs: &[i64], tables: &[NttTables]) -> Self {
        let limbs = tables
            .iter()
            .map(|t| {
                let q = t.modulus();
                let mut limb: Vec<u64> = coeffs
                    .iter()
                    .map(|&c| reduce_signed(c as i128, q))
                    .collect();
                t.forward(&mut limb);
                limb
            })
            .collect();
        Self { limbs }
    }

    pub fn num_limbs(&self) -> usize {
        self.limbs.len()
    }

    fn zip_with(&self, other: &Self, moduli: &[u64], op: fn(u64, u64, u64) -> u64) -> Self {
        let limbs = self
            .limbs
            .iter()
            .zip(&other.limbs)
            .zip(moduli)
            .map(|((a, b), &q)| a.iter().zip(b).map(|(&x, &y)| op(x, y, q)).collect())
            .collect();
        Self { limbs }
    }

    pub fn add(&self, other: &Self, moduli: &[u64]) -> Self {
        self.zip_with(other, moduli, mod_add)
    }

    pub fn sub(&self, other: &Self, moduli: &[u64]) -> Self {
        self.zip_with(other, moduli, mod_sub)
    }

    /// Pointwise product, i.e. the negacyclic product of the underlying polynomials.
    pub fn mul(&self, other: &Self, moduli: &[u64]) -> Self {
        self.zip_with(other, moduli, mod_mul)
    }

    pub fn neg(&self, moduli: &[u64]) -> Self {
        let limbs = self
            .limbs
            .iter()
            .zip(moduli)
            .map(|(a, &q)| a.iter().map(|&x| mod_neg(x, q)).collect())
            .collect();
        Self { limbs }
    }

    /// Keeps the first `num_limbs` primes.
    pub fn truncated(&self, num_limbs: usize) -> Self {
        Self {
            limbs: self.limbs[..num_limbs].to_vec(),
        }
    }

    pub fn drop_last_limb(&mut self) {
        self.limbs.pop();
    }

    /// Coefficient-domain copy of the polynomial.
    pub fn to_coefficients(&self, tables: &[NttTables]) -> Vec<Vec<u64>> {
        self.limbs
            .iter()
            .zip(tables)
            .map(|(limb, t)| {
                let mut coeffs = limb.clone();
                t.inverse(&mut coeffs);
                coeffs
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_lift_roundtrip() {
        let tables = vec![NttTables::new(8, 17).unwrap(), NttTables::new(8, 97).unwrap()];
        let coeffs = [1i64, -1, 0, 5, -3, 0, 0, 2];
        let poly = RnsPoly::from_signed(&coeffs, &tables);
        let back = poly.to_coefficients(&tables);
        assert_eq!(back[0], vec![1, 16, 0, 5, 14, 0, 0, 2]);
        assert_eq!(back[1], vec![1, 96, 0, 5, 94, 0, 0, 2]);
    }

    #[test]
    fn test_constant_and_arithmetic() {
        let moduli = [17u64, 97];
        let a = RnsPoly::constant(-3, 4, &moduli);
        let b = RnsPoly::constant(5, 4, &moduli);
        assert_eq!(a.add(&b, &moduli), RnsPoly::constant(2, 4, &moduli));
        assert_eq!(a.sub(&b, &moduli), RnsPoly::constant(-8, 4, &moduli));
        assert_eq!(a.mul(&b, &moduli), RnsPoly::constant(-15, 4, &moduli));
        assert_eq!(a.neg(&moduli), RnsPoly::constant(3, 4, &moduli));
        assert_eq!(a.truncated(1).num_limbs(), 1);
    }
}
