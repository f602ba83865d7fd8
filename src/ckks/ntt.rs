//! Negacyclic number theoretic transform over Z_q[X]/(X^N+1).
//!
//! The psi twist is folded into the twiddle tables, so the forward transform
//! takes coefficients in natural order and leaves evaluations in bit-reversed
//! order; the inverse undoes exactly that. Pointwise products in between are
//! negacyclic polynomial products.

use super::arith::{bit_reverse, find_primitive_root, mod_add, mod_inv, mod_mul, mod_pow, mod_sub};

/// Pre-computed tables for one (N, q) pair.
#[derive(Debug, Clone)]
pub struct NttTables {
    q: u64,
    n: usize,
    /// psi^bitrev(i)
    psi_rev: Vec<u64>,
    /// psi^-bitrev(i)
    psi_inv_rev: Vec<u64>,
    n_inv: u64,
}

impl NttTables {
    /// `None` when `q` has no primitive 2N-th root of unity.
    pub fn new(n: usize, q: u64) -> Option<Self> {
        if !n.is_power_of_two() || n < 2 {
            return None;
        }
        let log_n = n.trailing_zeros();
        let psi = find_primitive_root(n, q)?;
        let psi_inv = mod_inv(psi, q);

        let mut psi_rev = vec![0u64; n];
        let mut psi_inv_rev = vec![0u64; n];
        let mut power = 1u64;
        let mut inv_power = 1u64;
        for i in 0..n {
            let rev = bit_reverse(i, log_n);
            psi_rev[rev] = power;
            psi_inv_rev[rev] = inv_power;
            power = mod_mul(power, psi, q);
            inv_power = mod_mul(inv_power, psi_inv, q);
        }
        debug_assert_eq!(mod_pow(psi, n as u64, q), q - 1);

        Some(Self {
            q,
            n,
            psi_rev,
            psi_inv_rev,
            n_inv: mod_inv(n as u64, q),
        })
    }

    pub fn modulus(&self) -> u64 {
        self.q
    }

    /// In-place forward transform (Cooley-Tukey).
    pub fn forward(&self, a: &mut [u64]) {
        debug_assert_eq!(a.len(), self.n);
        let q = self.q;
        let mut t = self.n;
        let mut m = 1;
        while m < self.n {
            t >>= 1;
            for i in 0..m {
                let j1 = 2 * i * t;
                let w = self.psi_rev[m + i];
                for j in j1..j1 + t {
                    let u = a[j];
                    let v = mod_mul(a[j + t], w, q);
                    a[j] = mod_add(u, v, q);
                    a[j + t] = mod_sub(u, v, q);
                }
            }
            m <<= 1;
        }
    }

    /// In-place inverse transform (Gentleman-Sande), including the 1/N factor.
    pub fn inverse(&self, a: &mut [u64]) {
        debug_assert_eq!(a.len(), self.n);
        let q = self.q;
        let mut t = 1;
        let mut m = self.n;
        while m > 1 {
            let h = m >> 1;
            let mut j1 = 0;
            for i in 0..h {
                let w = self.psi_inv_rev[h + i];
                for j in j1..j1 + t {
                    let u = a[j];
                    let v = a[j + t];
                    a[j] = mod_add(u, v, q);
                    a[j + t] = mod_mul(mod_sub(u, v, q), w, q);
                }
                j1 += 2 * t;
            }
            t <<= 1;
            m = h;
        }
        for coeff in a.iter_mut() {
            *coeff = mod_mul(*coeff, self.n_inv, q);
        }
    }
}
