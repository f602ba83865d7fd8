//! Word-sized modular arithmetic for the RNS limbs.
//!
//! Every modulus is below 2^61, so sums fit in a `u64` and products are taken
//! through a `u128` intermediate.

#[inline(always)]
pub fn mod_add(a: u64, b: u64, q: u64) -> u64 {
    let sum = a + b;
    if sum >= q { sum - q } else { sum }
}

#[inline(always)]
pub fn mod_sub(a: u64, b: u64, q: u64) -> u64 {
    if a >= b { a - b } else { q - b + a }
}

#[inline(always)]
pub fn mod_mul(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 * b as u128) % q as u128) as u64
}

#[inline(always)]
pub fn mod_neg(a: u64, q: u64) -> u64 {
    if a == 0 { 0 } else { q - a }
}

pub fn mod_pow(mut base: u64, mut exp: u64, q: u64) -> u64 {
    let mut result = 1 % q;
    base %= q;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mod_mul(result, base, q);
        }
        exp >>= 1;
        base = mod_mul(base, base, q);
    }
    result
}

/// Inverse modulo a prime, by Fermat. `a` must be non-zero mod `q`.
pub fn mod_inv(a: u64, q: u64) -> u64 {
    mod_pow(a, q - 2, q)
}

/// Maps a signed integer into `[0, q)`.
#[inline]
pub fn reduce_signed(value: i128, q: u64) -> u64 {
    value.rem_euclid(q as i128) as u64
}

/// Deterministic Miller-Rabin; these bases are exact for every `u64`.
pub fn is_prime(n: u64) -> bool {
    const BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
    if n < 2 {
        return false;
    }
    for p in BASES {
        if n % p == 0 {
            return n == p;
        }
    }
    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }
    'witness: for a in BASES {
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mod_mul(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// A primitive 2N-th root of unity modulo `q`, i.e. psi^N = -1.
/// Requires q = 1 (mod 2N).
pub fn find_primitive_root(n: usize, q: u64) -> Option<u64> {
    let two_n = 2 * n as u64;
    if q % two_n != 1 {
        return None;
    }
    let exponent = (q - 1) / two_n;
    (2..q)
        .map(|g| mod_pow(g, exponent, q))
        .find(|&psi| mod_pow(psi, n as u64, q) == q - 1)
}

/// Centred value of the integer with the given residues, as an `f64`.
///
/// Garner's mixed-radix conversion with balanced digits: every digit lies in
/// `(-q_i/2, q_i/2]`, so the digit expansion is already the representative in
/// `(-Q/2, Q/2]` and a small negative value never turns into `Q - small`.
pub fn centered_crt(residues: &[u64], moduli: &[u64]) -> f64 {
    debug_assert_eq!(residues.len(), moduli.len());
    let mut digits: Vec<i64> = Vec::with_capacity(moduli.len());
    for (i, (&r, &q)) in residues.iter().zip(moduli).enumerate() {
        // Value of the digits found so far, and their radix, modulo q
        let mut acc = 0u64;
        let mut radix = 1 % q;
        for (&d, &p) in digits.iter().zip(&moduli[..i]) {
            acc = mod_add(acc, mod_mul(reduce_signed(d as i128, q), radix, q), q);
            radix = mod_mul(radix, p % q, q);
        }
        let digit = mod_mul(mod_sub(r % q, acc, q), mod_inv(radix, q), q);
        let centred = if digit > q / 2 {
            digit as i64 - q as i64
        } else {
            digit as i64
        };
        digits.push(centred);
    }
    // Horner from the most significant digit
    digits
        .iter()
        .zip(moduli)
        .rev()
        .fold(0.0, |value, (&d, &q)| value * q as f64 + d as f64)
}

#[inline]
pub fn bit_reverse(mut x: usize, bits: u32) -> usize {
    let mut result = 0;
    for _ in 0..bits {
        result = (result << 1) | (x & 1);
        x >>= 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_ops() {
        let q = 17;
        assert_eq!(mod_add(10, 10, q), 3);
        assert_eq!(mod_sub(3, 10, q), 10);
        assert_eq!(mod_mul(5, 4, q), 3);
        assert_eq!(mod_neg(0, q), 0);
        assert_eq!(mod_neg(5, q), 12);
        assert_eq!(mod_pow(3, 16, q), 1);
        for a in 1..q {
            assert_eq!(mod_mul(a, mod_inv(a, q), q), 1);
        }
    }

    #[test]
    fn test_reduce_signed() {
        assert_eq!(reduce_signed(-1, 17), 16);
        assert_eq!(reduce_signed(-35, 17), 16);
        assert_eq!(reduce_signed(35, 17), 1);
    }

    #[test]
    fn test_is_prime() {
        let primes = [2u64, 3, 97, 65537, 1_152_921_504_606_846_883];
        let composites = [1u64, 4, 561, 1_152_921_504_606_846_975, 3_215_031_751];
        for p in primes {
            assert!(is_prime(p), "{p} should be prime");
        }
        for c in composites {
            assert!(!is_prime(c), "{c} should be composite");
        }
    }

    #[test]
    fn test_primitive_root() {
        let psi = find_primitive_root(4, 17).unwrap();
        assert_eq!(mod_pow(psi, 8, 17), 1);
        assert_eq!(mod_pow(psi, 4, 17), 16);
        assert!(find_primitive_root(4, 19).is_none());
    }

    #[test]
    fn test_centered_crt() {
        let moduli = [97u64, 101, 103];
        let q: i128 = 97 * 101 * 103;
        for x in [0i128, 1, -1, 12345, -12345, q / 2, -(q / 2)] {
            let residues: Vec<u64> = moduli.iter().map(|&m| reduce_signed(x, m)).collect();
            assert_eq!(centered_crt(&residues, &moduli), x as f64, "x = {x}");
        }
    }

    #[test]
    fn test_centered_crt_wide_moduli() {
        let moduli = [68_719_476_731u64, 68_719_476_719];
        let x: i128 = -(1i128 << 60) - 987_654_321;
        let residues: Vec<u64> = moduli.iter().map(|&m| reduce_signed(x, m)).collect();
        let back = centered_crt(&residues, &moduli);
        assert!((back - x as f64).abs() <= (x as f64).abs() * 1e-15);
    }

    #[test]
    fn test_bit_reverse() {
        assert_eq!(bit_reverse(0b0001, 4), 0b1000);
        assert_eq!(bit_reverse(0b1010, 4), 0b0101);
    }
}
