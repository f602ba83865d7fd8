//! A compact RNS-CKKS capability.
//!
//! This implements the minimal CKKS operation set the distance benchmark needs:
//! - encode/decode of one real value per plaintext
//! - public-key encrypt / secret-key decrypt
//! - ct + ct, ct - ct
//! - ct x ct, each product consuming one level of the modulus chain
//!
//! A scalar is encoded as the constant polynomial `round(v * scale)`, which
//! places `v` in every slot; decoding returns the slot average, i.e. the
//! constant coefficient. Products are left as degree-2 ciphertexts and are
//! decrypted with `s^2`, so there is no relinearisation key. A multiplication
//! drops the last prime of the chain without dividing by it, so the output
//! scale is the product of the input scales.
//!
//! NOT implemented: rotations, relinearisation, rescaling by division,
//! bootstrapping, slot packing.

pub mod arith;
pub mod ntt;
pub mod params;
pub mod poly;
pub mod sampling;

use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::error::{Error, Result};
use crate::handle::{Handle, HandleTracker};
use crate::scheme::HomomorphicScheme;

use arith::centered_crt;
use ntt::NttTables;
pub use params::{EncryptionParameters, SecurityLevel};
use poly::RnsPoly;
use sampling::{ErrorDistribution, sample_ternary, sample_uniform};

/// Bits kept free above the encoded magnitude: one for the sign, one for noise.
const HEADROOM_BITS: f64 = 2.0;

/// Encoded value, in NTT form, at a given level and scale.
#[derive(Debug)]
pub struct Plaintext {
    poly: RnsPoly,
    level: usize,
    scale: f64,
    bound: f64,
    _handle: Handle,
}

impl Plaintext {
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

/// `parts[0] + parts[1]*s + parts[2]*s^2 + ...` decrypts to the plaintext.
#[derive(Debug)]
pub struct Ciphertext {
    parts: Vec<RnsPoly>,
    level: usize,
    scale: f64,
    /// Upper bound on the absolute value of the encrypted number.
    bound: f64,
    _handle: Handle,
}

impl Ciphertext {
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Number of polynomials (2 when fresh, 3 after one product).
    pub fn size(&self) -> usize {
        self.parts.len()
    }
}

#[derive(Debug)]
pub struct PublicKey {
    p0: RnsPoly,
    p1: RnsPoly,
}

#[derive(Debug)]
pub struct SecretKey {
    s: RnsPoly,
}

/// Generated once per scheme; the public half encrypts, the secret half only decrypts.
#[derive(Debug)]
pub struct KeyMaterial {
    public: PublicKey,
    secret: SecretKey,
}

/// Validated parameters plus per-prime NTT tables.
#[derive(Debug)]
pub struct CkksContext {
    params: EncryptionParameters,
    moduli: Vec<u64>,
    tables: Vec<NttTables>,
}

impl CkksContext {
    pub fn new(params: EncryptionParameters) -> Result<Self> {
        let moduli = params.validate()?;
        let tables = moduli
            .iter()
            .map(|&q| {
                NttTables::new(params.ring_dimension, q).ok_or_else(|| {
                    Error::Configuration(format!("modulus {q} admits no negacyclic NTT"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            params,
            moduli,
            tables,
        })
    }

    pub fn params(&self) -> &EncryptionParameters {
        &self.params
    }

    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    pub fn ring_dimension(&self) -> usize {
        self.params.ring_dimension
    }

    pub fn top_level(&self) -> usize {
        self.moduli.len() - 1
    }

    fn moduli_at(&self, level: usize) -> &[u64] {
        &self.moduli[..=level]
    }

    fn tables_at(&self, level: usize) -> &[NttTables] {
        &self.tables[..=level]
    }

    /// log2 of the product of the primes still present at `level`.
    pub fn capacity_bits(&self, level: usize) -> f64 {
        self.moduli_at(level).iter().map(|&q| (q as f64).log2()).sum()
    }

    fn check_magnitude(&self, bound: f64, scale: f64, level: usize, op: &str) -> Result<()> {
        if bound == 0.0 {
            return Ok(());
        }
        let needed = bound.log2() + scale.log2() + HEADROOM_BITS;
        let available = self.capacity_bits(level);
        if needed > available {
            return Err(Error::NumericOverflow(format!(
                "{op} needs {needed:.1} bits but level {level} only holds {available:.1}"
            )));
        }
        Ok(())
    }
}

pub struct CkksScheme {
    context: CkksContext,
    keys: KeyMaterial,
    errors: ErrorDistribution,
    rng: ChaCha20Rng,
    handles: HandleTracker,
}

impl CkksScheme {
    /// Builds the context and generates keys from OS entropy.
    pub fn new(params: EncryptionParameters) -> Result<Self> {
        Self::from_rng(params, ChaCha20Rng::from_entropy())
    }

    /// Reproducible keys and encryption randomness, for tests and fixtures.
    pub fn with_seed(params: EncryptionParameters, seed: u64) -> Result<Self> {
        Self::from_rng(params, ChaCha20Rng::seed_from_u64(seed))
    }

    fn from_rng(params: EncryptionParameters, mut rng: ChaCha20Rng) -> Result<Self> {
        let context = CkksContext::new(params)?;
        let errors = ErrorDistribution::new()?;
        let keys = generate_keys(&context, &errors, &mut rng);
        debug!(
            "CKKS context ready: N={}, chain={:?}, security={}",
            context.ring_dimension(),
            context.params().modulus_bits,
            context.params().security
        );
        Ok(Self {
            context,
            keys,
            errors,
            rng,
            handles: HandleTracker::new(),
        })
    }

    pub fn context(&self) -> &CkksContext {
        &self.context
    }

    fn plaintext(&self, poly: RnsPoly, level: usize, scale: f64, bound: f64) -> Plaintext {
        Plaintext {
            poly,
            level,
            scale,
            bound,
            _handle: self.handles.acquire(),
        }
    }

    fn ciphertext(&self, parts: Vec<RnsPoly>, level: usize, scale: f64, bound: f64) -> Ciphertext {
        Ciphertext {
            parts,
            level,
            scale,
            bound,
            _handle: self.handles.acquire(),
        }
    }

    fn check_operands(&self, a: &Ciphertext, b: &Ciphertext, op: &str) -> Result<()> {
        if a.level != b.level {
            return Err(Error::OperandMismatch(format!(
                "{op} between levels {} and {}",
                a.level, b.level
            )));
        }
        Ok(())
    }

    fn check_scales(a: &Ciphertext, b: &Ciphertext, op: &str) -> Result<()> {
        let tolerance = 1e-9 * a.scale.max(b.scale);
        if (a.scale - b.scale).abs() > tolerance {
            return Err(Error::OperandMismatch(format!(
                "{op} between scales 2^{:.2} and 2^{:.2}",
                a.scale.log2(),
                b.scale.log2()
            )));
        }
        Ok(())
    }

    /// Part-wise combination; a missing part counts as zero.
    fn combine(&self, a: &Ciphertext, b: &Ciphertext, subtract: bool) -> Vec<RnsPoly> {
        let moduli = self.context.moduli_at(a.level);
        let len = a.parts.len().max(b.parts.len());
        (0..len)
            .map(|i| match (a.parts.get(i), b.parts.get(i)) {
                (Some(x), Some(y)) if subtract => x.sub(y, moduli),
                (Some(x), Some(y)) => x.add(y, moduli),
                (Some(x), None) => x.clone(),
                (None, Some(y)) if subtract => y.neg(moduli),
                (None, Some(y)) => y.clone(),
                (None, None) => unreachable!("index below the longer operand's size"),
            })
            .collect()
    }

    fn add_or_sub(&self, a: &Ciphertext, b: &Ciphertext, subtract: bool) -> Result<Ciphertext> {
        let op = if subtract { "sub" } else { "add" };
        self.check_operands(a, b, op)?;
        Self::check_scales(a, b, op)?;
        let bound = a.bound + b.bound;
        self.context.check_magnitude(bound, a.scale, a.level, op)?;
        let parts = self.combine(a, b, subtract);
        Ok(self.ciphertext(parts, a.level, a.scale, bound))
    }
}

fn generate_keys<R: rand::Rng>(
    context: &CkksContext,
    errors: &ErrorDistribution,
    rng: &mut R,
) -> KeyMaterial {
    let n = context.ring_dimension();
    let moduli = context.moduli();
    let tables = &context.tables;

    let s = RnsPoly::from_signed(&sample_ternary(rng, n), tables);
    let a = RnsPoly {
        limbs: moduli.iter().map(|&q| sample_uniform(rng, n, q)).collect(),
    };
    let e = RnsPoly::from_signed(&errors.sample(rng, n), tables);

    // p0 = -(a*s) + e, p1 = a
    let p0 = a.mul(&s, moduli).neg(moduli).add(&e, moduli);
    KeyMaterial {
        public: PublicKey { p0, p1: a },
        secret: SecretKey { s },
    }
}

impl HomomorphicScheme for CkksScheme {
    type Plaintext = Plaintext;
    type Ciphertext = Ciphertext;

    fn name(&self) -> &'static str {
        "ckks"
    }

    fn default_scale(&self) -> f64 {
        self.context.params.scale
    }

    fn max_depth(&self) -> usize {
        self.context.top_level()
    }

    fn encode(&self, value: f64, scale: f64) -> Result<Plaintext> {
        if !value.is_finite() || !(scale.is_finite() && scale > 0.0) {
            return Err(Error::NumericOverflow(format!(
                "cannot encode {value} at scale {scale}"
            )));
        }
        let level = self.context.top_level();
        let bound = value.abs();
        self.context.check_magnitude(bound, scale, level, "encode")?;
        let scaled = (value * scale).round() as i128;
        let poly = RnsPoly::constant(scaled, self.context.ring_dimension(), self.context.moduli());
        Ok(self.plaintext(poly, level, scale, bound))
    }

    fn encrypt(&mut self, plaintext: &Plaintext) -> Result<Ciphertext> {
        let level = plaintext.level;
        let n = self.context.ring_dimension();
        let moduli = self.context.moduli_at(level);
        let tables = self.context.tables_at(level);

        let v = RnsPoly::from_signed(&sample_ternary(&mut self.rng, n), tables);
        let e0 = RnsPoly::from_signed(&self.errors.sample(&mut self.rng, n), tables);
        let e1 = RnsPoly::from_signed(&self.errors.sample(&mut self.rng, n), tables);

        let pk = &self.keys.public;
        let p0 = pk.p0.truncated(level + 1);
        let p1 = pk.p1.truncated(level + 1);

        // c0 = p0*v + e0 + m, c1 = p1*v + e1
        let c0 = p0.mul(&v, moduli).add(&e0, moduli).add(&plaintext.poly, moduli);
        let c1 = p1.mul(&v, moduli).add(&e1, moduli);
        Ok(self.ciphertext(vec![c0, c1], level, plaintext.scale, plaintext.bound))
    }

    fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        self.add_or_sub(a, b, false)
    }

    fn sub(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        self.add_or_sub(a, b, true)
    }

    fn multiply(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        self.check_operands(a, b, "multiply")?;
        if a.level == 0 {
            return Err(Error::NumericOverflow(
                "multiply at level 0: modulus chain exhausted".into(),
            ));
        }
        let level = a.level - 1;
        let scale = a.scale * b.scale;
        let bound = a.bound * b.bound;
        self.context.check_magnitude(bound, scale, level, "multiply")?;

        let moduli = self.context.moduli_at(a.level);
        let n = self.context.ring_dimension();
        let mut parts = vec![RnsPoly::zero(n, a.level + 1); a.parts.len() + b.parts.len() - 1];
        for (i, x) in a.parts.iter().enumerate() {
            for (j, y) in b.parts.iter().enumerate() {
                parts[i + j] = parts[i + j].add(&x.mul(y, moduli), moduli);
            }
        }
        for part in &mut parts {
            part.drop_last_limb();
        }
        Ok(self.ciphertext(parts, level, scale, bound))
    }

    fn decrypt(&self, ciphertext: &Ciphertext) -> Result<Plaintext> {
        let level = ciphertext.level;
        let moduli = self.context.moduli_at(level);
        let s = self.keys.secret.s.truncated(level + 1);

        let mut parts = ciphertext.parts.iter();
        let mut m = parts
            .next()
            .ok_or_else(|| Error::NumericOverflow("empty ciphertext".into()))?
            .clone();
        let mut s_power = s.clone();
        for part in parts {
            m = m.add(&part.mul(&s_power, moduli), moduli);
            s_power = s_power.mul(&s, moduli);
        }
        Ok(self.plaintext(m, level, ciphertext.scale, ciphertext.bound))
    }

    fn decode(&self, plaintext: &Plaintext) -> Result<f64> {
        let level = plaintext.level;
        let coeffs = plaintext.poly.to_coefficients(self.context.tables_at(level));
        let residues: Vec<u64> = coeffs.iter().map(|limb| limb[0]).collect();
        Ok(centered_crt(&residues, self.context.moduli_at(level)) / plaintext.scale)
    }

    fn live_handles(&self) -> usize {
        self.handles.live()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> EncryptionParameters {
        EncryptionParameters {
            ring_dimension: 4096,
            modulus_bits: vec![36, 36, 37],
            security: SecurityLevel::Tc128,
            scale: 2f64.powi(20),
        }
    }

    fn scheme() -> CkksScheme {
        CkksScheme::with_seed(light(), 7).unwrap()
    }

    fn roundtrip(scheme: &mut CkksScheme, value: f64) -> f64 {
        let scale = scheme.default_scale();
        let pt = scheme.encode(value, scale).unwrap();
        let ct = scheme.encrypt(&pt).unwrap();
        let out = scheme.decrypt(&ct).unwrap();
        scheme.decode(&out).unwrap()
    }

    #[test]
    fn test_encode_decode_without_encryption() {
        let scheme = scheme();
        for v in [0.0, 1.5, -6371.0, 4242.42424] {
            let pt = scheme.encode(v, scheme.default_scale()).unwrap();
            let back = scheme.decode(&pt).unwrap();
            assert!((back - v).abs() < 1e-6, "{v} decoded as {back}");
        }
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let mut scheme = scheme();
        for v in [0.0, 6371.0, -6371.0, 1234.56789, -0.001] {
            let back = roundtrip(&mut scheme, v);
            assert!((back - v).abs() < 5e-3, "{v} came back as {back}");
        }
    }

    #[test]
    fn test_sub_then_square() {
        let mut scheme = scheme();
        let scale = scheme.default_scale();
        let a = scheme.encrypt(&scheme.encode(5123.25, scale).unwrap()).unwrap();
        let b = scheme.encrypt(&scheme.encode(-812.5, scale).unwrap()).unwrap();
        let d = scheme.sub(&a, &b).unwrap();
        let d2 = scheme.multiply(&d, &d).unwrap();
        assert_eq!(d2.level(), a.level() - 1);
        assert_eq!(d2.size(), 3);
        assert_eq!(d2.scale(), scale * scale);

        let value = scheme.decode(&scheme.decrypt(&d2).unwrap()).unwrap();
        let expected = (5123.25f64 + 812.5).powi(2);
        assert!(((value - expected) / expected).abs() < 1e-6, "{value} vs {expected}");
    }

    #[test]
    fn test_add_mixes_sizes_at_same_level() {
        let mut scheme = scheme();
        let scale = scheme.default_scale();
        let x = scheme.encrypt(&scheme.encode(3.0, scale).unwrap()).unwrap();
        let x2 = scheme.multiply(&x, &x).unwrap();
        let y = scheme.encrypt(&scheme.encode(4.0, scale).unwrap()).unwrap();
        let y2 = scheme.multiply(&y, &y).unwrap();
        let sum = scheme.add(&x2, &y2).unwrap();
        let value = scheme.decode(&scheme.decrypt(&sum).unwrap()).unwrap();
        assert!((value - 25.0).abs() < 5e-2, "got {value}");
    }

    #[test]
    fn test_multiply_exhausts_levels() {
        let mut scheme = scheme();
        let scale = scheme.default_scale();
        let x = scheme.encrypt(&scheme.encode(1.0, scale).unwrap()).unwrap();
        let x2 = scheme.multiply(&x, &x).unwrap();
        // One level left but the scale is already 2^40: 2^80 cannot fit in ~36 bits
        assert!(matches!(
            scheme.multiply(&x2, &x2),
            Err(Error::NumericOverflow(_))
        ));
    }

    #[test]
    fn test_multiply_at_level_zero_is_rejected() {
        let params = EncryptionParameters {
            ring_dimension: 2048,
            modulus_bits: vec![54],
            security: SecurityLevel::Tc128,
            scale: 2f64.powi(10),
        };
        let mut scheme = CkksScheme::with_seed(params, 1).unwrap();
        assert_eq!(scheme.max_depth(), 0);
        let x = scheme.encrypt(&scheme.encode(2.0, 1024.0).unwrap()).unwrap();
        assert!(matches!(scheme.multiply(&x, &x), Err(Error::NumericOverflow(_))));
    }

    #[test]
    fn test_mismatched_operands_are_rejected() {
        let mut scheme = scheme();
        let scale = scheme.default_scale();
        let a = scheme.encrypt(&scheme.encode(1.0, scale).unwrap()).unwrap();
        let b = scheme.encrypt(&scheme.encode(1.0, scale * 2.0).unwrap()).unwrap();
        assert!(matches!(scheme.add(&a, &b), Err(Error::OperandMismatch(_))));

        let a2 = scheme.multiply(&a, &a).unwrap();
        assert!(matches!(scheme.sub(&a2, &a), Err(Error::OperandMismatch(_))));
    }

    #[test]
    fn test_encode_rejects_values_beyond_capacity() {
        let scheme = scheme();
        assert!(matches!(
            scheme.encode(1e30, scheme.default_scale()),
            Err(Error::NumericOverflow(_))
        ));
        assert!(scheme.encode(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_handles_released_on_drop() {
        let mut scheme = scheme();
        {
            let pt = scheme.encode(1.0, scheme.default_scale()).unwrap();
            let ct = scheme.encrypt(&pt).unwrap();
            let _sq = scheme.multiply(&ct, &ct).unwrap();
            assert_eq!(scheme.live_handles(), 3);
        }
        assert_eq!(scheme.live_handles(), 0);
    }

    #[test]
    fn test_invalid_parameters_fail_construction() {
        let mut params = light();
        params.security = SecurityLevel::Tc256;
        assert!(matches!(
            CkksScheme::with_seed(params, 0),
            Err(Error::Configuration(_))
        ));
    }
}
