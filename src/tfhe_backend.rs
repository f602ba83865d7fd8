//! Fixed-point integers over TFHE as a second encryption backend.
//!
//! A real value `v` is carried as the integer `round(v * scale)` in an
//! `FheInt64`. Products are exact, so the scale of a product is the product of
//! the scales, and there is no depth limit. What bounds the circuit instead is
//! the 64-bit range, checked against a magnitude bound carried with each value.

use log::debug;
use tfhe::prelude::*;
use tfhe::{ClientKey, ConfigBuilder, FheInt64, generate_keys, set_server_key};

use crate::error::{Error, Result};
use crate::handle::{Handle, HandleTracker};
use crate::scheme::HomomorphicScheme;

/// Largest magnitude a scaled value may reach, leaving the sign bit and one spare bit.
const MAX_SCALED: f64 = (1u64 << 62) as f64;

#[derive(Debug)]
pub struct TfhePlaintext {
    value: i64,
    scale: f64,
    bound: f64,
    _handle: Handle,
}

pub struct TfheCiphertext {
    inner: FheInt64,
    scale: f64,
    bound: f64,
    _handle: Handle,
}

impl TfheCiphertext {
    pub fn scale(&self) -> f64 {
        self.scale
    }
}

pub struct TfheScheme {
    client_key: ClientKey,
    scale: f64,
    handles: HandleTracker,
}

impl TfheScheme {
    /// Generates keys and installs the server key on the calling thread.
    pub fn new(scale: f64) -> Result<Self> {
        if !(scale.is_finite() && scale >= 1.0) {
            return Err(Error::Configuration(format!(
                "fixed-point scale must be at least 1, got {scale}"
            )));
        }
        let config = ConfigBuilder::default().build();
        let (client_key, server_keys) = generate_keys(config);
        set_server_key(server_keys);
        debug!("TFHE keys generated, scale 2^{:.1}", scale.log2());
        Ok(Self {
            client_key,
            scale,
            handles: HandleTracker::new(),
        })
    }

    fn check_range(bound: f64, scale: f64, op: &str) -> Result<()> {
        if bound * scale >= MAX_SCALED {
            return Err(Error::NumericOverflow(format!(
                "{op} would reach {:.3e}, beyond the 64-bit range",
                bound * scale
            )));
        }
        Ok(())
    }

    fn check_scales(a: &TfheCiphertext, b: &TfheCiphertext, op: &str) -> Result<()> {
        if a.scale != b.scale {
            return Err(Error::OperandMismatch(format!(
                "{op} between scales {} and {}",
                a.scale, b.scale
            )));
        }
        Ok(())
    }

    fn ciphertext(&self, inner: FheInt64, scale: f64, bound: f64) -> TfheCiphertext {
        TfheCiphertext {
            inner,
            scale,
            bound,
            _handle: self.handles.acquire(),
        }
    }
}

impl HomomorphicScheme for TfheScheme {
    type Plaintext = TfhePlaintext;
    type Ciphertext = TfheCiphertext;

    fn name(&self) -> &'static str {
        "tfhe"
    }

    fn default_scale(&self) -> f64 {
        self.scale
    }

    fn max_depth(&self) -> usize {
        usize::MAX
    }

    fn encode(&self, value: f64, scale: f64) -> Result<TfhePlaintext> {
        if !value.is_finite() || !(scale.is_finite() && scale >= 1.0) {
            return Err(Error::NumericOverflow(format!(
                "cannot encode {value} at scale {scale}"
            )));
        }
        let bound = value.abs();
        Self::check_range(bound, scale, "encode")?;
        Ok(TfhePlaintext {
            value: (value * scale).round() as i64,
            scale,
            bound,
            _handle: self.handles.acquire(),
        })
    }

    fn encrypt(&mut self, plaintext: &TfhePlaintext) -> Result<TfheCiphertext> {
        let inner = FheInt64::try_encrypt(plaintext.value, &self.client_key)
            .map_err(|e| Error::Backend(e.to_string()))?;
        Ok(self.ciphertext(inner, plaintext.scale, plaintext.bound))
    }

    fn add(&self, a: &TfheCiphertext, b: &TfheCiphertext) -> Result<TfheCiphertext> {
        Self::check_scales(a, b, "add")?;
        let bound = a.bound + b.bound;
        Self::check_range(bound, a.scale, "add")?;
        Ok(self.ciphertext(&a.inner + &b.inner, a.scale, bound))
    }

    fn sub(&self, a: &TfheCiphertext, b: &TfheCiphertext) -> Result<TfheCiphertext> {
        Self::check_scales(a, b, "sub")?;
        let bound = a.bound + b.bound;
        Self::check_range(bound, a.scale, "sub")?;
        Ok(self.ciphertext(&a.inner - &b.inner, a.scale, bound))
    }

    fn multiply(&self, a: &TfheCiphertext, b: &TfheCiphertext) -> Result<TfheCiphertext> {
        let scale = a.scale * b.scale;
        let bound = a.bound * b.bound;
        Self::check_range(bound, scale, "multiply")?;
        Ok(self.ciphertext(&a.inner * &b.inner, scale, bound))
    }

    fn decrypt(&self, ciphertext: &TfheCiphertext) -> Result<TfhePlaintext> {
        let value: i64 = ciphertext.inner.decrypt(&self.client_key);
        Ok(TfhePlaintext {
            value,
            scale: ciphertext.scale,
            bound: ciphertext.bound,
            _handle: self.handles.acquire(),
        })
    }

    fn decode(&self, plaintext: &TfhePlaintext) -> Result<f64> {
        Ok(plaintext.value as f64 / plaintext.scale)
    }

    fn live_handles(&self) -> usize {
        self.handles.live()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TFHE_SCALE;

    #[test]
    fn test_encode_is_checked_against_the_integer_range() {
        let scheme = TfheScheme::new(TFHE_SCALE).unwrap();
        assert!(scheme.encode(6371.0, TFHE_SCALE).is_ok());
        assert!(matches!(
            scheme.encode(1e17, TFHE_SCALE),
            Err(Error::NumericOverflow(_))
        ));
        assert!(matches!(TfheScheme::new(0.5), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_sub_then_square_is_exact_in_fixed_point() {
        let mut scheme = TfheScheme::new(TFHE_SCALE).unwrap();
        let a = scheme.encrypt(&scheme.encode(12.5, TFHE_SCALE).unwrap()).unwrap();
        let b = scheme.encrypt(&scheme.encode(-3.25, TFHE_SCALE).unwrap()).unwrap();
        let d = scheme.sub(&a, &b).unwrap();
        let d2 = scheme.multiply(&d, &d).unwrap();
        assert_eq!(d2.scale(), TFHE_SCALE * TFHE_SCALE);
        let value = scheme.decode(&scheme.decrypt(&d2).unwrap()).unwrap();
        assert_eq!(value, 15.75 * 15.75);
    }
}
