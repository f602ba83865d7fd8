use crate::coords::CartesianPoint;
use crate::error::{Error, Result};
use crate::scheme::HomomorphicScheme;

/// Multiplicative depth of the squared-distance circuit.
pub const CIRCUIT_DEPTH: usize = 1;

/// Component-wise encryption of a Cartesian point.
pub struct EncryptedPoint<C> {
    pub x: C,
    pub y: C,
    pub z: C,
}

/// Client side: encodes and encrypts each component; the encoded values are
/// released before returning.
pub fn encrypt_point<S: HomomorphicScheme>(
    scheme: &mut S,
    point: &CartesianPoint,
    scale: f64,
) -> Result<EncryptedPoint<S::Ciphertext>> {
    let mut encrypt = |value: f64| -> Result<S::Ciphertext> {
        let encoded = scheme.encode(value, scale)?;
        scheme.encrypt(&encoded)
    };
    Ok(EncryptedPoint {
        x: encrypt(point.x)?,
        y: encrypt(point.y)?,
        z: encrypt(point.z)?,
    })
}

/// Client side: decrypts the circuit output and takes the square root in plaintext.
pub fn decrypt_distance<S: HomomorphicScheme>(
    scheme: &S,
    squared_distance: &S::Ciphertext,
) -> Result<f64> {
    let decrypted = scheme.decrypt(squared_distance)?;
    let value = scheme.decode(&decrypted)?;
    // Approximate arithmetic can land marginally below zero for coincident points
    Ok(value.max(0.0).sqrt())
}

/// Server side: evaluates the squared Euclidean distance on ciphertexts.
pub struct DistanceEvaluator<'a, S: HomomorphicScheme> {
    scheme: &'a S,
}

impl<'a, S: HomomorphicScheme> DistanceEvaluator<'a, S> {
    /// Fails when the scheme's modulus chain is too short for the circuit.
    pub fn new(scheme: &'a S) -> Result<Self> {
        if scheme.max_depth() < CIRCUIT_DEPTH {
            return Err(Error::Configuration(format!(
                "{} supports depth {} but the distance circuit needs {CIRCUIT_DEPTH}",
                scheme.name(),
                scheme.max_depth()
            )));
        }
        Ok(Self { scheme })
    }

    /// `(Xa-Xb)^2 + (Ya-Yb)^2 + (Za-Zb)^2`; every intermediate is dropped on return.
    pub fn squared_distance(
        &self,
        a: &EncryptedPoint<S::Ciphertext>,
        b: &EncryptedPoint<S::Ciphertext>,
    ) -> Result<S::Ciphertext> {
        let s = self.scheme;
        let dx = s.sub(&a.x, &b.x)?;
        let dy = s.sub(&a.y, &b.y)?;
        let dz = s.sub(&a.z, &b.z)?;

        let dx2 = s.multiply(&dx, &dx)?;
        let dy2 = s.multiply(&dy, &dy)?;
        let dz2 = s.multiply(&dz, &dz)?;

        let partial = s.add(&dx2, &dy2)?;
        s.add(&partial, &dz2)
    }
}
