//! Benchmark presets.
//!
//! Every variant of the benchmark is one `BenchmarkConfig`: the encryption
//! parameters, how many trials to run and where the coordinates come from.

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;

use crate::ckks::{EncryptionParameters, SecurityLevel};
use crate::coords::{EARTH_RADIUS_KM, GeoCoordinate};
use crate::error::{Error, Result};

pub const DEFAULT_OUTPUT: &str = "results.csv";
pub const DEFAULT_ITERATIONS: usize = 100;
pub const DEFAULT_PROGRESS_INTERVAL: usize = 50;

/// Encoding scale shared by the CKKS presets.
pub const CKKS_SCALE: f64 = 1_048_576.0; // 2^20

/// Fixed-point scale of the integer backend; squared once by the circuit.
pub const TFHE_SCALE: f64 = 1024.0; // 2^10

pub const FIXED_PAIR: (GeoCoordinate, GeoCoordinate) = (
    GeoCoordinate {
        latitude: 32.92374,
        longitude: 32.03947,
    },
    GeoCoordinate {
        latitude: 18.03473,
        longitude: 24.08465,
    },
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// N=16384, chain [60,40,30,30,30,30], 192-bit security, seeded coordinates
    HighPrecision,
    /// N=4096, chain [36,36,37], 128-bit security, seeded coordinates
    Light,
    /// Light parameters on the fixed coordinate pair
    Fixed,
    /// Fixed-point integers over TFHE (needs the `tfhe-backend` feature)
    Tfhe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Ckks,
    Tfhe,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Ckks => write!(f, "ckks"),
            Backend::Tfhe => write!(f, "tfhe"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateSource {
    /// A fresh pair per trial, seeded with the trial index.
    Seeded,
    /// The same pair for every trial.
    Fixed(GeoCoordinate, GeoCoordinate),
}

#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub backend: Backend,
    /// Also carries the encoding scale for the integer backend, which ignores the chain.
    pub params: EncryptionParameters,
    /// Recorded trials; one extra warm-up trial runs first.
    pub iterations: usize,
    pub coordinates: CoordinateSource,
    pub radius_km: f64,
    pub progress_interval: usize,
    pub output: PathBuf,
    /// Seeds key generation and encryption randomness when set.
    pub key_seed: Option<u64>,
}

fn high_precision_params() -> EncryptionParameters {
    EncryptionParameters {
        ring_dimension: 16384,
        modulus_bits: vec![60, 40, 30, 30, 30, 30],
        security: SecurityLevel::Tc192,
        scale: CKKS_SCALE,
    }
}

fn light_params() -> EncryptionParameters {
    EncryptionParameters {
        ring_dimension: 4096,
        modulus_bits: vec![36, 36, 37],
        security: SecurityLevel::Tc128,
        scale: CKKS_SCALE,
    }
}

impl BenchmarkConfig {
    pub fn from_preset(preset: Preset) -> Self {
        let (backend, params, coordinates) = match preset {
            Preset::HighPrecision => (
                Backend::Ckks,
                high_precision_params(),
                CoordinateSource::Seeded,
            ),
            Preset::Light => (Backend::Ckks, light_params(), CoordinateSource::Seeded),
            Preset::Fixed => (
                Backend::Ckks,
                light_params(),
                CoordinateSource::Fixed(FIXED_PAIR.0, FIXED_PAIR.1),
            ),
            Preset::Tfhe => (
                Backend::Tfhe,
                EncryptionParameters {
                    scale: TFHE_SCALE,
                    ..light_params()
                },
                CoordinateSource::Seeded,
            ),
        };
        Self {
            backend,
            params,
            iterations: DEFAULT_ITERATIONS,
            coordinates,
            radius_km: EARTH_RADIUS_KM,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            output: PathBuf::from(DEFAULT_OUTPUT),
            key_seed: None,
        }
    }

    /// Checks the harness settings. Encryption parameters are checked when
    /// the scheme is built from them.
    pub fn validate(&self) -> Result<()> {
        if self.progress_interval == 0 {
            return Err(Error::Configuration("progress interval must be positive".into()));
        }
        if !(self.radius_km.is_finite() && self.radius_km > 0.0) {
            return Err(Error::Configuration(format!(
                "sphere radius must be positive, got {}",
                self.radius_km
            )));
        }
        Ok(())
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self::from_preset(Preset::HighPrecision)
    }
}
