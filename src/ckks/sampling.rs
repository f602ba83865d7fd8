//! Secret, error and mask distributions.
//!
//! - secret and encryption mask: uniform ternary {-1, 0, 1}
//! - error: rounded Gaussian, sigma = 3.2, cut at six standard deviations
//! - public key `a`: uniform in Z_q, sampled directly in the NTT domain

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{Error, Result};

pub const ERROR_STD_DEV: f64 = 3.2;
const ERROR_BOUND: f64 = 6.0 * ERROR_STD_DEV;

#[derive(Debug, Clone)]
pub struct ErrorDistribution {
    normal: Normal<f64>,
}

impl ErrorDistribution {
    pub fn new() -> Result<Self> {
        let normal = Normal::new(0.0, ERROR_STD_DEV)
            .map_err(|e| Error::Configuration(format!("error distribution: {e}")))?;
        Ok(Self { normal })
    }

    pub fn sample<R: Rng>(&self, rng: &mut R, n: usize) -> Vec<i64> {
        (0..n)
            .map(|_| loop {
                let x = self.normal.sample(rng);
                if x.abs() <= ERROR_BOUND {
                    break x.round() as i64;
                }
            })
            .collect()
    }
}

pub fn sample_ternary<R: Rng>(rng: &mut R, n: usize) -> Vec<i64> {
    (0..n).map(|_| rng.gen_range(-1i64..=1)).collect()
}

pub fn sample_uniform<R: Rng>(rng: &mut R, n: usize, q: u64) -> Vec<u64> {
    (0..n).map(|_| rng.gen_range(0..q)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_ternary_distribution() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let samples = sample_ternary(&mut rng, 9000);
        for v in [-1, 0, 1] {
            let count = samples.iter().filter(|&&s| s == v).count();
            assert!((2700..3300).contains(&count), "{v} drawn {count} times");
        }
    }

    #[test]
    fn test_error_distribution_moments() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let samples = ErrorDistribution::new().unwrap().sample(&mut rng, 20_000);
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<i64>() as f64 / n;
        let var = samples.iter().map(|&x| (x as f64 - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 0.15, "mean {mean}");
        assert!((var.sqrt() - ERROR_STD_DEV).abs() < 0.2, "sigma {}", var.sqrt());
        assert!(samples.iter().all(|x| (x.abs() as f64) <= ERROR_BOUND + 0.5));
    }

    #[test]
    fn test_uniform_range() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        assert!(sample_uniform(&mut rng, 1000, 97).iter().all(|&v| v < 97));
    }
}
