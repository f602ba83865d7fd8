//! Drives the trials of a benchmark run.
//!
//! Trial 0 warms caches and allocators and is never recorded. Every trial
//! owns its encoded values and ciphertexts; they are dropped before the next
//! trial starts, which is checked against the scheme's live-handle count.

use std::hint::black_box;
use std::time::Instant;

use log::{debug, info};

use crate::circuit::{DistanceEvaluator, decrypt_distance, encrypt_point};
use crate::config::{BenchmarkConfig, CoordinateSource};
use crate::coords::{CoordinateGenerator, GeoCoordinate};
use crate::error::{Error, Result};
use crate::reference::{self, GeodesicSolver, Wgs84Geodesic};
use crate::report::{RecordSink, RunSummary, TrialRecord};
use crate::scheme::HomomorphicScheme;

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Trials left, counting the current one, when that count is a multiple of
/// `interval`. Trials run from 0 to `total` inclusive.
fn remaining_at(total: usize, iteration: usize, interval: usize) -> Option<usize> {
    let remaining = total + 1 - iteration;
    (remaining % interval == 0).then_some(remaining)
}

pub struct Benchmark<S: HomomorphicScheme, G: GeodesicSolver = Wgs84Geodesic> {
    scheme: S,
    geodesic: G,
    generator: CoordinateGenerator,
    config: BenchmarkConfig,
}

impl<S: HomomorphicScheme> Benchmark<S> {
    pub fn new(scheme: S, config: BenchmarkConfig) -> Result<Self> {
        Self::with_geodesic(scheme, Wgs84Geodesic, config)
    }
}

impl<S: HomomorphicScheme, G: GeodesicSolver> Benchmark<S, G> {
    /// Fails before any trial if the settings are invalid or the scheme
    /// cannot evaluate the distance circuit.
    pub fn with_geodesic(scheme: S, geodesic: G, config: BenchmarkConfig) -> Result<Self> {
        config.validate()?;
        DistanceEvaluator::new(&scheme)?;
        Ok(Self {
            scheme,
            geodesic,
            generator: CoordinateGenerator::new(),
            config,
        })
    }

    pub fn scheme(&self) -> &S {
        &self.scheme
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    fn coordinates(&mut self, iteration: usize) -> (GeoCoordinate, GeoCoordinate) {
        match self.config.coordinates {
            CoordinateSource::Seeded => self.generator.generate_pair(iteration as i64),
            CoordinateSource::Fixed(a, b) => (a, b),
        }
    }

    /// Runs the warm-up trial and `config.iterations` recorded ones, handing
    /// each record to `sink` as soon as its trial has completed.
    pub fn run(&mut self, sink: &mut dyn RecordSink) -> Result<RunSummary> {
        let total = self.config.iterations;
        info!(
            "Running {} trials on {} (plus one warm-up)",
            total,
            self.scheme.name()
        );
        let mut summary = RunSummary::default();
        for iteration in 0..=total {
            let record = self.run_trial(iteration)?;

            let live = self.scheme.live_handles();
            if live != 0 {
                return Err(Error::Leak { iteration, live });
            }

            if let Some(remaining) = remaining_at(total, iteration, self.config.progress_interval) {
                info!("{remaining} remaining");
            }

            if iteration == 0 {
                debug!("Warm-up trial discarded: {record:?}");
                continue;
            }
            sink.record(&record)?;
            summary.push(&record);
        }
        info!("Finished {} trials", summary.trials);
        Ok(summary)
    }

    /// One trial end to end. Only the server-side circuit is timed as the
    /// encrypted time, and only the plaintext Euclidean as the unencrypted time.
    pub fn run_trial(&mut self, iteration: usize) -> Result<TrialRecord> {
        let (a, b) = self.coordinates(iteration);
        let radius = self.config.radius_km;
        let pa = a.to_cartesian(radius);
        let pb = b.to_cartesian(radius);

        let scale = self.scheme.default_scale();
        let encrypted_a = encrypt_point(&mut self.scheme, &pa, scale)?;
        let encrypted_b = encrypt_point(&mut self.scheme, &pb, scale)?;

        let evaluator = DistanceEvaluator::new(&self.scheme)?;
        let start = Instant::now();
        let squared = evaluator.squared_distance(&encrypted_a, &encrypted_b)?;
        let encrypted_time_ms = elapsed_ms(start);
        let encrypted_distance_km = decrypt_distance(&self.scheme, &squared)?;

        let start = Instant::now();
        let plaintext_distance_km =
            black_box(reference::euclidean(black_box(&pa), black_box(&pb)));
        let plaintext_time_ms = elapsed_ms(start);

        let reference_distance_km = self.geodesic.inverse(&a, &b).distance_km();

        debug!(
            "Trial {iteration}: ({:.5}, {:.5}) -> ({:.5}, {:.5}): encrypted {encrypted_distance_km:.5} km, plain {plaintext_distance_km:.5} km",
            a.latitude, a.longitude, b.latitude, b.longitude
        );
        Ok(TrialRecord {
            iteration,
            encrypted_time_ms,
            plaintext_time_ms,
            encrypted_distance_km,
            plaintext_distance_km,
            reference_distance_km,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ckks::CkksScheme;
    use crate::config::Preset;
    use crate::reference::GeodesicSolution;

    /// Great-circle distance on the benchmark sphere, so reference gaps are predictable.
    struct SphericalGeodesic;

    impl GeodesicSolver for SphericalGeodesic {
        fn inverse(&self, a: &GeoCoordinate, b: &GeoCoordinate) -> GeodesicSolution {
            let chord = reference::euclidean(&a.to_cartesian(1.0), &b.to_cartesian(1.0));
            let angle = 2.0 * (chord / 2.0).asin();
            GeodesicSolution {
                distance_m: angle * 6_371_000.0,
            }
        }
    }

    fn light_config(iterations: usize) -> BenchmarkConfig {
        let mut config = BenchmarkConfig::from_preset(Preset::Light);
        config.iterations = iterations;
        config.progress_interval = 2;
        config
    }

    fn light_scheme(config: &BenchmarkConfig) -> CkksScheme {
        CkksScheme::with_seed(config.params.clone(), 5).unwrap()
    }

    #[test]
    fn test_warm_up_is_not_recorded() {
        let config = light_config(3);
        let mut bench = Benchmark::new(light_scheme(&config), config).unwrap();
        let mut records: Vec<TrialRecord> = Vec::new();
        let summary = bench.run(&mut records).unwrap();

        let iterations: Vec<usize> = records.iter().map(|r| r.iteration).collect();
        assert_eq!(iterations, vec![1, 2, 3]);
        assert_eq!(summary.trials, 3);
        assert_eq!(bench.scheme().live_handles(), 0);
    }

    #[test]
    fn test_trial_uses_the_seeded_pair() {
        let config = light_config(1);
        let mut bench =
            Benchmark::with_geodesic(light_scheme(&config), SphericalGeodesic, config).unwrap();
        let record = bench.run_trial(0).unwrap();
        assert!((record.plaintext_distance_km - 8644.8575).abs() < 1e-3);
        assert!(
            (record.encrypted_distance_km - record.plaintext_distance_km).abs() < 0.05,
            "{record:?}"
        );
        // Great circle is always longer than the chord
        assert!(record.reference_distance_km > record.plaintext_distance_km);
        assert!(record.encrypted_time_ms > 0.0);
    }

    #[test]
    fn test_fixed_source_repeats_the_pair() {
        let mut config = BenchmarkConfig::from_preset(Preset::Fixed);
        config.iterations = 2;
        let mut bench = Benchmark::new(light_scheme(&config), config).unwrap();
        let first = bench.run_trial(1).unwrap();
        let second = bench.run_trial(2).unwrap();
        assert_eq!(first.plaintext_distance_km, second.plaintext_distance_km);
        assert!((first.plaintext_distance_km - 1830.0381).abs() < 1e-3);
    }

    #[test]
    fn test_progress_counts_down_every_interval() {
        let logged: Vec<(usize, usize)> = (0..=100)
            .filter_map(|i| remaining_at(100, i, 50).map(|r| (i, r)))
            .collect();
        assert_eq!(logged, vec![(1, 100), (51, 50)]);

        let logged: Vec<usize> = (0..=3).filter_map(|i| remaining_at(3, i, 2)).collect();
        assert_eq!(logged, vec![4, 2]);
    }

    #[test]
    fn test_invalid_config_fails_before_any_trial() {
        let mut config = light_config(1);
        config.progress_interval = 0;
        let scheme = light_scheme(&config);
        assert!(matches!(
            Benchmark::new(scheme, config),
            Err(Error::Configuration(_))
        ));
    }
}
