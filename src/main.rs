use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use ckks_gps_distance::{
    Backend, Benchmark, BenchmarkConfig, CkksScheme, CoordinateSource, FIXED_PAIR,
    HomomorphicScheme, Preset, ResultsWriter, RunSummary, format_table,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CoordinateMode {
    Seeded,
    Fixed,
}

/// Encrypted GPS distance benchmark. Without flags, runs the high-precision
/// preset for 100 trials and writes results.csv.
#[derive(Parser)]
#[command(name = "ckks-gps-distance")]
struct Opt {
    #[arg(long, value_enum, default_value_t = Preset::HighPrecision)]
    preset: Preset,
    /// Recorded trials (one warm-up trial always runs first)
    #[arg(long)]
    iterations: Option<usize>,
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Log progress every this many trials
    #[arg(long)]
    progress_interval: Option<usize>,
    #[arg(long, value_enum)]
    coordinates: Option<CoordinateMode>,
    /// Seed key generation and encryption randomness for a reproducible run
    #[arg(long)]
    key_seed: Option<u64>,
}

impl Opt {
    fn into_config(self) -> BenchmarkConfig {
        let mut config = BenchmarkConfig::from_preset(self.preset);
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(interval) = self.progress_interval {
            config.progress_interval = interval;
        }
        match self.coordinates {
            Some(CoordinateMode::Seeded) => config.coordinates = CoordinateSource::Seeded,
            Some(CoordinateMode::Fixed) => {
                config.coordinates = CoordinateSource::Fixed(FIXED_PAIR.0, FIXED_PAIR.1)
            }
            None => {}
        }
        config.key_seed = self.key_seed;
        config
    }
}

fn run<S: HomomorphicScheme>(scheme: S, config: BenchmarkConfig) -> Result<RunSummary> {
    let mut bench = Benchmark::new(scheme, config)?;
    let output = bench.config().output.clone();
    let mut writer = ResultsWriter::create(&output)
        .with_context(|| format!("creating {}", output.display()))?;
    let summary = bench.run(&mut writer)?;
    println!("\nResults written to {}", writer.path().display());
    Ok(summary)
}

#[cfg(feature = "tfhe-backend")]
fn run_tfhe(config: BenchmarkConfig) -> Result<RunSummary> {
    let scheme = ckks_gps_distance::TfheScheme::new(config.params.scale)?;
    run(scheme, config)
}

#[cfg(not(feature = "tfhe-backend"))]
fn run_tfhe(_config: BenchmarkConfig) -> Result<RunSummary> {
    anyhow::bail!("the tfhe preset needs a build with `--features tfhe-backend`")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Opt::parse().into_config();

    info!(
        "Backend {}: N={}, chain {:?}, {} security, scale 2^{:.0}",
        config.backend,
        config.params.ring_dimension,
        config.params.modulus_bits,
        config.params.security,
        config.params.scale.log2()
    );

    let backend = config.backend;
    let summary = match backend {
        Backend::Ckks => {
            let scheme = match config.key_seed {
                Some(seed) => CkksScheme::with_seed(config.params.clone(), seed)?,
                None => CkksScheme::new(config.params.clone())?,
            };
            run(scheme, config)?
        }
        Backend::Tfhe => run_tfhe(config)?,
    };

    println!("\nSummary:\n");
    println!("{}", format_table(&[(backend.to_string(), summary)]));
    Ok(())
}
