//! Benchmark of a privacy-preserving distance computation: two parties'
//! coordinates are projected onto a sphere, encrypted, and a third party
//! evaluates their squared Euclidean distance on ciphertexts only.

pub mod circuit;
pub mod ckks;
pub mod config;
pub mod coords;
pub mod error;
pub mod handle;
pub mod harness;
pub mod prng;
pub mod reference;
pub mod report;
pub mod scheme;
#[cfg(feature = "tfhe-backend")]
pub mod tfhe_backend;

// Re-export the public interface
pub use circuit::{
    CIRCUIT_DEPTH, DistanceEvaluator, EncryptedPoint, decrypt_distance, encrypt_point,
};
pub use ckks::{CkksScheme, EncryptionParameters, SecurityLevel};
pub use config::{Backend, BenchmarkConfig, CoordinateSource, FIXED_PAIR, Preset};
pub use coords::{CartesianPoint, CoordinateGenerator, EARTH_RADIUS_KM, GeoCoordinate};
pub use error::{Error, Result};
pub use harness::Benchmark;
pub use reference::{
    GeodesicSolution, GeodesicSolver, Wgs84Geodesic, euclidean, euclidean_squared,
};
pub use report::{
    CSV_HEADER, RecordSink, ResultsWriter, RunSummary, TrialRecord, format_table, read_records,
};
pub use scheme::HomomorphicScheme;
#[cfg(feature = "tfhe-backend")]
pub use tfhe_backend::TfheScheme;
