use std::f64::consts::PI;

use crate::prng::SeededRandom;

/// Mean Earth radius used for the spherical projection.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Decimal places kept when a coordinate is generated.
pub const COORDINATE_DECIMALS: usize = 5;

/// Latitude/longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Projects onto a sphere of `radius_km` (phi = latitude, lambda = longitude).
    pub fn to_cartesian(&self, radius_km: f64) -> CartesianPoint {
        let phi = self.latitude * (PI / 180.0);
        let lambda = self.longitude * (PI / 180.0);
        CartesianPoint {
            x: radius_km * phi.cos() * lambda.cos(),
            y: radius_km * phi.cos() * lambda.sin(),
            z: radius_km * phi.sin(),
        }
    }
}

/// A point in R^3, in kilometres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CartesianPoint {
    pub fn components(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Rounds through the decimal representation, so the stored value is exactly
/// the one a reader of the printed coordinate would parse back.
///
/// Exact halfway cases round away from zero. `format!` would round them to
/// even, so they are handled first.
fn fix_decimals(value: f64) -> f64 {
    // A binary value lies exactly halfway between two 5-decimal numbers iff
    // it is an odd multiple of 2^-6; value * 10^5 is then exact.
    let sixty_fourths = value * 64.0;
    if sixty_fourths.fract() == 0.0 && sixty_fourths % 2.0 != 0.0 {
        return (value * 1e5).round() / 1e5;
    }
    format!("{value:.prec$}", prec = COORDINATE_DECIMALS)
        .parse()
        .unwrap_or(value)
}

/// Produces the two parties' coordinates for a trial.
#[derive(Debug, Clone)]
pub struct CoordinateGenerator {
    rng: SeededRandom,
}

impl Default for CoordinateGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinateGenerator {
    pub fn new() -> Self {
        Self {
            rng: SeededRandom::new(0),
        }
    }

    pub fn set_seed(&mut self, seed: i64) {
        self.rng.set_seed(seed);
    }

    pub fn next(&mut self) -> f64 {
        self.rng.next_f64()
    }

    fn latitude(&mut self) -> f64 {
        fix_decimals(self.next() * 180.0 - 90.0)
    }

    fn longitude(&mut self) -> f64 {
        fix_decimals(self.next() * 360.0 - 180.0)
    }

    /// Reseeds and draws latA, lonA, latB, lonB in that order.
    pub fn generate_pair(&mut self, seed: i64) -> (GeoCoordinate, GeoCoordinate) {
        self.set_seed(seed);
        let lat_a = self.latitude();
        let lon_a = self.longitude();
        let lat_b = self.latitude();
        let lon_b = self.longitude();
        (
            GeoCoordinate::new(lat_a, lon_a),
            GeoCoordinate::new(lat_b, lon_b),
        )
    }
}
