//! Plaintext ground truth for the encrypted distance.

use geo::{Distance, Geodesic, Point};

use crate::coords::{CartesianPoint, GeoCoordinate};

pub fn euclidean_squared(a: &CartesianPoint, b: &CartesianPoint) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    dx * dx + dy * dy + dz * dz
}

/// Chord length between two points on the sphere.
pub fn euclidean(a: &CartesianPoint, b: &CartesianPoint) -> f64 {
    euclidean_squared(a, b).sqrt()
}

/// Result of an inverse geodesic problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodesicSolution {
    pub distance_m: f64,
}

impl GeodesicSolution {
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }
}

pub trait GeodesicSolver {
    fn inverse(&self, a: &GeoCoordinate, b: &GeoCoordinate) -> GeodesicSolution;
}

/// Karney's algorithm on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wgs84Geodesic;

impl GeodesicSolver for Wgs84Geodesic {
    fn inverse(&self, a: &GeoCoordinate, b: &GeoCoordinate) -> GeodesicSolution {
        let pa = Point::new(a.longitude, a.latitude);
        let pb = Point::new(b.longitude, b.latitude);
        GeodesicSolution {
            distance_m: Geodesic.distance(pa, pb),
        }
    }
}
