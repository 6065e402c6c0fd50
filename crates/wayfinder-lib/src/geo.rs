//! Coordinate types and projection between geographic and planar systems.
//!
//! Building geometry is stored in a planar coordinate system (metres) so that
//! nearest-neighbour comparisons are not distorted by longitude convergence.
//! Callers speak WGS-84 longitude/latitude; this module converts at the store
//! boundary in both directions and nowhere else.
//!
//! The default storage system is EPSG:2180 ("PUWG 1992"), a single-zone
//! Transverse Mercator on the GRS80 ellipsoid. Buildings authored in local CAD
//! coordinates use [`CoordinateSystem::Local`], which maps coordinates through
//! unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// GRS80 semi-major axis in metres.
const GRS80_A: f64 = 6_378_137.0;
/// GRS80 flattening.
const GRS80_F: f64 = 1.0 / 298.257_222_101;

/// A WGS-84 geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// `true` when both components are finite and inside the valid degree ranges.
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    fn coordinates(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.7}, {:.7})", self.lon, self.lat)
    }
}

/// A point in the planar storage coordinate system, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another planar point.
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub(crate) fn as_array(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// GeoJSON geometry emitted in route results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
    LineString { coordinates: Vec<[f64; 2]> },
}

impl Geometry {
    pub fn point(point: GeoPoint) -> Self {
        Geometry::Point {
            coordinates: point.coordinates(),
        }
    }

    pub fn line_string(points: &[GeoPoint]) -> Self {
        Geometry::LineString {
            coordinates: points.iter().map(GeoPoint::coordinates).collect(),
        }
    }
}

/// Storage coordinate systems understood by the graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    /// EPSG:2180 Transverse Mercator (GRS80, 19°E, k0 = 0.9993).
    #[default]
    Puwg1992,
    /// Local planar coordinates; geographic input and output pass through unchanged.
    Local,
}

impl CoordinateSystem {
    /// Project a geographic point into the storage system.
    pub fn project(&self, point: GeoPoint) -> PlanarPoint {
        match self {
            CoordinateSystem::Puwg1992 => PUWG_1992.forward(point),
            CoordinateSystem::Local => PlanarPoint::new(point.lon, point.lat),
        }
    }

    /// Convert a storage point back to geographic coordinates.
    pub fn unproject(&self, point: PlanarPoint) -> GeoPoint {
        match self {
            CoordinateSystem::Puwg1992 => PUWG_1992.inverse(point),
            CoordinateSystem::Local => GeoPoint::new(point.x, point.y),
        }
    }

    pub fn srid(&self) -> Option<u32> {
        match self {
            CoordinateSystem::Puwg1992 => Some(2180),
            CoordinateSystem::Local => None,
        }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            CoordinateSystem::Puwg1992 => "2180",
            CoordinateSystem::Local => "local",
        };
        f.write_str(value)
    }
}

impl FromStr for CoordinateSystem {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "2180" | "epsg:2180" | "puwg1992" => Ok(CoordinateSystem::Puwg1992),
            "local" | "none" => Ok(CoordinateSystem::Local),
            other => Err(Error::invalid_graph(format!(
                "unsupported coordinate system '{other}'"
            ))),
        }
    }
}

/// Transverse Mercator parameters on an ellipsoid (Snyder, USGS PP 1395).
struct TransverseMercator {
    a: f64,
    f: f64,
    lon0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
}

const PUWG_1992: TransverseMercator = TransverseMercator {
    a: GRS80_A,
    f: GRS80_F,
    lon0: 19.0,
    k0: 0.9993,
    false_easting: 500_000.0,
    false_northing: -5_300_000.0,
};

impl TransverseMercator {
    fn e2(&self) -> f64 {
        self.f * (2.0 - self.f)
    }

    /// Meridional arc length from the equator to `phi` (radians).
    fn meridian_arc(&self, phi: f64) -> f64 {
        let e2 = self.e2();
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        self.a
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    fn forward(&self, point: GeoPoint) -> PlanarPoint {
        let e2 = self.e2();
        let ep2 = e2 / (1.0 - e2);
        let phi = point.lat.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = self.a / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let a = (point.lon - self.lon0).to_radians() * cos_phi;
        let m = self.meridian_arc(phi);

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let x = self.k0
            * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0);
        let y = self.k0
            * (m + n
                * tan_phi
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));

        PlanarPoint::new(x + self.false_easting, y + self.false_northing)
    }

    fn inverse(&self, point: PlanarPoint) -> GeoPoint {
        let e2 = self.e2();
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = e2 / (1.0 - e2);

        let x = point.x - self.false_easting;
        let m = (point.y - self.false_northing) / self.k0;
        let mu = m / (self.a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

        let root = (1.0 - e2).sqrt();
        let e1 = (1.0 - root) / (1.0 + root);
        let e1_2 = e1 * e1;
        let e1_3 = e1_2 * e1;
        let e1_4 = e1_3 * e1;

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();
        let c1 = ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let denom = 1.0 - e2 * sin_phi1 * sin_phi1;
        let n1 = self.a / denom.sqrt();
        let r1 = self.a * (1.0 - e2) / denom.powf(1.5);
        let d = x / (n1 * self.k0);

        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d3 * d;
        let d5 = d4 * d;
        let d6 = d5 * d;

        let phi = phi1
            - (n1 * tan_phi1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d6
                        / 720.0);
        let lambda = (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d5
                / 120.0)
            / cos_phi1;

        GeoPoint::new(self.lon0 + lambda.to_degrees(), phi.to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn central_meridian_maps_to_false_easting() {
        let planar = CoordinateSystem::Puwg1992.project(GeoPoint::new(19.0, 52.0));
        assert!((planar.x - 500_000.0).abs() < 1e-6);
        // 52°N lies roughly 459 km north of the shifted origin.
        assert!((planar.y - 459_309.0).abs() < 5.0, "northing was {}", planar.y);
    }

    #[test]
    fn projection_round_trips_near_the_central_meridian() {
        let cs = CoordinateSystem::Puwg1992;
        for &(lon, lat) in &[(21.0122, 52.2297), (16.9252, 52.4064), (19.0004, 52.0002)] {
            let original = GeoPoint::new(lon, lat);
            let back = cs.unproject(cs.project(original));
            assert!((back.lon - lon).abs() < 1e-8, "lon drift at {original}");
            assert!((back.lat - lat).abs() < 1e-8, "lat drift at {original}");
        }
    }

    #[test]
    fn planar_distance_follows_ground_distance() {
        let cs = CoordinateSystem::Puwg1992;
        let a = cs.project(GeoPoint::new(21.0, 52.0));
        // ~0.001° of latitude is ~111 m on the ground.
        let b = cs.project(GeoPoint::new(21.0, 52.001));
        let d = a.distance_to(&b);
        assert!((d - 111.3).abs() < 1.0, "distance was {d}");
    }

    #[test]
    fn local_system_is_identity() {
        let cs = CoordinateSystem::Local;
        let planar = cs.project(GeoPoint::new(12.5, -3.0));
        assert_eq!(planar, PlanarPoint::new(12.5, -3.0));
        assert_eq!(cs.unproject(planar), GeoPoint::new(12.5, -3.0));
    }

    #[test]
    fn coordinate_system_parses_srid_strings() {
        assert_eq!(
            "EPSG:2180".parse::<CoordinateSystem>().unwrap(),
            CoordinateSystem::Puwg1992
        );
        assert_eq!(
            "local".parse::<CoordinateSystem>().unwrap(),
            CoordinateSystem::Local
        );
        assert!("4326".parse::<CoordinateSystem>().is_err());
    }

    #[test]
    fn geo_point_validation_rejects_out_of_range() {
        assert!(GeoPoint::new(19.0, 52.0).is_valid());
        assert!(!GeoPoint::new(190.0, 52.0).is_valid());
        assert!(!GeoPoint::new(19.0, f64::NAN).is_valid());
    }

    #[test]
    fn geometry_serializes_as_geojson() {
        let json = serde_json::to_string(&Geometry::point(GeoPoint::new(19.5, 52.1))).unwrap();
        assert_eq!(json, r#"{"type":"Point","coordinates":[19.5,52.1]}"#);

        let line = Geometry::line_string(&[GeoPoint::new(1.0, 2.0), GeoPoint::new(3.0, 4.0)]);
        let json = serde_json::to_string(&line).unwrap();
        assert_eq!(
            json,
            r#"{"type":"LineString","coordinates":[[1.0,2.0],[3.0,4.0]]}"#
        );
    }
}
