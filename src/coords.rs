//! UTM zone parsing and UTM to WGS84 conversion.
//!
//! Pose updates report position as UTM easting/northing plus a zone string
//! such as `31North`. This module turns that into geographic latitude and
//! longitude for the output records.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Zone grammar used by the vehicle server: zone number followed by the hemisphere name
static UTM_ZONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<zone>\d+)(?<hemi>North|South)$").expect("Invalid regex pattern")
});

// WGS84 ellipsoid and UTM projection constants
const K0: f64 = 0.9996;
const EQUATORIAL_RADIUS: f64 = 6_378_137.0;
const ECC_SQUARED: f64 = 0.006_694_38;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Hemisphere half of a UTM zone designation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Hemisphere {
    North,
    South,
}

/// A parsed UTM zone (e.g. `31North`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct UtmZone {
    pub number: u8,
    pub hemisphere: Hemisphere,
}

impl UtmZone {
    /// Parse a zone string of the form `<digits><North|South>`.
    ///
    /// Returns `None` if the string does not match the grammar or the zone
    /// number lies outside 1..=60.
    pub fn parse(zone: &str) -> Option<Self> {
        let captures = UTM_ZONE_REGEX.captures(zone)?;
        let number: u8 = captures["zone"].parse().ok()?;
        if !(1..=60).contains(&number) {
            return None;
        }

        let hemisphere = match &captures["hemi"] {
            "North" => Hemisphere::North,
            _ => Hemisphere::South,
        };

        Some(Self { number, hemisphere })
    }

    pub fn is_north(&self) -> bool {
        self.hemisphere == Hemisphere::North
    }

    /// Longitude of the zone's central meridian in degrees
    pub fn central_meridian(&self) -> f64 {
        (self.number as f64 - 1.0) * 6.0 - 180.0 + 3.0
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hemi = match self.hemisphere {
            Hemisphere::North => "North",
            Hemisphere::South => "South",
        };
        write!(f, "{}{}", self.number, hemi)
    }
}

/// Geographic position in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Convert UTM easting/northing within `zone` to WGS84 latitude/longitude.
///
/// Pure function. Non-finite input propagates to non-finite output.
pub fn utm_to_lat_lon(easting: f64, northing: f64, zone: UtmZone) -> Location {
    let e = ECC_SQUARED;
    let e2 = e * e;
    let e3 = e2 * e;
    let e_p2 = e / (1.0 - e);

    let sqrt_e = (1.0 - e).sqrt();
    let n1 = (1.0 - sqrt_e) / (1.0 + sqrt_e);
    let n2 = n1 * n1;
    let n3 = n2 * n1;
    let n4 = n3 * n1;
    let n5 = n4 * n1;

    let m1 = 1.0 - e / 4.0 - 3.0 * e2 / 64.0 - 5.0 * e3 / 256.0;
    let p2 = 3.0 / 2.0 * n1 - 27.0 / 32.0 * n3 + 269.0 / 512.0 * n5;
    let p3 = 21.0 / 16.0 * n2 - 55.0 / 32.0 * n4;
    let p4 = 151.0 / 96.0 * n3 - 417.0 / 128.0 * n5;
    let p5 = 1097.0 / 512.0 * n4;

    let x = easting - FALSE_EASTING;
    let y = if zone.is_north() {
        northing
    } else {
        northing - FALSE_NORTHING_SOUTH
    };

    // Footpoint latitude
    let m = y / K0;
    let mu = m / (EQUATORIAL_RADIUS * m1);
    let p_rad = mu
        + p2 * (2.0 * mu).sin()
        + p3 * (4.0 * mu).sin()
        + p4 * (6.0 * mu).sin()
        + p5 * (8.0 * mu).sin();

    let p_sin = p_rad.sin();
    let p_sin2 = p_sin * p_sin;
    let p_cos = p_rad.cos();
    let p_tan = p_sin / p_cos;
    let p_tan2 = p_tan * p_tan;
    let p_tan4 = p_tan2 * p_tan2;

    let ep_sin = 1.0 - e * p_sin2;
    let ep_sin_sqrt = ep_sin.sqrt();

    let n = EQUATORIAL_RADIUS / ep_sin_sqrt;
    let r = (1.0 - e) / ep_sin;

    let c = e_p2 * p_cos * p_cos;
    let c2 = c * c;

    let d = x / (n * K0);
    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d3 * d;
    let d5 = d4 * d;
    let d6 = d5 * d;

    let latitude = p_rad
        - (p_tan / r)
            * (d2 / 2.0 - d4 / 24.0 * (5.0 + 3.0 * p_tan2 + 10.0 * c - 4.0 * c2 - 9.0 * e_p2))
        + d6 / 720.0 * (61.0 + 90.0 * p_tan2 + 298.0 * c + 45.0 * p_tan4 - 252.0 * e_p2 - 3.0 * c2);

    let longitude = (d - d3 / 6.0 * (1.0 + 2.0 * p_tan2 + c)
        + d5 / 120.0 * (5.0 - 2.0 * c + 28.0 * p_tan2 - 3.0 * c2 + 8.0 * e_p2 + 24.0 * p_tan4))
        / p_cos;

    Location {
        latitude: latitude.to_degrees(),
        longitude: wrap_longitude(longitude.to_degrees() + zone.central_meridian()),
    }
}

/// Wrap a longitude in degrees into [-180, 180)
fn wrap_longitude(degrees: f64) -> f64 {
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}
