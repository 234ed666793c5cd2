//! Tests for UTM zone parsing and coordinate conversion
//!
//! Reference points are well-known survey locations; tolerances are
//! about a metre.

use crate::common::float_cmp::*;
use platypus_analytics::coords::{utm_to_lat_lon, Hemisphere, UtmZone};

#[test]
fn test_zone_grammar() {
    for zone in ["1North", "17North", "31North", "56South", "60South", "07North"] {
        assert!(UtmZone::parse(zone).is_some(), "{} should parse", zone);
    }
    for zone in ["17N", "17S", "North", "17 South", "-17North", "17.5North", "17Northern"] {
        assert!(UtmZone::parse(zone).is_none(), "{} should not parse", zone);
    }
}

#[test]
fn test_zone_fields() {
    let zone = UtmZone::parse("07North").unwrap();
    assert_eq!(zone.number, 7);
    assert_eq!(zone.hemisphere, Hemisphere::North);
    assert_eq!(zone.to_string(), "7North");
}

#[test]
fn test_central_meridian_points() {
    for number in [1u8, 10, 31, 45, 60] {
        let zone = UtmZone {
            number,
            hemisphere: Hemisphere::North,
        };
        let location = utm_to_lat_lon(500_000.0, 1_000_000.0, zone);
        assert_approx_eq(location.longitude, zone.central_meridian(), 1e-9);
        assert!(location.latitude > 9.0 && location.latitude < 9.1);
    }
}

#[test]
fn test_new_york_city_hall() {
    let zone = UtmZone::parse("18North").unwrap();
    let location = utm_to_lat_lon(583_960.0, 4_507_523.0, zone);
    assert_approx_eq(location.latitude, 40.71435, DEFAULT_TOLERANCE);
    assert_approx_eq(location.longitude, -74.00597, DEFAULT_TOLERANCE);
}

#[test]
fn test_conversion_is_deterministic() {
    let zone = UtmZone::parse("17North").unwrap();
    let a = utm_to_lat_lon(584_210.3, 4_477_012.8, zone);
    let b = utm_to_lat_lon(584_210.3, 4_477_012.8, zone);
    assert_eq!(a, b);
}

#[test]
fn test_increasing_northing_moves_north() {
    let zone = UtmZone::parse("17North").unwrap();
    let south = utm_to_lat_lon(584_210.0, 4_477_000.0, zone);
    let north = utm_to_lat_lon(584_210.0, 4_478_000.0, zone);
    assert!(north.latitude > south.latitude);
    // One kilometre is roughly 0.009 degrees of latitude
    assert_approx_eq(north.latitude - south.latitude, 0.009, 0.0005);
}

#[test]
fn test_increasing_easting_moves_east() {
    let zone = UtmZone::parse("56South").unwrap();
    let west = utm_to_lat_lon(330_000.0, 6_250_000.0, zone);
    let east = utm_to_lat_lon(340_000.0, 6_250_000.0, zone);
    assert!(east.longitude > west.longitude);
    assert!(west.latitude < 0.0 && east.latitude < 0.0);
}
