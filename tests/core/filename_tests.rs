//! Tests for log filename date extraction

use chrono::{Datelike, TimeZone, Timelike, Utc};
use platypus_analytics::filename::{date_from_filename, FilenameError};
use std::path::Path;

#[test]
fn test_known_log_names() {
    let cases = [
        ("airboat_20130807_063622.txt", (2013, 8, 7, 6, 36, 22)),
        ("airboat_20151220_043348.txt", (2015, 12, 20, 4, 33, 48)),
        ("platypus_20160426_024734.txt", (2016, 4, 26, 2, 47, 34)),
        ("platypus_20160519_013623.txt", (2016, 5, 19, 1, 36, 23)),
    ];

    for (name, (y, mo, d, h, mi, s)) in cases {
        let date = date_from_filename(name).unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap(), "{}", name);
    }
}

#[test]
fn test_month_is_one_based() {
    let date = date_from_filename("platypus_20161231_235959.txt").unwrap();
    assert_eq!(date.month(), 12);
    assert_eq!(date.day(), 31);
    assert_eq!(date.hour(), 23);
}

#[test]
fn test_directories_are_ignored() {
    let path = Path::new("/var/log/airboat_2013/platypus_20160519_013623.txt");
    assert!(date_from_filename(path).is_ok());
}

#[test]
fn test_rejected_names() {
    for name in [
        "platypus.txt",
        "platypus_20160519.txt",
        "rover_20160519_013623.txt",
        "platypus_20160519_013623.txt.bak",
    ] {
        assert_eq!(
            date_from_filename(name),
            Err(FilenameError::NoMatch(name.to_string()))
        );
    }
}

#[test]
fn test_error_message_names_file() {
    let err = date_from_filename("mystery.log").unwrap_err();
    assert!(err.to_string().contains("mystery.log"));
}
