//! Common test utilities shared across all test modules
//!
//! This module provides helper functions for reading example logs,
//! building synthetic log lines, and comparing floats.

#![allow(dead_code)]

use std::path::Path;

/// Helper function to read a text file, panicking with a clear message if not found.
/// This ensures CI catches missing example files instead of silently skipping tests.
pub fn read_example_file(file_path: &str) -> String {
    std::fs::read_to_string(file_path)
        .unwrap_or_else(|e| panic!("Failed to read example file '{}': {}", file_path, e))
}

/// Check if an example file exists (useful for conditional tests)
pub fn example_file_exists(file_path: &str) -> bool {
    Path::new(file_path).exists()
}

/// Example log file paths
pub mod example_files {
    pub const PLATYPUS_SURVEY: &str = "exampleLogs/platypus/platypus_20160519_013623.txt";
}

/// Builders for synthetic log lines
pub mod synthetic {
    /// `<millis>\tINFO\t{"date":true,"time":<time>}`
    pub fn calibration(millis: i64, time: i64) -> String {
        format!("{}\tINFO\t{{\"date\":true,\"time\":{}}}", millis, time)
    }

    /// Pose line with the given easting, northing and zone string
    pub fn pose(millis: i64, easting: f64, northing: f64, zone: &str) -> String {
        format!(
            "{}\tINFO\t{{\"pose\":{{\"p\":[{:?},{:?},0.0],\"zone\":\"{}\"}}}}",
            millis, easting, northing, zone
        )
    }

    /// Sensor line; `data` is inserted verbatim as the JSON array body
    pub fn sensor(millis: i64, sensor_type: &str, channel: &str, data: &str) -> String {
        format!(
            "{}\tINFO\t{{\"sensor\":{{\"type\":\"{}\",\"channel\":\"{}\",\"data\":[{}]}}}}",
            millis, sensor_type, channel, data
        )
    }

    /// Join lines with `\n` (and a trailing newline)
    pub fn log(lines: &[String]) -> String {
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// Float comparison helpers for testing
pub mod float_cmp {
    /// Check if two floats are approximately equal within a tolerance
    pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    /// Assert that two floats are approximately equal
    pub fn assert_approx_eq(a: f64, b: f64, tolerance: f64) {
        assert!(
            approx_eq(a, b, tolerance),
            "Values not approximately equal: {} vs {} (tolerance: {})",
            a,
            b,
            tolerance
        );
    }

    /// Default tolerance for coordinate comparisons in degrees
    pub const DEFAULT_TOLERANCE: f64 = 0.0001;
}
