//! Start date extraction from vehicle log file names.
//!
//! The vehicle server names its logs `airboat_YYYYMMDD_HHMMSS.txt` (older
//! firmware) or `platypus_YYYYMMDD_HHMMSS.txt`, stamped in UTC.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

static LOGFILE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:airboat|platypus)_(?<year>\d{4})(?<month>\d{2})(?<day>\d{2})_(?<hour>\d{2})(?<minute>\d{2})(?<second>\d{2})\.txt(?:\.gz)?$",
    )
    .expect("Invalid regex pattern")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilenameError {
    #[error("File did not match Platypus log naming: {0}")]
    NoMatch(String),

    #[error("Log file name holds an invalid date: {0}")]
    InvalidDate(String),
}

/// Parse the UTC start instant encoded in a log file name.
///
/// The month digits are a calendar month (`05` is May). Older tooling fed them
/// to a zero-based month API and stamped such logs one month late.
pub fn date_from_filename(path: impl AsRef<Path>) -> Result<DateTime<Utc>, FilenameError> {
    let path = path.as_ref().to_string_lossy();
    let captures = LOGFILE_REGEX
        .captures(&path)
        .ok_or_else(|| FilenameError::NoMatch(path.to_string()))?;

    // All groups are fixed-width digit runs, so these parses cannot fail
    let field = |name: &str| captures[name].parse::<u32>().unwrap_or_default();
    let year = captures["year"].parse::<i32>().unwrap_or_default();

    NaiveDate::from_ymd_opt(year, field("month"), field("day"))
        .and_then(|date| date.and_hms_opt(field("hour"), field("minute"), field("second")))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| FilenameError::InvalidDate(path.to_string()))
}
