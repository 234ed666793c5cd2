//! Streaming transform for Platypus vehicle server logs.
//!
//! Each line is `<millis>\t<level>\t<json>`. Calibration lines anchor the
//! millisecond offsets to an absolute instant, pose lines move the rolling
//! location estimate, and sensor lines are emitted as flattened records
//! stamped with the time and location in effect at that line.

use serde::Serialize;
use serde_json::Value;
use std::io;
use std::iter::FusedIterator;
use thiserror::Error;

use super::types::{LineFault, LogLine, OutputRecord, Parseable, Payload, Pose, SensorReading};
use crate::coords::{utm_to_lat_lon, Location, UtmZone};
use crate::sensors::SensorKind;

// ============================================================================
// Error Types
// ============================================================================

/// Fatal conditions that stop a transform run. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Could not read the next input line
    #[error("Failed to read log line {line}: {source}")]
    Io {
        line: usize,
        #[source]
        source: io::Error,
    },

    /// Line does not have three tab-separated fields
    #[error("Malformed log line {line}: '{text}'")]
    MalformedLine { line: usize, text: String },

    /// Millisecond offset is not a non-negative integer
    #[error("Invalid time offset on line {line}: '{text}'")]
    InvalidOffset { line: usize, text: String },

    /// Payload is not valid JSON
    #[error("Invalid JSON payload on line {line}: '{message}': {source}")]
    InvalidJson {
        line: usize,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// A non-calibration line arrived before any calibration
    #[error("Datestamp must precede message on line {line}: '{message}'")]
    MissingTimeBase { line: usize, message: String },

    /// Pose body is malformed or lacks numeric easting and northing
    #[error("Invalid pose on line {line}: '{message}'")]
    InvalidPose { line: usize, message: String },

    /// Zone string does not match `<digits><North|South>`
    #[error("Unable to interpret UTM zone on line {line}: '{message}'")]
    InvalidZone { line: usize, message: String },

    /// Sensor body lacks `type`, `channel` or `data`
    #[error("Invalid sensor reading on line {line}: '{message}'")]
    InvalidSensor { line: usize, message: String },

    /// Sensor type is not in the dispatch table
    #[error("Cannot handle sensor of type '{sensor_type}' on line {line}: '{message}'")]
    UnknownSensor {
        line: usize,
        sensor_type: String,
        message: String,
    },

    /// Sensor reading has fewer data values than its type requires
    #[error("Sensor {sensor_type} on line {line} needs {expected} data values, got {actual}: '{message}'")]
    SensorArity {
        line: usize,
        sensor_type: &'static str,
        expected: usize,
        actual: usize,
        message: String,
    },

    /// Payload matched no known shape while running in strict mode
    #[error("Unrecognized payload on line {line}: '{message}'")]
    UnrecognizedPayload { line: usize, message: String },
}

impl TransformError {
    /// Line number the error was raised on
    pub fn line(&self) -> usize {
        match self {
            TransformError::Io { line, .. }
            | TransformError::MalformedLine { line, .. }
            | TransformError::InvalidOffset { line, .. }
            | TransformError::InvalidJson { line, .. }
            | TransformError::MissingTimeBase { line, .. }
            | TransformError::InvalidPose { line, .. }
            | TransformError::InvalidZone { line, .. }
            | TransformError::InvalidSensor { line, .. }
            | TransformError::UnknownSensor { line, .. }
            | TransformError::SensorArity { line, .. }
            | TransformError::UnrecognizedPayload { line, .. } => *line,
        }
    }
}

// ============================================================================
// Rolling State
// ============================================================================

/// State carried from line to line within one log file
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RollingState {
    /// Absolute instant (epoch ms) corresponding to offset 0
    pub time_base: Option<i64>,
    /// Position from the most recent pose update
    pub location: Option<Location>,
}

impl RollingState {
    /// Re-anchor so that `time_base + millis == time` for the calibrating line
    pub fn calibrate(&mut self, time: i64, millis: i64) {
        self.time_base = Some(time.saturating_sub(millis));
    }

    /// Absolute time for an offset under the current time-base
    pub fn timestamp(&self, millis: i64) -> Option<i64> {
        self.time_base.map(|base| base.saturating_add(millis))
    }
}

/// Counters for one transform run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    /// Non-blank lines consumed
    pub lines: usize,
    pub calibrations: usize,
    pub poses: usize,
    /// Output records emitted
    pub records: usize,
    /// Payloads matching no known shape
    pub ignored: usize,
}

// ============================================================================
// Parser
// ============================================================================

/// Platypus vehicle server log parser
#[derive(Clone, Copy, Debug, Default)]
pub struct Platypus {
    /// Treat unrecognized payloads as fatal instead of skipping them
    pub strict: bool,
}

impl Platypus {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Start a lazy transform over `lines` with fresh rolling state
    pub fn transform<I, S>(&self, lines: I) -> Transform<I>
    where
        I: Iterator<Item = io::Result<S>>,
        S: AsRef<str>,
    {
        Transform {
            lines,
            state: RollingState::default(),
            stats: TransformStats::default(),
            strict: self.strict,
            line_number: 0,
            finished: false,
        }
    }
}

impl Parseable for Platypus {
    fn parse(&self, file_contents: &str) -> Result<Vec<OutputRecord>, TransformError> {
        self.transform(file_contents.lines().map(Ok::<_, io::Error>))
            .collect()
    }
}

/// Lazy sequence of output records. Stops after the first error.
pub struct Transform<I> {
    lines: I,
    state: RollingState,
    stats: TransformStats,
    strict: bool,
    line_number: usize,
    finished: bool,
}

impl<I> Transform<I> {
    pub fn state(&self) -> &RollingState {
        &self.state
    }

    pub fn stats(&self) -> TransformStats {
        self.stats
    }

    fn process_line(&mut self, raw: &str) -> Result<Option<OutputRecord>, TransformError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        self.stats.lines += 1;
        let line_no = self.line_number;

        let line = LogLine::parse(raw).map_err(|fault| match fault {
            LineFault::MissingFields => TransformError::MalformedLine {
                line: line_no,
                text: raw.to_string(),
            },
            LineFault::InvalidOffset => TransformError::InvalidOffset {
                line: line_no,
                text: raw.to_string(),
            },
        })?;

        let value: Value =
            serde_json::from_str(line.message).map_err(|source| TransformError::InvalidJson {
                line: line_no,
                message: line.message.to_string(),
                source,
            })?;

        match Payload::classify(value) {
            Payload::Calibration { time } => {
                self.state.calibrate(time, line.millis);
                self.stats.calibrations += 1;
                tracing::debug!(
                    "Line {}: time-base anchored at {:?}",
                    line_no,
                    self.state.time_base
                );
                Ok(None)
            }
            Payload::Pose(body) => {
                self.require_time_base(&line)?;
                let location = self.locate(body, &line)?;
                self.state.location = Some(location);
                self.stats.poses += 1;
                Ok(None)
            }
            Payload::Sensor(body) => {
                let time = self.require_time_base(&line)?;
                let record = self.build_record(time, body, &line)?;
                self.stats.records += 1;
                Ok(Some(record))
            }
            Payload::Unrecognized => {
                self.require_time_base(&line)?;
                if self.strict {
                    return Err(TransformError::UnrecognizedPayload {
                        line: line_no,
                        message: line.message.to_string(),
                    });
                }
                self.stats.ignored += 1;
                tracing::debug!("Line {}: ignoring payload {}", line_no, line.message);
                Ok(None)
            }
        }
    }

    /// Absolute time for this line, or an error if no calibration has been seen
    fn require_time_base(&self, line: &LogLine<'_>) -> Result<i64, TransformError> {
        self.state
            .timestamp(line.millis)
            .ok_or_else(|| TransformError::MissingTimeBase {
                line: self.line_number,
                message: line.message.to_string(),
            })
    }

    fn locate(&self, body: Value, line: &LogLine<'_>) -> Result<Location, TransformError> {
        let invalid_pose = || TransformError::InvalidPose {
            line: self.line_number,
            message: line.message.to_string(),
        };

        let pose: Pose = serde_json::from_value(body).map_err(|_| invalid_pose())?;
        let (Some(easting), Some(northing)) = (
            pose.p.first().and_then(Value::as_f64),
            pose.p.get(1).and_then(Value::as_f64),
        ) else {
            return Err(invalid_pose());
        };

        let zone = UtmZone::parse(&pose.zone).ok_or_else(|| TransformError::InvalidZone {
            line: self.line_number,
            message: line.message.to_string(),
        })?;

        let location = utm_to_lat_lon(easting, northing, zone);
        tracing::debug!(
            "Line {}: pose {:.1}E {:.1}N {} -> {:.6}, {:.6}",
            self.line_number,
            easting,
            northing,
            zone,
            location.latitude,
            location.longitude
        );
        Ok(location)
    }

    fn build_record(
        &self,
        time: i64,
        body: Value,
        line: &LogLine<'_>,
    ) -> Result<OutputRecord, TransformError> {
        let reading: SensorReading =
            serde_json::from_value(body).map_err(|_| TransformError::InvalidSensor {
                line: self.line_number,
                message: line.message.to_string(),
            })?;

        let sensor = SensorKind::lookup(&reading.sensor_type).ok_or_else(|| {
            TransformError::UnknownSensor {
                line: self.line_number,
                sensor_type: reading.sensor_type.clone(),
                message: line.message.to_string(),
            }
        })?;

        let arity = sensor.spec().arity();
        if reading.data.len() < arity {
            return Err(TransformError::SensorArity {
                line: self.line_number,
                sensor_type: sensor.type_name(),
                expected: arity,
                actual: reading.data.len(),
                message: line.message.to_string(),
            });
        }

        let mut values = reading.data;
        values.truncate(arity);

        Ok(OutputRecord {
            time,
            location: self.state.location,
            channel: reading.channel,
            sensor,
            values,
        })
    }
}

impl<I, S> Iterator for Transform<I>
where
    I: Iterator<Item = io::Result<S>>,
    S: AsRef<str>,
{
    type Item = Result<OutputRecord, TransformError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let next = self.lines.next();
            self.line_number += 1;

            let result = match next {
                None => {
                    self.finished = true;
                    return None;
                }
                Some(Err(source)) => Err(TransformError::Io {
                    line: self.line_number,
                    source,
                }),
                Some(Ok(line)) => self.process_line(line.as_ref()),
            };

            match result {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<I, S> FusedIterator for Transform<I>
where
    I: Iterator<Item = io::Result<S>>,
    S: AsRef<str>,
{
}
