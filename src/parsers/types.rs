use chrono::{DateTime, SecondsFormat};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::platypus::TransformError;
use crate::coords::Location;
use crate::sensors::SensorKind;

/// A raw log line split into its three tab-separated fields
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLine<'a> {
    /// Offset in milliseconds from the current time-base
    pub millis: i64,
    /// Log level label (not used downstream)
    pub level: &'a str,
    /// JSON payload text
    pub message: &'a str,
}

/// Why a line could not be split into a [`LogLine`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineFault {
    MissingFields,
    InvalidOffset,
}

impl<'a> LogLine<'a> {
    /// Split `<millis>\t<level>\t<json>`. Fields after the third are ignored.
    pub fn parse(line: &'a str) -> Result<Self, LineFault> {
        let mut fields = line.split('\t');
        let (Some(millis), Some(level), Some(message)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(LineFault::MissingFields);
        };

        let millis: i64 = millis
            .trim()
            .parse()
            .ok()
            .filter(|m: &i64| *m >= 0)
            .ok_or(LineFault::InvalidOffset)?;

        Ok(Self {
            millis,
            level,
            message,
        })
    }
}

/// Pose payload body: `{"p": [easting, northing, ...], "zone": "31North"}`
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Pose {
    /// Only the first two entries are read; the rest may hold anything
    pub p: Vec<Value>,
    pub zone: String,
}

/// Sensor payload body: `{"type": "ES2", "channel": ..., "data": [...]}`
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SensorReading {
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub channel: Value,
    pub data: Vec<Value>,
}

/// The recognized payload shapes, in dispatch priority order
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Re-anchors the time-base: `time` is the absolute instant in epoch milliseconds
    Calibration { time: i64 },
    /// Raw `pose` object, deserialized by the transform
    Pose(Value),
    /// Raw `sensor` object, deserialized by the transform
    Sensor(Value),
    Unrecognized,
}

impl Payload {
    /// Classify a decoded payload. Calibration wins over pose, pose over sensor.
    pub fn classify(mut value: Value) -> Self {
        let Some(object) = value.as_object_mut() else {
            return Payload::Unrecognized;
        };

        let date = object.get("date").is_some_and(is_truthy);
        if date {
            if let Some(time) = object.get("time").filter(|t| is_truthy(t)).and_then(as_epoch_millis)
            {
                return Payload::Calibration { time };
            }
        }

        if object.get("pose").is_some_and(is_truthy) {
            return Payload::Pose(object.remove("pose").unwrap_or_default());
        }

        if object.get("sensor").is_some_and(is_truthy) {
            return Payload::Sensor(object.remove("sensor").unwrap_or_default());
        }

        Payload::Unrecognized
    }
}

/// Loose truthiness, as the vehicle server's JSON writer treats flags
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn as_epoch_millis(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
}

/// How the `time` field of output records is rendered
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum TimeFormat {
    /// Integer milliseconds since the Unix epoch
    #[default]
    EpochMillis,
    /// RFC 3339 UTC string with millisecond precision
    Rfc3339,
}

/// One flattened, timestamped, geo-tagged sensor record
#[derive(Clone, Debug, PartialEq)]
pub struct OutputRecord {
    /// Absolute instant in epoch milliseconds
    pub time: i64,
    /// Position from the most recent pose, if any
    pub location: Option<Location>,
    pub channel: Value,
    pub sensor: SensorKind,
    /// Leading `data` values, aligned with `sensor.spec().fields`
    pub values: Vec<Value>,
}

impl OutputRecord {
    /// Value of a sensor-specific field by output name (e.g. `"voltage"`)
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.sensor
            .spec()
            .fields
            .iter()
            .position(|f| *f == name)
            .and_then(|i| self.values.get(i))
    }

    /// The record time as an RFC 3339 UTC string, if representable
    pub fn time_rfc3339(&self) -> Option<String> {
        DateTime::from_timestamp_millis(self.time)
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Borrow this record for serialization with the given time format
    pub fn formatted(&self, time_format: TimeFormat) -> FormattedRecord<'_> {
        FormattedRecord {
            record: self,
            time_format,
        }
    }
}

/// Serializes an [`OutputRecord`] with a chosen [`TimeFormat`]
#[derive(Clone, Copy, Debug)]
pub struct FormattedRecord<'a> {
    record: &'a OutputRecord,
    time_format: TimeFormat,
}

impl Serialize for FormattedRecord<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let record = self.record;
        let spec = record.sensor.spec();
        let location_len = if record.location.is_some() { 2 } else { 0 };

        let mut map = serializer.serialize_map(Some(3 + location_len + spec.arity()))?;
        match self.time_format {
            TimeFormat::EpochMillis => map.serialize_entry("time", &record.time)?,
            TimeFormat::Rfc3339 => match record.time_rfc3339() {
                Some(time) => map.serialize_entry("time", &time)?,
                None => map.serialize_entry("time", &record.time)?,
            },
        }
        if let Some(location) = &record.location {
            map.serialize_entry("latitude", &location.latitude)?;
            map.serialize_entry("longitude", &location.longitude)?;
        }
        map.serialize_entry("channel", &record.channel)?;
        map.serialize_entry("sensor", spec.label)?;
        for (field, value) in spec.fields.iter().zip(&record.values) {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

impl Serialize for OutputRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.formatted(TimeFormat::EpochMillis).serialize(serializer)
    }
}

/// Trait for whole-file log parsers
pub trait Parseable {
    fn parse(&self, data: &str) -> Result<Vec<OutputRecord>, TransformError>;
}
