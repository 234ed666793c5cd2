//! Tests for the sensor dispatch table as seen through the transform
//!
//! Every known sensor type must produce its label and named fields;
//! anything else must stop the run.

use crate::common::synthetic::*;
use platypus_analytics::parsers::{Parseable, Platypus, TransformError};
use platypus_analytics::sensors::SensorKind;
use serde_json::{json, Value};

fn emit_one(sensor_type: &str, data: &str) -> Result<Value, TransformError> {
    let content = log(&[
        calibration(0, 1_000_000),
        sensor(100, sensor_type, "ch7", data),
    ]);
    let records = Platypus::default().parse(&content)?;
    assert_eq!(records.len(), 1);
    Ok(serde_json::to_value(&records[0]).unwrap())
}

#[test]
fn test_battery_record() {
    let value = emit_one("BATTERY", "12.1").unwrap();
    assert_eq!(
        value,
        json!({"time": 1000100, "channel": "ch7", "sensor": "battery", "voltage": 12.1})
    );
}

#[test]
fn test_es2_record() {
    let value = emit_one("ES2", "412.5,21.75").unwrap();
    assert_eq!(
        value,
        json!({
            "time": 1000100,
            "channel": "ch7",
            "sensor": "es2",
            "ec": 412.5,
            "temperature": 21.75
        })
    );
}

#[test]
fn test_atlas_do_record() {
    let value = emit_one("ATLAS_DO", "8.21").unwrap();
    assert_eq!(value["sensor"], json!("atlas_do"));
    assert_eq!(value["oxygen"], json!(8.21));
}

#[test]
fn test_atlas_ph_record() {
    let value = emit_one("ATLAS_PH", "7.34").unwrap();
    assert_eq!(value["sensor"], json!("atlas_ph"));
    assert_eq!(value["ph"], json!(7.34));
}

#[test]
fn test_every_known_type_emits_declared_fields() {
    for kind in [
        SensorKind::Battery,
        SensorKind::Es2,
        SensorKind::AtlasDo,
        SensorKind::AtlasPh,
    ] {
        let spec = kind.spec();
        let data = vec!["1.5"; spec.arity()].join(",");
        let value = emit_one(kind.type_name(), &data).unwrap();

        assert_eq!(value["sensor"], json!(spec.label));
        for field in spec.fields {
            assert_eq!(value[*field], json!(1.5), "{} missing {}", spec.label, field);
        }
        // time, channel, sensor plus the declared fields
        assert_eq!(value.as_object().unwrap().len(), 3 + spec.arity());
    }
}

#[test]
fn test_unknown_types_always_fail() {
    for sensor_type in ["SONAR", "battery", "ATLAS_EC", "", "ES2 "] {
        let err = emit_one(sensor_type, "1.0,2.0").unwrap_err();
        match err {
            TransformError::UnknownSensor {
                sensor_type: reported,
                line,
                ..
            } => {
                assert_eq!(reported, sensor_type);
                assert_eq!(line, 2);
            }
            other => panic!("Expected unknown sensor for {:?}, got {:?}", sensor_type, other),
        }
    }
}

#[test]
fn test_short_data_fails() {
    let err = emit_one("ES2", "412.5").unwrap_err();
    match err {
        TransformError::SensorArity {
            sensor_type,
            expected,
            actual,
            ..
        } => {
            assert_eq!(sensor_type, "ES2");
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
        }
        other => panic!("Expected arity error, got {:?}", other),
    }

    assert!(matches!(
        emit_one("BATTERY", ""),
        Err(TransformError::SensorArity { .. })
    ));
}

#[test]
fn test_data_values_copied_verbatim() {
    let value = emit_one("ATLAS_PH", "\"7.0\"").unwrap();
    assert_eq!(value["ph"], json!("7.0"));

    let value = emit_one("BATTERY", "15").unwrap();
    assert_eq!(value["voltage"], json!(15));
}

#[test]
fn test_numeric_channel_is_preserved() {
    let content = log(&[
        calibration(0, 1_000),
        "1\tINFO\t{\"sensor\":{\"type\":\"BATTERY\",\"channel\":4,\"data\":[12.0]}}".to_string(),
    ]);
    let records = Platypus::default().parse(&content).unwrap();
    assert_eq!(records[0].channel, json!(4));
}

#[test]
fn test_sensor_missing_channel_fails() {
    let content = log(&[
        calibration(0, 1_000),
        "1\tINFO\t{\"sensor\":{\"type\":\"BATTERY\",\"data\":[12.0]}}".to_string(),
    ]);
    assert!(matches!(
        Platypus::default().parse(&content),
        Err(TransformError::InvalidSensor { line: 2, .. })
    ));
}
