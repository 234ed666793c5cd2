//! Sensor dispatch table.
//!
//! Every sensor type the vehicle server reports is listed here once, together
//! with the label written to the `sensor` output field and the names given to
//! the leading entries of its `data` array. Supporting a new sensor means
//! adding a variant and its table row; the transform itself does not change.

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Known sensor types, keyed by the `type` string in the log payload
#[derive(
    AsRefStr, Clone, Copy, Debug, EnumIter, EnumString, IntoStaticStr, PartialEq, Eq, Hash,
)]
pub enum SensorKind {
    #[strum(serialize = "BATTERY")]
    Battery,
    #[strum(serialize = "ES2")]
    Es2,
    #[strum(serialize = "ATLAS_DO")]
    AtlasDo,
    #[strum(serialize = "ATLAS_PH")]
    AtlasPh,
}

/// One row of the dispatch table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorSpec {
    /// Value written to the `sensor` field of each output record
    pub label: &'static str,
    /// Output field names, one per consumed `data` entry
    pub fields: &'static [&'static str],
}

impl SensorSpec {
    /// Minimum number of `data` entries a reading must carry
    pub fn arity(&self) -> usize {
        self.fields.len()
    }
}

const BATTERY: SensorSpec = SensorSpec {
    label: "battery",
    fields: &["voltage"],
};

const ES2: SensorSpec = SensorSpec {
    label: "es2",
    fields: &["ec", "temperature"],
};

const ATLAS_DO: SensorSpec = SensorSpec {
    label: "atlas_do",
    fields: &["oxygen"],
};

const ATLAS_PH: SensorSpec = SensorSpec {
    label: "atlas_ph",
    fields: &["ph"],
};

impl SensorKind {
    /// Look up a sensor by the raw `type` string from the log
    pub fn lookup(type_name: &str) -> Option<Self> {
        type_name.parse().ok()
    }

    /// Table row for this sensor
    pub fn spec(&self) -> &'static SensorSpec {
        match self {
            SensorKind::Battery => &BATTERY,
            SensorKind::Es2 => &ES2,
            SensorKind::AtlasDo => &ATLAS_DO,
            SensorKind::AtlasPh => &ATLAS_PH,
        }
    }

    /// Raw type names accepted in log payloads, in table order
    pub fn known_types() -> Vec<&'static str> {
        Self::iter().map(|kind| kind.type_name()).collect()
    }

    /// The wire name of this sensor type (e.g. `ATLAS_DO`)
    pub fn type_name(&self) -> &'static str {
        (*self).into()
    }
}
