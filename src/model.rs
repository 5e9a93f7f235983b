use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Collections that are part of the Solar API but have no normalizer.
const UNSUPPORTED_METRICS: [&str; 4] = [
    "StorageRealtimeData",
    "OhmPilotRealtimeData",
    "InverterInfo",
    "ActiveDeviceInfo",
];

/// Telemetry collection requested from the inverter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(try_from = "String")]
pub enum MetricKind {
    CommonInverterData,
    ThreePhaseInverterData,
    MinMaxInverterData,
    CumulationInverterData,
    MeterRealtimeData,
    PowerFlowRealtimeData,
}

impl MetricKind {
    /// Name used by the Solar API (`DataCollection`) and in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::CommonInverterData => "CommonInverterData",
            MetricKind::ThreePhaseInverterData => "3PInverterData",
            MetricKind::MinMaxInverterData => "MinMaxInverterData",
            MetricKind::CumulationInverterData => "CumulationInverterData",
            MetricKind::MeterRealtimeData => "MeterRealtimeData",
            MetricKind::PowerFlowRealtimeData => "PowerFlowRealtimeData",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CommonInverterData" => Ok(MetricKind::CommonInverterData),
            "3PInverterData" => Ok(MetricKind::ThreePhaseInverterData),
            "MinMaxInverterData" => Ok(MetricKind::MinMaxInverterData),
            "CumulationInverterData" => Ok(MetricKind::CumulationInverterData),
            "MeterRealtimeData" => Ok(MetricKind::MeterRealtimeData),
            "PowerFlowRealtimeData" => Ok(MetricKind::PowerFlowRealtimeData),
            _ if UNSUPPORTED_METRICS.contains(&s) => Err(Error::Configuration(format!(
                "Metric '{}' has no data processor",
                s
            ))),
            _ => Err(Error::Configuration(format!(
                "Metric '{}' is not supported",
                s
            ))),
        }
    }
}

impl TryFrom<String> for MetricKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Measurement names written to the time-series database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measurement {
    CommonInverterData,
    ThreePhaseInverterData,
    MinMaxInverterData,
    CumulationInverterData,
    MeterRealtimeData,
    PowerFlowDataInverter,
    PowerFlowDataSite,
    InverterDeviceStatus,
}

impl Measurement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Measurement::CommonInverterData => "CommonInverterData",
            Measurement::ThreePhaseInverterData => "3PInverterData",
            Measurement::MinMaxInverterData => "MinMaxInverterData",
            Measurement::CumulationInverterData => "CumulationInverterData",
            Measurement::MeterRealtimeData => "MeterRealtimeData",
            Measurement::PowerFlowDataInverter => "PowerFlowDataInverter",
            Measurement::PowerFlowDataSite => "PowerFlowDataSite",
            Measurement::InverterDeviceStatus => "InverterDeviceStatus",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    String(String),
    Boolean(bool),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

/// Time of a point.
///
/// `Local` is a wall-clock time reported by the inverter without a usable offset;
/// it is resolved against the site timezone when written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointTime {
    Local(NaiveDateTime),
    Absolute(DateTime<Utc>),
}

impl fmt::Display for PointTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointTime::Local(t) => write!(f, "{}", t.format("%Y-%m-%dT%H:%M:%S%.f")),
            PointTime::Absolute(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

pub type Fields = BTreeMap<String, FieldValue>;
pub type Tags = BTreeMap<String, String>;

/// A single normalized measurement ready for the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: Measurement,
    pub time: PointTime,
    pub fields: Fields,
    pub tags: Tags,
}

impl Point {
    pub fn new(measurement: Measurement, time: PointTime) -> Self {
        Point {
            measurement,
            time,
            fields: Fields::new(),
            tags: Tags::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn tag(mut self, key: &str, value: impl Into<String>) -> Self {
        self.tags.insert(key.to_string(), value.into());
        self
    }
}
