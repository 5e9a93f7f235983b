use serde_json::Value;

use crate::api::response::Envelope;
use crate::coerce;
use crate::directory::InverterDirectory;
use crate::model::{FieldValue, Fields, Measurement, Point, PointTime};

const COMMON_FIELDS: [&str; 9] = [
    "FAC",
    "IAC",
    "IDC",
    "PAC",
    "UAC",
    "UDC",
    "DAY_ENERGY",
    "YEAR_ENERGY",
    "TOTAL_ENERGY",
];

const THREE_PHASE_FIELDS: [&str; 6] = ["IAC_L1", "IAC_L2", "IAC_L3", "UAC_L1", "UAC_L2", "UAC_L3"];

const MIN_MAX_FIELDS: [&str; 9] = [
    "DAY_PMAX",
    "DAY_UACMAX",
    "DAY_UDCMAX",
    "YEAR_PMAX",
    "YEAR_UACMAX",
    "YEAR_UDCMAX",
    "TOTAL_PMAX",
    "TOTAL_UACMAX",
    "TOTAL_UDCMAX",
];

const CUMULATION_FIELDS: [&str; 4] = ["PAC", "DAY_ENERGY", "YEAR_ENERGY", "TOTAL_ENERGY"];

/// Extra CommonInverterData groups reported by multi-tracker inverters (Symo GEN24).
/// A group is emitted only when its first raw key is present; pairs are (raw key, field).
const TRACKER_GROUPS: [&[(&str, &str)]; 4] = [
    &[("SAC", "SAC")],
    &[("IDC_2", "IDC_MPP2"), ("UDC_2", "UDC_MPP2")],
    &[("IDC_3", "IDC_MPP3"), ("UDC_3", "UDC_MPP3")],
    &[("IDC_4", "IDC_MPP4"), ("UDC_4", "UDC_MPP4")],
];

fn wrapped_fields(data: &Value, names: &[&str]) -> Fields {
    names
        .iter()
        .map(|name| {
            (
                name.to_string(),
                FieldValue::Float(coerce::float_from_wrapped(data, name)),
            )
        })
        .collect()
}

/// Copies the device status object as-is, keeping scalar values only.
fn device_status_fields(status: &Value) -> Fields {
    let mut fields = Fields::new();
    if let Some(status) = status.as_object() {
        for (key, value) in status {
            let value = match value {
                Value::Number(n) => match n.as_i64() {
                    Some(i) => FieldValue::Integer(i),
                    None => FieldValue::Float(n.as_f64().unwrap_or(0.0)),
                },
                Value::Bool(b) => FieldValue::Boolean(*b),
                Value::String(s) => FieldValue::String(s.clone()),
                _ => continue,
            };
            fields.insert(key.clone(), value);
        }
    }
    fields
}

fn tagged_point(
    measurement: Measurement,
    names: &[&str],
    envelope: &Envelope,
    time: PointTime,
    directory: &InverterDirectory,
) -> Point {
    let args = envelope.request_arguments;
    let device_id = coerce::string_value(args, "DeviceId");
    let collection = coerce::string_value(args, "DataCollection");
    if !collection.is_empty() && collection != measurement.as_str() {
        log::warn!(
            "requested {} but device answered with {}",
            measurement,
            collection
        );
    }

    let mut point = Point::new(measurement, time)
        .tag("DeviceId", device_id.as_str())
        .tag("Serial", directory.lookup(&device_id));
    point.fields = wrapped_fields(envelope.data, names);
    point
}

pub fn three_phase(envelope: &Envelope, time: PointTime, directory: &InverterDirectory) -> Point {
    tagged_point(
        Measurement::ThreePhaseInverterData,
        &THREE_PHASE_FIELDS,
        envelope,
        time,
        directory,
    )
}

pub fn min_max(envelope: &Envelope, time: PointTime, directory: &InverterDirectory) -> Point {
    tagged_point(
        Measurement::MinMaxInverterData,
        &MIN_MAX_FIELDS,
        envelope,
        time,
        directory,
    )
}

pub fn cumulation(envelope: &Envelope, time: PointTime, directory: &InverterDirectory) -> Point {
    tagged_point(
        Measurement::CumulationInverterData,
        &CUMULATION_FIELDS,
        envelope,
        time,
        directory,
    )
}

/// CommonInverterData plus a separate `InverterDeviceStatus` point.
///
/// Tracker groups are added only when the device reports them.
pub fn common(envelope: &Envelope, time: PointTime, directory: &InverterDirectory) -> Vec<Point> {
    let data = envelope.data;
    let mut point = tagged_point(
        Measurement::CommonInverterData,
        &COMMON_FIELDS,
        envelope,
        time,
        directory,
    );

    for group in TRACKER_GROUPS.iter() {
        if coerce::optional(data, group[0].0).is_none() {
            continue;
        }
        for (raw, name) in group.iter() {
            point = point.field(name, coerce::float_from_wrapped(data, raw));
        }
    }

    let mut points = Vec::with_capacity(2);
    let status_fields = device_status_fields(coerce::child(data, "DeviceStatus"));
    if status_fields.is_empty() {
        log::debug!("no DeviceStatus in {} response", Measurement::CommonInverterData);
    } else {
        let mut status = Point::new(Measurement::InverterDeviceStatus, time);
        status.tags = point.tags.clone();
        status.fields = status_fields;
        points.push(status);
    }
    points.push(point);
    points
}
