use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::api::response::Envelope;
use crate::coerce;
use crate::model::{FieldValue, Measurement, Point, PointTime};

pub const METER_MANUFACTURER: &str = "Fronius";

pub const KNOWN_METER_MODELS: [&str; 9] = [
    "Smart Meter 63A",
    "Smart Meter 63A-1",
    "Smart Meter 63A-3",
    "Smart Meter 50kA-3",
    "Smart Meter TS 65A-3",
    "Smart Meter TS 100A-1",
    "Smart Meter TS 5kA-3",
    "Smart Meter IP",
    "Smart Meter WR",
];

const FLOAT_FIELDS: [&str; 34] = [
    "Current_AC_Phase_1",
    "Current_AC_Phase_2",
    "Current_AC_Phase_3",
    "Current_AC_Sum",
    "EnergyReactive_VArAC_Sum_Consumed",
    "EnergyReactive_VArAC_Sum_Produced",
    "EnergyReal_WAC_Minus_Absolute",
    "EnergyReal_WAC_Plus_Absolute",
    "EnergyReal_WAC_Sum_Consumed",
    "EnergyReal_WAC_Sum_Produced",
    "Frequency_Phase_Average",
    "Meter_Location_Current",
    "PowerApparent_S_Phase_1",
    "PowerApparent_S_Phase_2",
    "PowerApparent_S_Phase_3",
    "PowerApparent_S_Sum",
    "PowerFactor_Phase_1",
    "PowerFactor_Phase_2",
    "PowerFactor_Phase_3",
    "PowerFactor_Sum",
    "PowerReactive_Q_Phase_1",
    "PowerReactive_Q_Phase_2",
    "PowerReactive_Q_Phase_3",
    "PowerReactive_Q_Sum",
    "PowerReal_P_Phase_1",
    "PowerReal_P_Phase_2",
    "PowerReal_P_Phase_3",
    "PowerReal_P_Sum",
    "Voltage_AC_PhaseToPhase_12",
    "Voltage_AC_PhaseToPhase_23",
    "Voltage_AC_PhaseToPhase_31",
    "Voltage_AC_Phase_1",
    "Voltage_AC_Phase_2",
    "Voltage_AC_Phase_3",
];

const INTEGER_FIELDS: [&str; 2] = ["Enable", "Visible"];

/// Reason a meter entry is not written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    Manufacturer(String),
    Model(String),
}

fn accept(details: &Value) -> Result<(), Skip> {
    let manufacturer = coerce::string_value(details, "Manufacturer");
    if manufacturer != METER_MANUFACTURER {
        return Err(Skip::Manufacturer(manufacturer));
    }

    let model = coerce::string_value(details, "Model");
    if !KNOWN_METER_MODELS.contains(&model.as_str()) {
        return Err(Skip::Model(model));
    }

    Ok(())
}

fn meter_point(device_id: &str, meter: &Value, fallback: PointTime) -> Point {
    let details = coerce::child(meter, "Details");
    let time = coerce::optional(meter, "TimeStamp")
        .and_then(|_| {
            Utc.timestamp_opt(coerce::int_value(meter, "TimeStamp"), 0)
                .single()
        })
        .map(PointTime::Absolute)
        .unwrap_or(fallback);

    let mut point = Point::new(Measurement::MeterRealtimeData, time)
        .tag("DeviceId", device_id)
        .tag("Model", coerce::string_value(details, "Model"))
        .tag("Serial", coerce::string_value(details, "Serial"));

    for name in FLOAT_FIELDS.iter() {
        point = point.field(name, coerce::float_value(meter, name));
    }
    for name in INTEGER_FIELDS.iter() {
        point = point.field(name, FieldValue::Integer(coerce::int_value(meter, name)));
    }
    point
}

/// One point per accepted meter in `Body.Data`, timed by the meter's own `TimeStamp`.
pub fn process(envelope: &Envelope, fallback: PointTime) -> Vec<Point> {
    let meters = match envelope.data.as_object() {
        Some(meters) => meters,
        None => return vec![],
    };

    meters
        .iter()
        .filter(|(device_id, meter)| {
            match accept(coerce::child(meter, "Details")) {
                Ok(()) => true,
                Err(skip) => {
                    log::warn!("skipping meter {}: {:?}", device_id, skip);
                    false
                }
            }
        })
        .map(|(device_id, meter)| meter_point(device_id, meter, fallback))
        .collect()
}
