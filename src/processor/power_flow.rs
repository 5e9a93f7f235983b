use serde_json::Value;

use crate::api::response::Envelope;
use crate::coerce;
use crate::directory::InverterDirectory;
use crate::model::{Measurement, Point, PointTime};

const INVERTER_FIELDS: [&str; 4] = ["E_Day", "E_Year", "E_Total", "P"];

const SITE_FIELDS: [&str; 9] = [
    "E_Day",
    "E_Year",
    "E_Total",
    "P_Grid",
    "P_Load",
    "P_PV",
    "P_Akku",
    "rel_Autonomy",
    "rel_SelfConsumption",
];

fn inverter_point(
    device_id: &str,
    inverter: &Value,
    version: &str,
    time: PointTime,
    directory: &InverterDirectory,
) -> Point {
    let mut point = Point::new(Measurement::PowerFlowDataInverter, time)
        .tag("DeviceId", device_id)
        .tag("Serial", directory.lookup(device_id))
        .tag("Version", version);

    for name in INVERTER_FIELDS.iter() {
        point = point.field(name, coerce::float_value(inverter, name));
    }
    /* only hybrid inverters with a battery report these */
    if coerce::optional(inverter, "Battery_Mode").is_some() {
        point = point.field("Battery_Mode", coerce::string_value(inverter, "Battery_Mode"));
    }
    if coerce::optional(inverter, "SOC").is_some() {
        point = point.field("SOC", coerce::float_value(inverter, "SOC"));
    }
    point
}

fn site_point(site: &Value, version: &str, time: PointTime) -> Point {
    let mut point = Point::new(Measurement::PowerFlowDataSite, time)
        .tag("Version", version)
        .tag("Meter_Location", coerce::string_value(site, "Meter_Location"))
        .field("BackupMode", coerce::bool_value(site, "BackupMode"));

    for name in SITE_FIELDS.iter() {
        point = point.field(name, coerce::float_value(site, name));
    }
    if coerce::optional(site, "BatteryStandby").is_some() {
        point = point.field("BatteryStandby", coerce::bool_value(site, "BatteryStandby"));
    }
    point
}

/// One point per entry of `Data.Inverters` followed by exactly one site point.
pub fn process(envelope: &Envelope, time: PointTime, directory: &InverterDirectory) -> Vec<Point> {
    let data = envelope.data;
    let version = coerce::string_value(data, "Version");

    let mut points: Vec<Point> = coerce::child(data, "Inverters")
        .as_object()
        .map(|inverters| {
            inverters
                .iter()
                .map(|(device_id, inverter)| {
                    inverter_point(device_id, inverter, &version, time, directory)
                })
                .collect()
        })
        .unwrap_or_default();

    points.push(site_point(coerce::child(data, "Site"), &version, time));
    points
}
