//! InfluxDB line protocol encoding.
//!
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp_ns
//! ```

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::model::{FieldValue, Point, PointTime};
use crate::Error;

fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Tag keys, tag values and field keys share the same escaping rules.
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

fn field_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(v) => format!("{}", v),
        FieldValue::Integer(v) => format!("{}i", v),
        FieldValue::String(v) => {
            format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\""))
        }
        FieldValue::Boolean(v) => v.to_string(),
    }
}

/// Resolves a point time to an instant; local times are read in `timezone`.
pub fn resolve_time(time: &PointTime, timezone: &Tz) -> DateTime<Utc> {
    match time {
        PointTime::Absolute(t) => *t,
        PointTime::Local(naive) => timezone
            .from_local_datetime(naive)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            /* wall-clock time skipped by a DST switch */
            .unwrap_or_else(|| Utc.from_utc_datetime(naive)),
    }
}

/// Encodes one point. Tags with empty values are left out.
pub fn encode(point: &Point, timezone: &Tz) -> Result<String, Error> {
    if point.fields.is_empty() {
        return Err(Error::Sink(format!(
            "{} point has no fields",
            point.measurement
        )));
    }

    let timestamp = resolve_time(&point.time, timezone)
        .timestamp_nanos_opt()
        .ok_or_else(|| Error::Sink(format!("timestamp out of range: {}", point.time)))?;

    let mut line = escape_measurement(point.measurement.as_str());

    for (key, value) in point.tags.iter().filter(|(_, v)| !v.is_empty()) {
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    line.push(' ');
    let fields: Vec<String> = point
        .fields
        .iter()
        .map(|(key, value)| format!("{}={}", escape_key(key), field_value(value)))
        .collect();
    line.push_str(&fields.join(","));

    line.push(' ');
    line.push_str(&timestamp.to_string());

    Ok(line)
}

/// Encodes a batch, one point per line.
pub fn encode_batch(points: &[Point], timezone: &Tz) -> Result<String, Error> {
    let lines = points
        .iter()
        .map(|point| encode(point, timezone))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}
