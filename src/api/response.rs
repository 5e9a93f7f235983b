use chrono::{DateTime, NaiveDateTime, Utc};
use num_derive::FromPrimitive;
use serde_json::Value;

use crate::coerce;
use crate::model::PointTime;
use crate::Error;

/// Offsets some firmware (Symo GEN24) appends to what is really local time.
const SPURIOUS_OFFSETS: [&str; 2] = ["+00:00", "Z"];

/// `Head.Status.Code` values reported by the Solar API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum StatusCode {
    Okay = 0,
    NotImplemented = 1,
    Uninitialized = 2,
    Initialized = 3,
    Running = 4,
    Timeout = 5,
    ArgumentError = 6,
    LnRequestError = 7,
    LnRequestTimeout = 8,
    LnParseError = 9,
    ConfigIoError = 10,
    NotSupported = 11,
    DeviceNotAvailable = 12,
    UnknownError = 255,
}

/// Borrowed view of a validated `{Head, Body}` response.
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'a> {
    pub timestamp: &'a str,
    pub status_code: i64,
    pub request_arguments: &'a Value,
    pub data: &'a Value,
}

impl<'a> Envelope<'a> {
    /// Checks for `Head.Timestamp` and `Body.Data`; everything else is optional.
    pub fn parse(response: &'a Value) -> Result<Self, Error> {
        let head = coerce::optional(response, "Head")
            .ok_or_else(|| Error::StructuralData(String::from("missing Head")))?;
        let timestamp = coerce::optional(head, "Timestamp")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::StructuralData(String::from("missing Head.Timestamp")))?;
        let data = coerce::optional(response, "Body")
            .and_then(|body| coerce::optional(body, "Data"))
            .ok_or_else(|| Error::StructuralData(String::from("missing Body.Data")))?;

        let status_code = head
            .get("Status")
            .map(|status| coerce::int_value(status, "Code"))
            .unwrap_or(0);

        Ok(Envelope {
            timestamp,
            status_code,
            request_arguments: coerce::child(head, "RequestArguments"),
            data,
        })
    }

    pub fn is_ok(&self) -> bool {
        self.status_code == 0
    }

    pub fn status(&self) -> Option<StatusCode> {
        num::FromPrimitive::from_i64(self.status_code)
    }

    pub fn time(&self) -> Result<PointTime, Error> {
        parse_timestamp(self.timestamp)
    }
}

/// Parses `Head.Timestamp`, dropping a trailing zero UTC offset first.
///
/// A stripped timestamp is a local wall-clock time; one with a non-zero offset
/// is kept as an absolute instant.
pub fn parse_timestamp(timestamp: &str) -> Result<PointTime, Error> {
    let trimmed = SPURIOUS_OFFSETS
        .iter()
        .find_map(|suffix| timestamp.strip_suffix(suffix))
        .unwrap_or(timestamp);

    if let Ok(t) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(PointTime::Absolute(t.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(PointTime::Local)
        .map_err(|e| Error::StructuralData(format!("invalid timestamp '{}': {}", timestamp, e)))
}
