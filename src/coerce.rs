//! Typed extraction from loosely structured JSON.
//!
//! Every accessor is total: an absent key, an explicit `null` or a value of the
//! wrong shape yields the zero value of the requested type. Inverter payloads wrap
//! their numbers in `{"Value": x, "Unit": ".."}` objects while meter and power flow
//! payloads carry bare numbers; use [`float_from_wrapped`] for the former and
//! [`float_value`] for the latter. Mixing them up silently yields `0.0`.

use serde_json::Value;

static NULL: Value = Value::Null;

/// Returns the value under `key` if it is present and not `null`.
pub fn optional<'a>(container: &'a Value, key: &str) -> Option<&'a Value> {
    container.get(key).filter(|v| !v.is_null())
}

/// Returns the nested value under `key`, or `null` when it is absent.
pub fn child<'a>(container: &'a Value, key: &str) -> &'a Value {
    container.get(key).unwrap_or(&NULL)
}

pub fn float_value(container: &Value, key: &str) -> f64 {
    optional(container, key)
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

pub fn int_value(container: &Value, key: &str) -> i64 {
    optional(container, key)
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .unwrap_or(0)
}

/// Strings are returned as-is; numbers and booleans in their JSON text form.
pub fn string_value(container: &Value, key: &str) -> String {
    match optional(container, key) {
        Some(Value::String(s)) => s.clone(),
        Some(v @ Value::Number(_)) | Some(v @ Value::Bool(_)) => v.to_string(),
        _ => String::new(),
    }
}

pub fn bool_value(container: &Value, key: &str) -> bool {
    optional(container, key)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Reads `container[key].Value` as a float.
pub fn float_from_wrapped(container: &Value, key: &str) -> f64 {
    optional(container, key)
        .map(|wrapped| float_value(wrapped, "Value"))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_and_null_default_to_zero() {
        let data = json!({ "a": null });
        assert_eq!(0.0, float_value(&data, "a"));
        assert_eq!(0.0, float_value(&data, "missing"));
        assert_eq!(0, int_value(&data, "a"));
        assert_eq!("", string_value(&data, "missing"));
        assert!(!bool_value(&data, "a"));
        assert_eq!(0.0, float_from_wrapped(&data, "a"));
    }

    #[test]
    fn reads_present_values() {
        let data = json!({
            "P": 1500,
            "E": 12.5,
            "Enable": 1,
            "Ratio": 2.9,
            "Model": "Smart Meter 63A",
            "Version": 12,
            "BackupMode": true,
        });
        assert_eq!(1500.0, float_value(&data, "P"));
        assert_eq!(12.5, float_value(&data, "E"));
        assert_eq!(1, int_value(&data, "Enable"));
        assert_eq!(2, int_value(&data, "Ratio"));
        assert_eq!("Smart Meter 63A", string_value(&data, "Model"));
        assert_eq!("12", string_value(&data, "Version"));
        assert!(bool_value(&data, "BackupMode"));
    }

    #[test]
    fn wrapped_values() {
        let data = json!({
            "PAC": { "Unit": "W", "Value": 1500 },
            "IDC": { "Unit": "A", "Value": null },
            "FLAT": 3.0,
        });
        assert_eq!(1500.0, float_from_wrapped(&data, "PAC"));
        assert_eq!(0.0, float_from_wrapped(&data, "IDC"));
        /* wrong shape on either side is a zero, never an error */
        assert_eq!(0.0, float_from_wrapped(&data, "FLAT"));
        assert_eq!(0.0, float_value(&data, "PAC"));
    }
}
