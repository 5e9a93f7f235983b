use serde_json::Value;
use std::collections::HashMap;

use crate::api::response::Envelope;
use crate::coerce;
use crate::Error;

/// Tag value used when a device id has no known serial.
pub const UNKNOWN_SERIAL: &str = "None";

/// Device id to serial number (`UniqueID`) lookup, filled from `GetInverterInfo`.
#[derive(Debug, Default, Clone)]
pub struct InverterDirectory {
    serials: HashMap<String, String>,
}

impl InverterDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the directory with the inverters listed in `response`.
    ///
    /// A device-side error status leaves the directory untouched.
    pub fn refresh(&mut self, response: &Value) -> Result<(), Error> {
        let envelope = Envelope::parse(response)?;

        if !envelope.is_ok() {
            log::warn!(
                "inverter info not available (status {}: {:?}), keeping directory",
                envelope.status_code,
                envelope.status()
            );
            return Ok(());
        }

        self.serials = envelope
            .data
            .as_object()
            .map(|inverters| {
                inverters
                    .iter()
                    .map(|(device_id, info)| {
                        (device_id.clone(), coerce::string_value(info, "UniqueID"))
                    })
                    .collect()
            })
            .unwrap_or_default();

        log::info!("inverter map: {:?}", self.serials);
        Ok(())
    }

    pub fn lookup(&self, device_id: &str) -> &str {
        self.serials
            .get(device_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_SERIAL)
    }

    pub fn is_empty(&self) -> bool {
        self.serials.is_empty()
    }

    pub fn len(&self) -> usize {
        self.serials.len()
    }
}
