//! Normalization of Solar API responses into [`Point`]s.
//!
//! Every branch is a pure function of the response and the [`InverterDirectory`].
//! A structurally broken envelope is an error; a device reporting a non-zero
//! status simply yields no points for this cycle.

mod inverter;
mod meter;
mod power_flow;

use serde_json::Value;

use crate::api::response::Envelope;
use crate::directory::InverterDirectory;
use crate::model::{MetricKind, Point};
use crate::Error;

pub fn normalize(
    metric: MetricKind,
    response: &Value,
    directory: &InverterDirectory,
) -> Result<Vec<Point>, Error> {
    let envelope = Envelope::parse(response)?;

    if !envelope.is_ok() {
        log::info!(
            "{} not available: device status {} ({:?})",
            metric,
            envelope.status_code,
            envelope.status()
        );
        return Ok(vec![]);
    }

    let time = envelope.time()?;
    log::debug!("process {}, {}: {}", metric, envelope.timestamp, envelope.data);

    let points = match metric {
        MetricKind::CommonInverterData => inverter::common(&envelope, time, directory),
        MetricKind::ThreePhaseInverterData => vec![inverter::three_phase(&envelope, time, directory)],
        MetricKind::MinMaxInverterData => vec![inverter::min_max(&envelope, time, directory)],
        MetricKind::CumulationInverterData => vec![inverter::cumulation(&envelope, time, directory)],
        MetricKind::MeterRealtimeData => meter::process(&envelope, time),
        MetricKind::PowerFlowRealtimeData => power_flow::process(&envelope, time, directory),
    };

    Ok(points)
}
