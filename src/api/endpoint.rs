use reqwest::Url;

use crate::model::MetricKind;
use crate::Error;

pub type Endpoint = str;

pub const API_ROOT: &Endpoint = "/solar_api/v1";
pub const INVERTER_REALTIME_DATA: &Endpoint = "/GetInverterRealtimeData.cgi";
pub const METER_REALTIME_DATA: &Endpoint = "/GetMeterRealtimeData.cgi";
pub const POWER_FLOW_REALTIME_DATA: &Endpoint = "/GetPowerFlowRealtimeData.fcgi";
pub const INVERTER_INFO: &Endpoint = "/GetInverterInfo.cgi";

/// Fully qualified request for one configured metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRequest {
    pub metric: MetricKind,
    pub url: String,
}

/// `{base_url}/solar_api/v1{endpoint}` without query parameters.
pub fn url(base_url: &str, endpoint: &Endpoint) -> String {
    format!("{}{}{}", base_url.trim_end_matches('/'), API_ROOT, endpoint)
}

fn route(metric: MetricKind, device_id: u32) -> (&'static Endpoint, Vec<(&'static str, String)>) {
    match metric {
        MetricKind::CommonInverterData
        | MetricKind::ThreePhaseInverterData
        | MetricKind::MinMaxInverterData
        | MetricKind::CumulationInverterData => (
            INVERTER_REALTIME_DATA,
            vec![
                ("Scope", String::from("Device")),
                ("DataCollection", metric.as_str().to_string()),
                ("DeviceId", device_id.to_string()),
            ],
        ),
        MetricKind::MeterRealtimeData => {
            (METER_REALTIME_DATA, vec![("Scope", String::from("System"))])
        }
        MetricKind::PowerFlowRealtimeData => (POWER_FLOW_REALTIME_DATA, vec![]),
    }
}

/// Builds the request list for `metrics`, keeping declared order and dropping duplicates.
pub fn resolve(
    base_url: &str,
    device_id: u32,
    metrics: &[MetricKind],
) -> Result<Vec<MetricRequest>, Error> {
    let mut requests: Vec<MetricRequest> = Vec::with_capacity(metrics.len());

    for &metric in metrics {
        if requests.iter().any(|r| r.metric == metric) {
            continue;
        }

        let (endpoint, params) = route(metric, device_id);
        let base = url(base_url, endpoint);
        let url = if params.is_empty() {
            Url::parse(&base)
        } else {
            Url::parse_with_params(&base, &params)
        }
        .map_err(|e| Error::Configuration(format!("invalid inverter url '{}': {}", base, e)))?;

        requests.push(MetricRequest {
            metric,
            url: url.to_string(),
        });
    }

    Ok(requests)
}
