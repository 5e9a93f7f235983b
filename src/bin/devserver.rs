//! Mock Fronius Solar API serving recorded envelopes from `samples/`.

#[macro_use]
extern crate rocket;

use chrono::Utc;
use chrono_tz::Europe::Vienna;
use rand::seq::SliceRandom;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Build, Rocket, State};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const SAMPLES_DIR: &str = "samples";
const SAMPLES_ENV: &str = "DEVSERVER_SAMPLES";
const INVERTER_INFO: &str = "GetInverterInfo";
const METER_REALTIME_DATA: &str = "MeterRealtimeData";
const POWER_FLOW_REALTIME_DATA: &str = "PowerFlowRealtimeData";

/// Recorded envelopes keyed by file stem.
struct Samples(HashMap<String, Vec<Value>>);

impl Samples {
    /// Reads every `*.json` file in `dir`; each holds an array of envelopes.
    fn load(dir: &Path) -> Result<Samples, String> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| format!("cannot read samples from {}: {}", dir.display(), e))?;

        let mut samples = HashMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let name = match path.file_stem().and_then(|s| s.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };

            let text = std::fs::read_to_string(&path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
            let recorded: Vec<Value> = serde_json::from_str(&text)
                .map_err(|e| format!("{} is not an array of envelopes: {}", path.display(), e))?;

            log::info!("loaded {} samples for {}", recorded.len(), name);
            samples.insert(name, recorded);
        }

        Ok(Samples(samples))
    }

    /// Random sample for `name` with `Head.Timestamp` set to now.
    fn pick(&self, name: &str) -> Option<Value> {
        let mut sample = self.0.get(name)?.choose(&mut rand::thread_rng())?.clone();

        if let Some(head) = sample.get_mut("Head").and_then(Value::as_object_mut) {
            let now = Utc::now().with_timezone(&Vienna).to_rfc3339();
            head.insert(String::from("Timestamp"), Value::String(now));
        }
        Some(sample)
    }
}

#[derive(Debug, FromForm)]
struct RealtimeQuery<'r> {
    #[field(name = "Scope")]
    scope: Option<&'r str>,
    #[field(name = "DataCollection")]
    data_collection: Option<&'r str>,
    #[field(name = "DeviceId")]
    device_id: Option<&'r str>,
}

#[derive(Debug, FromForm)]
struct MeterQuery<'r> {
    #[field(name = "Scope")]
    scope: Option<&'r str>,
}

fn empty() -> Json<Value> {
    Json(Value::Object(Map::new()))
}

#[get("/GetInverterRealtimeData.cgi?<query..>")]
fn inverter_realtime(query: RealtimeQuery<'_>, samples: &State<Samples>) -> Json<Value> {
    log::debug!("{:?}", query);

    let mut sample = match query
        .data_collection
        .filter(|name| name.ends_with("InverterData"))
        .and_then(|name| samples.pick(name))
    {
        Some(sample) => sample,
        None => return empty(),
    };

    if let Some(head) = sample.get_mut("Head").and_then(Value::as_object_mut) {
        head.insert(
            String::from("RequestArguments"),
            json!({
                "DataCollection": query.data_collection,
                "DeviceClass": "Inverter",
                "DeviceId": query.device_id,
                "Scope": query.scope,
            }),
        );
    }
    Json(sample)
}

#[get("/GetMeterRealtimeData.cgi?<query..>")]
fn meter_realtime(query: MeterQuery<'_>, samples: &State<Samples>) -> Result<Json<Value>, Status> {
    if query.scope != Some("System") {
        return Err(Status::BadRequest);
    }
    samples
        .pick(METER_REALTIME_DATA)
        .map(Json)
        .ok_or(Status::NotFound)
}

#[get("/GetPowerFlowRealtimeData.fcgi")]
fn power_flow_realtime(samples: &State<Samples>) -> Result<Json<Value>, Status> {
    samples
        .pick(POWER_FLOW_REALTIME_DATA)
        .map(Json)
        .ok_or(Status::NotFound)
}

#[get("/GetInverterInfo.cgi")]
fn inverter_info(samples: &State<Samples>) -> Result<Json<Value>, Status> {
    samples.pick(INVERTER_INFO).map(Json).ok_or(Status::NotFound)
}

fn build(samples: Samples) -> Rocket<Build> {
    rocket::build().manage(samples).mount(
        "/solar_api/v1",
        routes![
            inverter_realtime,
            meter_realtime,
            power_flow_realtime,
            inverter_info
        ],
    )
}

#[launch]
fn rocket() -> Rocket<Build> {
    env_logger::init();

    let dir = std::env::var(SAMPLES_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(SAMPLES_DIR));

    let samples = match Samples::load(&dir) {
        Ok(samples) => samples,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    build(samples)
}
