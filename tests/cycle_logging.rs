use async_trait::async_trait;
use fronius_bridge::bridge::{Bridge, Pacing, RETRY_BACKOFF};
use fronius_bridge::model::Point;
use fronius_bridge::settings::parse_settings;
use fronius_bridge::sink::Sink;
use fronius_bridge::Error;
use log::{Level, LevelFilter, Log, Metadata, Record};
use mockito::Matcher;
use std::sync::Mutex;
use std::time::Duration;

/// Keeps every record so the test can inspect what the bridge logged.
struct Recorder(Mutex<Vec<(Level, String)>>);

impl Log for Recorder {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.0.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static RECORDER: Recorder = Recorder(Mutex::new(Vec::new()));

#[derive(Default)]
struct CountingSink {
    writes: usize,
}

#[async_trait]
impl Sink for CountingSink {
    async fn write(&mut self, _bucket: &str, _points: &[Point]) -> Result<(), Error> {
        self.writes += 1;
        Ok(())
    }
}

fn errors() -> Vec<String> {
    RECORDER
        .0
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, _)| *level == Level::Error)
        .map(|(_, message)| message.clone())
        .collect()
}

#[tokio::test]
async fn malformed_envelope_logs_error_and_loop_resumes() {
    log::set_logger(&RECORDER).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/solar_api/v1/GetInverterInfo.cgi")
        .with_status(200)
        .with_body(r#"{"Head": {"Status": {"Code": 0}, "Timestamp": "2023-06-01T12:00:00+02:00"}, "Body": {"Data": {"1": {"UniqueID": "34236513"}}}}"#)
        .create_async()
        .await;
    let broken = server
        .mock("GET", "/solar_api/v1/GetPowerFlowRealtimeData.fcgi")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"Head": {"Timestamp": "2023-06-01T12:00:00+02:00"}, "Body": {}}"#)
        .create_async()
        .await;

    let settings = parse_settings(&format!(
        r#"
inverter:
  name: Symo
  url: {}
  device_id: 1
  metrics: [PowerFlowRealtimeData]
record:
  request_interval: 2
  ignore_sunset: true
location:
  name: Vienna
  timezone: Europe/Vienna
  latitude: 48.2082
  longitude: 16.3738
influxdb:
  url: http://localhost:8086
  org: home
  bucket: fronius
  token: secret
"#,
        server.url()
    ))
    .unwrap();
    let mut bridge = Bridge::new(&settings, CountingSink::default())
        .unwrap()
        .with_pacing(Pacing::new(Duration::ZERO));

    assert!(errors().is_empty());
    assert_eq!(RETRY_BACKOFF, bridge.step().await.unwrap());
    assert_eq!(0, bridge.sink().writes);

    let logged = errors();
    assert_eq!(1, logged.len(), "{:?}", logged);
    assert!(logged[0].contains("missing Body.Data"), "{}", logged[0]);

    broken.remove_async().await;
    server
        .mock("GET", "/solar_api/v1/GetPowerFlowRealtimeData.fcgi")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"Head": {"Status": {"Code": 0}, "Timestamp": "2023-06-01T12:00:00+02:00"}, "Body": {"Data": {"Inverters": {}, "Site": {"P_PV": 512}, "Version": "12"}}}"#)
        .create_async()
        .await;

    assert_eq!(Duration::ZERO, bridge.step().await.unwrap());
    assert_eq!(1, bridge.sink().writes);
    assert_eq!(1, errors().len());
}
