use chrono_tz::Tz;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::model::MetricKind;
use crate::sink::Auth;
use crate::sun::Location;
use crate::Error;

const ENV_PREFIX: &str = "FRONIUS";
const MIN_REQUEST_INTERVAL: f64 = 2.0;
const MAX_REQUEST_INTERVAL: f64 = 3600.0;

#[derive(Debug, Clone, Deserialize)]
pub struct InverterSettings {
    pub name: String,
    pub url: String,
    pub device_id: u32,
    pub metrics: Vec<MetricKind>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordSettings {
    /// Pause after every request, in seconds.
    pub request_interval: f64,
    #[serde(default)]
    pub ignore_sunset: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationSettings {
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub timezone: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfluxSettings {
    pub url: String,
    pub org: String,
    pub bucket: String,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn default_verify_ssl() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub inverter: InverterSettings,
    pub record: RecordSettings,
    pub location: LocationSettings,
    pub influxdb: InfluxSettings,
}

impl InfluxSettings {
    /// Token wins over username/password.
    pub fn auth(&self) -> Result<Auth, Error> {
        match (&self.token, &self.username, &self.password) {
            (Some(token), _, _) if !token.is_empty() => Ok(Auth::Token(token.clone())),
            (_, Some(username), Some(password)) => Ok(Auth::Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => Err(Error::Configuration(String::from(
                "influxdb requires either a token or username and password",
            ))),
        }
    }
}

impl LocationSettings {
    pub fn to_location(&self) -> Result<Location, Error> {
        let timezone = self
            .timezone
            .parse::<Tz>()
            .map_err(|e| Error::Configuration(format!("invalid timezone '{}': {}", self.timezone, e)))?;

        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::Configuration(format!(
                "invalid coordinates: {}, {}",
                self.latitude, self.longitude
            )));
        }

        Ok(Location {
            name: self.name.clone(),
            region: self.region.clone(),
            timezone,
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        let interval = self.record.request_interval;
        if !(MIN_REQUEST_INTERVAL..=MAX_REQUEST_INTERVAL).contains(&interval) {
            return Err(Error::Configuration(format!(
                "invalid request interval: {} s",
                interval
            )));
        }
        if self.inverter.metrics.is_empty() {
            return Err(Error::Configuration(String::from("no metrics configured")));
        }
        self.location.to_location()?;
        self.influxdb.auth()?;
        Ok(())
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_secs_f64(self.record.request_interval)
    }
}

fn build<S>(source: S) -> Result<Settings, Error>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings: Settings = Config::builder()
        .add_source(source)
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?
        .try_deserialize()?;

    settings.validate()?;
    Ok(settings)
}

/// Reads the YAML file at `path`, overlaid with `FRONIUS__SECTION__KEY` variables.
pub fn read_settings(path: &Path) -> Result<Settings, Error> {
    let yaml = std::fs::read_to_string(path).map_err(|e| {
        Error::Configuration(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_settings(&yaml)
}

pub fn parse_settings(yaml: &str) -> Result<Settings, Error> {
    build(File::from_str(yaml, FileFormat::Yaml))
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLE: &str = r#"
inverter:
  name: Symo
  url: http://192.168.0.10
  device_id: 1
  metrics:
    - CommonInverterData
    - 3PInverterData
    - MeterRealtimeData
    - PowerFlowRealtimeData
record:
  request_interval: 5
  ignore_sunset: false
location:
  name: Vienna
  region: Austria
  timezone: Europe/Vienna
  latitude: 48.2082
  longitude: 16.3738
influxdb:
  url: http://localhost:8086
  org: home
  bucket: fronius
  token: secret
"#;

    #[test]
    fn parses_sample() {
        let settings = parse_settings(SAMPLE).unwrap();
        assert_eq!(1, settings.inverter.device_id);
        assert_eq!(
            vec![
                MetricKind::CommonInverterData,
                MetricKind::ThreePhaseInverterData,
                MetricKind::MeterRealtimeData,
                MetricKind::PowerFlowRealtimeData,
            ],
            settings.inverter.metrics
        );
        assert_eq!(Duration::from_secs(5), settings.request_interval());
        assert!(settings.influxdb.verify_ssl);
        assert_eq!(
            Auth::Token(String::from("secret")),
            settings.influxdb.auth().unwrap()
        );
        assert_eq!(
            chrono_tz::Europe::Vienna,
            settings.location.to_location().unwrap().timezone
        );
    }

    #[test]
    fn rejects_interval_out_of_range() {
        for interval in ["1", "3601"] {
            let yaml = SAMPLE.replace("request_interval: 5", &format!("request_interval: {}", interval));
            assert!(matches!(
                parse_settings(&yaml),
                Err(Error::Configuration(_))
            ));
        }
    }

    #[test]
    fn rejects_unknown_metric() {
        let yaml = SAMPLE.replace("- 3PInverterData", "- 4PInverterData");
        assert!(matches!(
            parse_settings(&yaml),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn rejects_missing_auth() {
        let yaml = SAMPLE.replace("  token: secret\n", "");
        assert!(matches!(
            parse_settings(&yaml),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn accepts_credentials() {
        let yaml = SAMPLE.replace(
            "  token: secret\n",
            "  username: admin\n  password: hunter2\n  verify_ssl: false\n",
        );
        let settings = parse_settings(&yaml).unwrap();
        assert!(!settings.influxdb.verify_ssl);
        assert_eq!(
            Auth::Credentials {
                username: String::from("admin"),
                password: String::from("hunter2"),
            },
            settings.influxdb.auth().unwrap()
        );
    }

    #[test]
    fn rejects_unknown_timezone() {
        let yaml = SAMPLE.replace("Europe/Vienna", "Europe/Atlantis");
        assert!(matches!(
            parse_settings(&yaml),
            Err(Error::Configuration(_))
        ));
    }
}
