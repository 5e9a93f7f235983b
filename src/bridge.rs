//! Polling loop: warm up the inverter directory, gate on daylight, fetch and
//! normalize every configured metric in order, then flush the batch.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::api::{self, endpoint, endpoint::MetricRequest, Api};
use crate::directory::InverterDirectory;
use crate::model::Point;
use crate::processor;
use crate::settings::Settings;
use crate::sink::Sink;
use crate::sun::DaylightGate;
use crate::Error;

/// Backoff applied while waiting for the sun to rise.
pub const SUN_DOWN_BACKOFF: Duration = Duration::from_secs(60);

/// Backoff applied after transport, data or sink failures.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Inverter directory is empty and is being filled.
    Warmup,
    Gated,
    Polling,
    Flushing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Pause after every metric request.
    pub request_interval: Duration,
    pub sun_down_backoff: Duration,
    pub retry_backoff: Duration,
}

impl Pacing {
    pub fn new(request_interval: Duration) -> Self {
        Pacing {
            request_interval,
            sun_down_backoff: SUN_DOWN_BACKOFF,
            retry_backoff: RETRY_BACKOFF,
        }
    }

    /// Backoff before the next cycle, `None` if `error` is fatal.
    pub fn backoff(&self, error: &Error) -> Option<Duration> {
        match error {
            Error::Configuration(_) => None,
            Error::SunIsDown => Some(self.sun_down_backoff),
            Error::Connection(_) => Some(self.retry_backoff),
            Error::StructuralData(_) => Some(self.retry_backoff),
            Error::InvalidResponse(_, _) => Some(self.retry_backoff),
            Error::ApiError(_) => Some(self.retry_backoff),
            Error::Sink(_) => Some(self.retry_backoff),
        }
    }
}

pub struct Bridge<S: Sink> {
    api: Api,
    requests: Vec<MetricRequest>,
    directory: InverterDirectory,
    gate: Option<DaylightGate>,
    sink: S,
    bucket: String,
    pacing: Pacing,
    phase: Phase,
    clock: fn() -> DateTime<Utc>,
}

impl<S: Sink> Bridge<S> {
    pub fn new(settings: &Settings, sink: S) -> Result<Self, Error> {
        let inverter = &settings.inverter;
        let requests = endpoint::resolve(&inverter.url, inverter.device_id, &inverter.metrics)?;
        let location = settings.location.to_location()?;

        log::info!("initialize application");
        log::info!("- inverter config: {:?}", inverter);
        log::info!("- location info: {:?}", location);
        log::info!("- influxdb bucket: {}", settings.influxdb.bucket);

        let gate = if settings.record.ignore_sunset {
            None
        } else {
            Some(DaylightGate::new(location))
        };

        Ok(Bridge {
            api: api::api(inverter.url.clone())?,
            requests,
            directory: InverterDirectory::new(),
            gate,
            sink,
            bucket: settings.influxdb.bucket.clone(),
            pacing: Pacing::new(settings.request_interval()),
            phase: Phase::Warmup,
            clock: Utc::now,
        })
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn directory(&self) -> &InverterDirectory {
        &self.directory
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn requests(&self) -> &[MetricRequest] {
        &self.requests
    }

    fn enter(&mut self, phase: Phase) {
        log::debug!("{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    async fn warm_up(&mut self) -> Result<(), Error> {
        if !self.directory.is_empty() {
            return Ok(());
        }
        self.enter(Phase::Warmup);
        let response = self.api.inverter_info().await?;
        self.directory.refresh(&response)
    }

    fn check_daylight(&mut self) -> Result<(), Error> {
        self.enter(Phase::Gated);
        match &self.gate {
            Some(gate) => gate.check((self.clock)()),
            None => Ok(()),
        }
    }

    async fn poll(&mut self) -> Result<Vec<Point>, Error> {
        self.enter(Phase::Polling);
        let mut collected = Vec::new();

        for request in &self.requests {
            log::info!("requesting {}", request.url);
            let response = self.api.get(&request.url).await?;
            collected.extend(processor::normalize(
                request.metric,
                &response,
                &self.directory,
            )?);
            tokio::time::sleep(self.pacing.request_interval).await;
        }

        Ok(collected)
    }

    async fn flush(&mut self, points: &[Point]) -> Result<(), Error> {
        if points.is_empty() {
            log::info!("nothing to write");
            return Ok(());
        }
        self.enter(Phase::Flushing);

        let measurements: Vec<&str> = points.iter().map(|p| p.measurement.as_str()).collect();
        log::info!("writing data: {:?}", measurements);
        self.sink.write(&self.bucket, points).await
    }

    /// Runs one cycle and returns the number of points written.
    pub async fn run_cycle(&mut self) -> Result<usize, Error> {
        self.warm_up().await?;
        self.check_daylight()?;
        let points = self.poll().await?;
        self.flush(&points).await?;
        self.enter(Phase::Gated);
        Ok(points.len())
    }

    /// Runs one cycle and returns the pause owed before the next one.
    ///
    /// Only fatal errors are returned.
    pub async fn step(&mut self) -> Result<Duration, Error> {
        let error = match self.run_cycle().await {
            Ok(_) => return Ok(Duration::ZERO),
            Err(e) => e,
        };

        let backoff = self.pacing.backoff(&error).ok_or_else(|| error.clone())?;
        match error {
            Error::SunIsDown => log::info!("waiting for sunrise"),
            Error::Connection(_) => log::info!("waiting for connection... ({})", error),
            _ => log::error!("Exception: {}", error),
        }
        Ok(backoff)
    }

    /// Loops until a fatal error occurs.
    pub async fn run(&mut self) -> Result<(), Error> {
        log::info!("starting application");

        loop {
            let backoff = self.step().await?;
            if !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
                log::info!("waited {} seconds", backoff.as_secs());
            }
        }
    }

    pub fn close(&self) {
        log::info!("closing application");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn backoff_per_error_kind() {
        let pacing = Pacing::new(Duration::from_secs(5));
        assert_eq!(Some(SUN_DOWN_BACKOFF), pacing.backoff(&Error::SunIsDown));
        assert_eq!(
            Some(RETRY_BACKOFF),
            pacing.backoff(&Error::Connection(String::from("refused")))
        );
        assert_eq!(
            Some(RETRY_BACKOFF),
            pacing.backoff(&Error::StructuralData(String::from("missing Body.Data")))
        );
        assert_eq!(
            Some(RETRY_BACKOFF),
            pacing.backoff(&Error::Sink(String::from("timeout")))
        );
        assert_eq!(
            None,
            pacing.backoff(&Error::Configuration(String::from("bad")))
        );
    }
}
