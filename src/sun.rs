//! Sunrise/sunset estimation and the daylight gate.
//!
//! Uses the sunrise equation with the equation of center and an apparent solar
//! altitude of -0.833 degrees (refraction plus solar disc). Accurate to about a
//! minute at mid latitudes.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::Error;

const J2000: f64 = 2451545.0;
const UNIX_EPOCH_JULIAN_DAY: f64 = 2440587.5;
const SECONDS_PER_DAY: f64 = 86400.0;
const OBLIQUITY: f64 = 23.4397;
const SUNRISE_ALTITUDE: f64 = -0.833;

/// Position of the installation.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub region: String,
    pub timezone: Tz,
    pub latitude: f64,
    pub longitude: f64,
}

/// Outcome of the sun calculation for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Daylight {
    Interval {
        sunrise: DateTime<Utc>,
        sunset: DateTime<Utc>,
    },
    PolarDay,
    PolarNight,
}

fn julian_to_utc(julian_day: f64) -> DateTime<Utc> {
    let millis = ((julian_day - UNIX_EPOCH_JULIAN_DAY) * SECONDS_PER_DAY * 1000.0).round() as i64;
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Solar noon and the daylight around it.
struct SolarDay {
    transit: DateTime<Utc>,
    daylight: Daylight,
}

fn solar_day(date: NaiveDate, latitude: f64, longitude: f64) -> SolarDay {
    let j2000_date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN);
    let n = (date - j2000_date).num_days() as f64;

    let mean_solar_noon = n - longitude / 360.0;
    let anomaly = (357.5291 + 0.98560028 * mean_solar_noon).rem_euclid(360.0);
    let m = anomaly.to_radians();
    let center = 1.9148 * m.sin() + 0.0200 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin();
    let ecliptic_longitude = (anomaly + center + 180.0 + 102.9372).rem_euclid(360.0);
    let lambda = ecliptic_longitude.to_radians();
    let transit = J2000 + mean_solar_noon + 0.0053 * m.sin() - 0.0069 * (2.0 * lambda).sin();

    let sin_declination = lambda.sin() * OBLIQUITY.to_radians().sin();
    let cos_declination = sin_declination.asin().cos();
    let phi = latitude.to_radians();
    let cos_hour_angle = (SUNRISE_ALTITUDE.to_radians().sin() - phi.sin() * sin_declination)
        / (phi.cos() * cos_declination);

    let daylight = if cos_hour_angle > 1.0 {
        Daylight::PolarNight
    } else if cos_hour_angle < -1.0 {
        Daylight::PolarDay
    } else {
        let hour_angle = cos_hour_angle.acos().to_degrees();
        Daylight::Interval {
            sunrise: julian_to_utc(transit - hour_angle / 360.0),
            sunset: julian_to_utc(transit + hour_angle / 360.0),
        }
    };

    SolarDay {
        transit: julian_to_utc(transit),
        daylight,
    }
}

/// Sunrise and sunset around the solar noon of `date` counted in UTC, for the
/// given coordinates (degrees, east positive).
pub fn daylight(date: NaiveDate, latitude: f64, longitude: f64) -> Daylight {
    solar_day(date, latitude, longitude).daylight
}

/// Sunrise and sunset around the solar noon that falls on `date` in `timezone`.
///
/// Differs from [`daylight`] where the zone offset is far from the
/// longitude's solar time, as in Pacific/Apia.
pub fn local_daylight(date: NaiveDate, timezone: &Tz, latitude: f64, longitude: f64) -> Daylight {
    [date.pred_opt(), Some(date), date.succ_opt()]
        .into_iter()
        .flatten()
        .map(|candidate| solar_day(candidate, latitude, longitude))
        .find(|day| day.transit.with_timezone(timezone).date_naive() == date)
        .map(|day| day.daylight)
        .unwrap_or_else(|| daylight(date, latitude, longitude))
}

/// True outside `[sunrise, sunset]`.
pub fn is_sun_down<T: TimeZone>(
    now: &DateTime<T>,
    sunrise: &DateTime<Utc>,
    sunset: &DateTime<Utc>,
) -> bool {
    let now = now.with_timezone(&Utc);
    now < *sunrise || now > *sunset
}

/// Suppresses polling between sunset and the next sunrise.
#[derive(Debug, Clone)]
pub struct DaylightGate {
    location: Location,
}

impl DaylightGate {
    pub fn new(location: Location) -> Self {
        DaylightGate { location }
    }

    /// Err(SunIsDown) when `now` lies outside today's daylight at the location.
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), Error> {
        let location = &self.location;
        let local = now.with_timezone(&location.timezone);
        match local_daylight(
            local.date_naive(),
            &location.timezone,
            location.latitude,
            location.longitude,
        ) {
            Daylight::PolarDay => Ok(()),
            Daylight::PolarNight => Err(Error::SunIsDown),
            Daylight::Interval { sunrise, sunset } => {
                log::debug!(
                    "sunrise {}, sunset {}, now {}",
                    sunrise.with_timezone(&location.timezone),
                    sunset.with_timezone(&location.timezone),
                    local
                );
                if is_sun_down(&local, &sunrise, &sunset) {
                    Err(Error::SunIsDown)
                } else {
                    Ok(())
                }
            }
        }
    }
}
