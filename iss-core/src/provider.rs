use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, ops::RangeInclusive, time::Duration};

use crate::{
    Config,
    error::{Error, Result},
    model::{DaylightWindow, IssPosition, Location},
    provider::{open_notify::OpenNotifyTracker, sunrise_sunset::SunriseSunsetSource},
};

pub mod open_notify;
pub mod sunrise_sunset;

/// Half-width, in degrees, of the box around the observer that counts as "overhead".
pub const OVERHEAD_TOLERANCE_DEG: f64 = 5.0;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait IssTracker: Send + Sync + Debug {
    async fn fetch_position(&self) -> Result<IssPosition>;
}

#[async_trait]
pub trait DaylightSource: Send + Sync + Debug {
    async fn fetch_daylight(&self, location: Location) -> Result<DaylightWindow>;
}

/// True iff the ISS sub-point lies within the tolerance box around `location`, bounds included.
///
/// Each axis is checked on its own; this is not a great-circle distance.
pub fn is_overhead(location: Location, position: &IssPosition) -> bool {
    within(location.longitude).contains(&position.longitude)
        && within(location.latitude).contains(&position.latitude)
}

/// True iff `current_hour` equals the sunrise hour or the sunset hour.
///
/// This is a coarse one-hour approximation of darkness. Sunrise and sunset hours
/// are UTC while `current_hour` is local time, and no offset correction is applied.
pub fn is_dark(window: &DaylightWindow, current_hour: u32) -> bool {
    current_hour == window.sunrise_hour || current_hour == window.sunset_hour
}

fn within(center: f64) -> RangeInclusive<f64> {
    (center - OVERHEAD_TOLERANCE_DEG)..=(center + OVERHEAD_TOLERANCE_DEG)
}

pub(crate) fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))
}

/// Construct both HTTP-backed sources from config.
pub fn sources_from_config(
    config: &Config,
) -> Result<(Box<dyn IssTracker>, Box<dyn DaylightSource>)> {
    let http = http_client()?;

    let tracker: Box<dyn IssTracker> =
        Box::new(OpenNotifyTracker::new(config.endpoints.iss_url.clone(), http.clone()));
    let daylight: Box<dyn DaylightSource> =
        Box::new(SunriseSunsetSource::new(config.endpoints.sun_url.clone(), http));

    Ok((tracker, daylight))
}
