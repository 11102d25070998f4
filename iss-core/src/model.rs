use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observer location in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Sub-point of the ISS as reported by the position API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IssPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub reported_at: Option<DateTime<Utc>>,
}

/// Hour-of-day (0..=23) of sunrise and sunset, in the offset the API reported them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaylightWindow {
    pub sunrise_hour: u32,
    pub sunset_hour: u32,
}
