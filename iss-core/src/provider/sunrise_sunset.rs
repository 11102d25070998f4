use async_trait::async_trait;
use chrono::{DateTime, Timelike};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    model::{DaylightWindow, Location},
};

use super::DaylightSource;

const SERVICE: &str = "sunrise-sunset";

/// Sunrise/sunset times from a sunrise-sunset.org compatible endpoint.
#[derive(Debug, Clone)]
pub struct SunriseSunsetSource {
    url: String,
    http: Client,
}

impl SunriseSunsetSource {
    pub fn new(url: String, http: Client) -> Self {
        Self { url, http }
    }
}

#[async_trait]
impl DaylightSource for SunriseSunsetSource {
    async fn fetch_daylight(&self, location: Location) -> Result<DaylightWindow> {
        // formatted=0 makes the API answer with ISO-8601 timestamps in UTC.
        let res = self
            .http
            .get(&self.url)
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lng", location.longitude.to_string()),
                ("formatted", "0".to_string()),
            ])
            .send()
            .await
            .map_err(|source| Error::Network { service: SERVICE, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| Error::Network { service: SERVICE, source })?;

        let window = parse_daylight(status, &body)?;
        tracing::debug!(
            sunrise_hour = window.sunrise_hour,
            sunset_hour = window.sunset_hour,
            "daylight window fetched"
        );

        Ok(window)
    }
}

#[derive(Debug, Deserialize)]
struct SsResults {
    sunrise: String,
    sunset: String,
}

#[derive(Debug, Deserialize)]
struct SsResponse {
    results: SsResults,
}

/// Checks `status` first, so an error page never reaches the JSON parser.
pub fn parse_daylight(status: StatusCode, body: &str) -> Result<DaylightWindow> {
    if !status.is_success() {
        return Err(Error::http_status(SERVICE, status, body));
    }

    let parsed: SsResponse = serde_json::from_str(body).map_err(|e| Error::parse(SERVICE, e))?;

    Ok(DaylightWindow {
        sunrise_hour: hour_of(&parsed.results.sunrise, "sunrise")?,
        sunset_hour: hour_of(&parsed.results.sunset, "sunset")?,
    })
}

/// Hour in the timestamp's own offset, not converted to local time.
fn hour_of(timestamp: &str, field: &str) -> Result<u32> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.hour())
        .map_err(|e| Error::parse(SERVICE, format!("{field} '{timestamp}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::test_server::{client, closed_port_url, serve_once};

    #[test]
    fn extracts_utc_hours() {
        let body = r#"{
            "results": {
                "sunrise": "2024-09-20T06:15:00+00:00",
                "sunset": "2024-09-20T18:45:00+00:00",
                "day_length": 45000
            },
            "status": "OK"
        }"#;

        let window = parse_daylight(StatusCode::OK, body).expect("should parse");
        assert_eq!(window, DaylightWindow { sunrise_hour: 6, sunset_hour: 18 });
    }

    #[test]
    fn hour_is_taken_in_reported_offset() {
        let body = r#"{"results": {
            "sunrise": "2024-09-20T23:59:00-05:00",
            "sunset": "2024-09-20T00:10:00+02:00"
        }}"#;

        let window = parse_daylight(StatusCode::OK, body).expect("should parse");
        assert_eq!(window, DaylightWindow { sunrise_hour: 23, sunset_hour: 0 });
    }

    #[test]
    fn error_status_wins_over_unparseable_body() {
        let err = parse_daylight(StatusCode::BAD_REQUEST, "not json at all").unwrap_err();

        match err {
            Error::HttpStatus { status, body, .. } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body, "not json at all");
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[test]
    fn missing_sunset_is_parse_error() {
        let body = r#"{"results": {"sunrise": "2024-09-20T06:15:00+00:00"}}"#;

        let err = parse_daylight(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn formatted_times_are_parse_errors() {
        // What the API returns when formatted=0 is forgotten.
        let body = r#"{"results": {"sunrise": "6:15:00 AM", "sunset": "6:45:00 PM"}}"#;

        let err = parse_daylight(StatusCode::OK, body).unwrap_err();
        assert!(err.to_string().contains("sunrise"));
    }

    const NYC: Location = Location { latitude: 40.7, longitude: -74.0 };

    #[tokio::test]
    async fn fetch_sends_location_and_unformatted_flag() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"results": {"sunrise": "2024-09-20T06:15:00+00:00", "sunset": "2024-09-20T18:45:00+00:00"}}"#,
        )
        .await;
        let source = SunriseSunsetSource::new(format!("{base}/json"), client());

        let window = source.fetch_daylight(NYC).await.expect("fetch should succeed");

        assert_eq!(window, DaylightWindow { sunrise_hour: 6, sunset_hour: 18 });
        let request_line = server.await.expect("server task");
        assert_eq!(request_line, "GET /json?lat=40.7&lng=-74&formatted=0 HTTP/1.1");
    }

    #[tokio::test]
    async fn fetch_reports_server_error_status() {
        let (base, server) = serve_once("500 Internal Server Error", "oops").await;
        let source = SunriseSunsetSource::new(format!("{base}/json"), client());

        let err = source.fetch_daylight(NYC).await.unwrap_err();

        match err {
            Error::HttpStatus { service, status, body } => {
                assert_eq!(service, "sunrise-sunset");
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "oops");
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn fetch_from_closed_port_is_network_error() {
        let source = SunriseSunsetSource::new(format!("{}/json", closed_port_url().await), client());

        let err = source.fetch_daylight(NYC).await.unwrap_err();
        assert!(matches!(err, Error::Network { service: "sunrise-sunset", .. }));
    }
}
