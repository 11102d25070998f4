use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    model::IssPosition,
};

use super::IssTracker;

const SERVICE: &str = "iss-now";

/// Reads the current ISS sub-point from an open-notify compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenNotifyTracker {
    url: String,
    http: Client,
}

impl OpenNotifyTracker {
    pub fn new(url: String, http: Client) -> Self {
        Self { url, http }
    }
}

#[async_trait]
impl IssTracker for OpenNotifyTracker {
    async fn fetch_position(&self) -> Result<IssPosition> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|source| Error::Network { service: SERVICE, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| Error::Network { service: SERVICE, source })?;

        let position = parse_position(status, &body)?;
        tracing::debug!(
            latitude = position.latitude,
            longitude = position.longitude,
            "ISS position fetched"
        );

        Ok(position)
    }
}

/// Coordinates arrive as strings from open-notify, but numbers are accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Text(String),
    Number(f64),
}

impl Coordinate {
    fn degrees(&self, field: &str) -> Result<f64> {
        match self {
            Coordinate::Number(n) => Ok(*n),
            Coordinate::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| Error::parse(SERVICE, format!("{field} '{s}': {e}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OnPosition {
    latitude: Coordinate,
    longitude: Coordinate,
}

#[derive(Debug, Deserialize)]
struct OnResponse {
    iss_position: OnPosition,
    timestamp: Option<i64>,
}

pub fn parse_position(status: StatusCode, body: &str) -> Result<IssPosition> {
    if !status.is_success() {
        return Err(Error::http_status(SERVICE, status, body));
    }

    let parsed: OnResponse = serde_json::from_str(body).map_err(|e| Error::parse(SERVICE, e))?;

    Ok(IssPosition {
        latitude: parsed.iss_position.latitude.degrees("latitude")?,
        longitude: parsed.iss_position.longitude.degrees("longitude")?,
        reported_at: parsed.timestamp.and_then(|ts| DateTime::from_timestamp(ts, 0)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::test_server::{client, closed_port_url, serve_once};

    #[test]
    fn parses_string_coordinates() {
        let body = r#"{
            "message": "success",
            "timestamp": 1726833600,
            "iss_position": {"longitude": "-73.5012", "latitude": "41.0003"}
        }"#;

        let pos = parse_position(StatusCode::OK, body).expect("should parse");
        assert_eq!(pos.longitude, -73.5012);
        assert_eq!(pos.latitude, 41.0003);
        assert_eq!(pos.reported_at.map(|t| t.timestamp()), Some(1726833600));
    }

    #[test]
    fn parses_numeric_coordinates_without_timestamp() {
        let body = r#"{"iss_position": {"longitude": 3, "latitude": -4.25}}"#;

        let pos = parse_position(StatusCode::OK, body).expect("should parse");
        assert_eq!(pos.longitude, 3.0);
        assert_eq!(pos.latitude, -4.25);
        assert!(pos.reported_at.is_none());
    }

    #[test]
    fn missing_position_is_parse_error() {
        let err = parse_position(StatusCode::OK, r#"{"message": "success"}"#).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn non_numeric_coordinate_is_parse_error() {
        let body = r#"{"iss_position": {"longitude": "east", "latitude": "1.0"}}"#;

        let err = parse_position(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("longitude"));
    }

    #[test]
    fn error_status_is_reported_before_parsing() {
        let err = parse_position(StatusCode::SERVICE_UNAVAILABLE, "<html>down</html>").unwrap_err();
        assert!(matches!(
            err,
            Error::HttpStatus { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn fetch_reads_position_from_endpoint() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"message": "success", "iss_position": {"longitude": "-73.5", "latitude": "41.0"}}"#,
        )
        .await;
        let tracker = OpenNotifyTracker::new(format!("{base}/iss-now.json"), client());

        let pos = tracker.fetch_position().await.expect("fetch should succeed");

        assert_eq!((pos.longitude, pos.latitude), (-73.5, 41.0));
        let request_line = server.await.expect("server task");
        assert_eq!(request_line, "GET /iss-now.json HTTP/1.1");
    }

    #[tokio::test]
    async fn fetch_reports_server_error_status() {
        let (base, server) = serve_once("502 Bad Gateway", "upstream down").await;
        let tracker = OpenNotifyTracker::new(format!("{base}/iss-now.json"), client());

        let err = tracker.fetch_position().await.unwrap_err();

        assert!(matches!(
            err,
            Error::HttpStatus { service: "iss-now", status, .. } if status == StatusCode::BAD_GATEWAY
        ));
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn fetch_from_closed_port_is_network_error() {
        let tracker =
            OpenNotifyTracker::new(format!("{}/iss-now.json", closed_port_url().await), client());

        let err = tracker.fetch_position().await.unwrap_err();
        assert!(matches!(err, Error::Network { service: "iss-now", .. }));
    }
}
