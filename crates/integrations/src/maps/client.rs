use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use shared::types::{Coordinates, TravelMode};

/// Google Maps Distance Matrix API client.
///
/// One instance per process; the underlying reqwest client pools connections
/// across rooms. Callers own the timeout-and-fallback policy.
pub struct MapsClient {
    client: Client,
    api_key: String,
}

impl MapsClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, api_key }
    }

    /// Get the route between two points for the given mode.
    pub async fn get_route(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
        mode: TravelMode,
    ) -> Result<RouteResult, MapsError> {
        let Some(provider_mode) = mode.provider_mode() else {
            return Err(MapsError::UnsupportedMode(mode));
        };

        let url = format!(
            "https://maps.googleapis.com/maps/api/distancematrix/json?origins={}&destinations={}&key={}&mode={}&departure_time=now",
            origin.to_lat_lng_string(),
            destination.to_lat_lng_string(),
            self.api_key,
            provider_mode,
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MapsError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MapsError::Api(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let result: DistanceMatrixResponse = response
            .json()
            .await
            .map_err(|e| MapsError::Parse(e.to_string()))?;

        if result.status != "OK" {
            return Err(MapsError::Api(format!("API error: {}", result.status)));
        }

        let element = result
            .rows
            .first()
            .and_then(|r| r.elements.first())
            .ok_or_else(|| MapsError::Api("No results returned".to_string()))?;

        if element.status != "OK" {
            return Err(MapsError::Api(format!(
                "Element error: {}",
                element.status
            )));
        }

        let duration = element
            .duration_in_traffic
            .as_ref()
            .or(element.duration.as_ref())
            .ok_or_else(|| MapsError::Api("No duration in response".to_string()))?;

        let distance = element
            .distance
            .as_ref()
            .ok_or_else(|| MapsError::Api("No distance in response".to_string()))?;

        Ok(RouteResult {
            duration_minutes: duration.value / 60,
            distance_meters: distance.value,
            distance_text: Some(distance.text.clone()),
        })
    }
}

/// Result of a route lookup.
#[derive(Debug, Clone)]
pub struct RouteResult {
    pub duration_minutes: i32,
    pub distance_meters: i32,
    pub distance_text: Option<String>,
}

/// Errors from the Distance Matrix API.
#[derive(Debug, thiserror::Error)]
pub enum MapsError {
    #[error("Request error: {0}")]
    Request(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Travel mode {0} has no provider mapping")]
    UnsupportedMode(TravelMode),
}

// Response types for Distance Matrix API
#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    rows: Vec<DistanceMatrixRow>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixRow {
    elements: Vec<DistanceMatrixElement>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixElement {
    status: String,
    duration: Option<DurationValue>,
    duration_in_traffic: Option<DurationValue>,
    distance: Option<DistanceValue>,
}

#[derive(Debug, Deserialize)]
struct DurationValue {
    value: i32, // seconds
    #[allow(dead_code)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct DistanceValue {
    value: i32, // meters
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mode_none_is_rejected_before_any_request() {
        let client = MapsClient::new("test-key".to_string(), Duration::from_secs(3));
        let a = Coordinates::new_unchecked(37.5665, 126.9780);
        let b = Coordinates::new_unchecked(37.6000, 127.0200);

        let err = client.get_route(&a, &b, TravelMode::None).await.unwrap_err();
        assert!(matches!(err, MapsError::UnsupportedMode(TravelMode::None)));
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "status": "OK",
            "rows": [{
                "elements": [{
                    "status": "OK",
                    "duration": {"value": 1080, "text": "18 mins"},
                    "distance": {"value": 9200, "text": "9.2 km"}
                }]
            }]
        }"#;
        let parsed: DistanceMatrixResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.status, "OK");
        let element = &parsed.rows[0].elements[0];
        assert_eq!(element.duration.as_ref().unwrap().value, 1080);
        assert_eq!(element.distance.as_ref().unwrap().text, "9.2 km");
    }
}
