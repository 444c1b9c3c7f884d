//! Forward geocoding: turn a free-text place name into coordinates.
//! Uses the Open-Meteo geocoding API - free, no API key required.

use reqwest::Response;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

use crate::provider::WeatherClient;
use crate::types::{Location, WeatherError};

pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
/// Per-request limit for geocoding calls.
pub const GEOCODING_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    // Absent entirely when nothing matched
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    latitude: f64,
    longitude: f64,
    name: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

impl From<GeocodingResult> for Location {
    fn from(result: GeocodingResult) -> Self {
        Self {
            latitude: result.latitude,
            longitude: result.longitude,
            name: result.name,
            country: result.country,
            country_code: result.country_code,
        }
    }
}

impl WeatherClient {
    /// Resolve a place name to its best match.
    ///
    /// # Errors
    /// - `EmptyLocation` for a blank name; no request is sent.
    /// - `LocationNotFound` when the service has no match.
    /// - `Geocoding` on transport failure, timeout or a non-2xx status.
    #[instrument(skip(self), level = "info")]
    pub async fn geocode(&self, location_name: &str) -> Result<Location, WeatherError> {
        let name = location_name.trim();
        if name.is_empty() {
            return Err(WeatherError::EmptyLocation);
        }

        let response = self
            .http
            .get(&self.geocoding_url)
            .query(&[
                ("name", name),
                ("count", "1"),
                ("language", self.language.as_str()),
                ("format", "json"),
            ])
            .timeout(self.geocoding_timeout)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(WeatherError::Geocoding)?;

        let body: GeocodingResponse = response.json().await.map_err(WeatherError::Geocoding)?;

        let location: Location = body
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::LocationNotFound(name.to_string()))?
            .into();

        tracing::info!(
            "Geocoded {:?} to {} ({}, {})",
            name,
            location.display_name(),
            location.latitude,
            location.longitude
        );
        Ok(location)
    }
}
