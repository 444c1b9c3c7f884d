//! Open-Meteo client: geocoding followed by a single-day forecast.
//!
//! Every call is one independent round trip. Nothing is cached and nothing
//! is retried.

use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use tracing::instrument;

use crate::forecast::{FORECAST_TIMEOUT, FORECAST_URL};
use crate::geocode::{GEOCODING_TIMEOUT, GEOCODING_URL};
use crate::types::{Forecast, WeatherError};

/// Language for geocoded place names.
pub const DEFAULT_LANGUAGE: &str = "pl";
const USER_AGENT: &str = concat!("dayplan/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct WeatherClient {
    pub(crate) http: Client,
    pub(crate) geocoding_url: String,
    pub(crate) forecast_url: String,
    pub(crate) language: String,
    pub(crate) geocoding_timeout: Duration,
    pub(crate) forecast_timeout: Duration,
}

impl WeatherClient {
    /// Client against the public Open-Meteo endpoints.
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_endpoints(GEOCODING_URL, FORECAST_URL)
    }

    /// Client against custom endpoints (self-hosted Open-Meteo, mock servers).
    pub fn with_endpoints(
        geocoding_url: impl Into<String>,
        forecast_url: impl Into<String>,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            geocoding_url: geocoding_url.into(),
            forecast_url: forecast_url.into(),
            language: DEFAULT_LANGUAGE.to_string(),
            geocoding_timeout: GEOCODING_TIMEOUT,
            forecast_timeout: FORECAST_TIMEOUT,
        })
    }

    /// Set the language used for resolved place names.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Override the per-request limits for geocoding and forecast calls.
    pub fn with_timeouts(mut self, geocoding: Duration, forecast: Duration) -> Self {
        self.geocoding_timeout = geocoding;
        self.forecast_timeout = forecast;
        self
    }

    /// Resolve `location_name` and fetch its forecast for `date`.
    #[instrument(skip(self), level = "info")]
    pub async fn get_weather(
        &self,
        location_name: &str,
        date: NaiveDate,
    ) -> Result<Forecast, WeatherError> {
        let location = self.geocode(location_name).await?;
        self.forecast(&location, date).await
    }
}
