use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Geographic location resolved from a free-text place name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

impl Location {
    /// Human-readable name, e.g. "Warszawa, Polska".
    ///
    /// Missing or empty parts are dropped; an unnamed location renders as "".
    pub fn display_name(&self) -> String {
        [self.name.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One day's aggregated forecast for one location.
///
/// Each metric is `None` when the upstream response omitted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub date: NaiveDate,
    pub location_name: String,
    /// Maximum air temperature at 2 m, °C
    pub tmax: Option<f64>,
    /// Minimum air temperature at 2 m, °C
    pub tmin: Option<f64>,
    /// Precipitation sum, mm
    pub precipitation: Option<f64>,
    /// Maximum wind speed at 10 m, km/h
    pub wind_max: Option<f64>,
}

/// Weather lookup errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Location name is empty")]
    EmptyLocation,
    #[error("Location not found: {0}")]
    LocationNotFound(String),
    #[error("No forecast data for {0}")]
    NoForecast(NaiveDate),
    #[error("Geocoding request failed: {0}")]
    Geocoding(#[source] reqwest::Error),
    #[error("Forecast request failed: {0}")]
    Forecast(#[source] reqwest::Error),
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(String),
}

impl WeatherError {
    /// True when the service answered but had nothing for the request.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::LocationNotFound(_) | Self::NoForecast(_))
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyLocation => "Enter a location first.",
            Self::LocationNotFound(_) => "Location not found. Check and try again.",
            Self::NoForecast(_) => "No weather data for this date.",
            Self::Geocoding(_) | Self::Forecast(_) => {
                "Weather service unavailable. Please try again later."
            }
            Self::Client(_) => "Unable to start the weather client.",
            Self::Parse(_) => "Received an unexpected weather response.",
        }
    }
}
