//! Weather lookup for Dayplan
//!
//! Resolves a place name via the Open-Meteo geocoding API, then fetches one
//! day's forecast summary for it.

pub mod types;
pub mod forecast;
pub mod geocode;
pub mod provider;

pub use types::*;
pub use forecast::{DAILY_METRICS, FORECAST_TIMEOUT, FORECAST_URL, WIND_SPEED_MAX_METRIC};
pub use geocode::{GEOCODING_TIMEOUT, GEOCODING_URL};
pub use provider::{WeatherClient, DEFAULT_LANGUAGE};
