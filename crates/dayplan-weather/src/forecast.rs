//! Single-day forecast lookup for resolved coordinates.

use chrono::NaiveDate;
use reqwest::Response;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::instrument;

use crate::provider::WeatherClient;
use crate::types::{Forecast, Location, WeatherError};

pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
/// Per-request limit for forecast calls.
pub const FORECAST_TIMEOUT: Duration = Duration::from_secs(10);
const DATE_FORMAT: &str = "%Y-%m-%d";

pub const TEMPERATURE_MAX_METRIC: &str = "temperature_2m_max";
pub const TEMPERATURE_MIN_METRIC: &str = "temperature_2m_min";
pub const PRECIPITATION_SUM_METRIC: &str = "precipitation_sum";
/// Current Open-Meteo name. The legacy "windspeed_10m_max" is rejected with 400.
pub const WIND_SPEED_MAX_METRIC: &str = "wind_speed_10m_max";

/// Daily metrics requested for every forecast, in request order.
pub const DAILY_METRICS: [&str; 4] = [
    TEMPERATURE_MAX_METRIC,
    TEMPERATURE_MIN_METRIC,
    PRECIPITATION_SUM_METRIC,
    WIND_SPEED_MAX_METRIC,
];

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    /// Metric name -> per-day values, all indexed by day offset
    daily: Option<Map<String, Value>>,
}

impl WeatherClient {
    /// Fetch the forecast for exactly one day at `location`.
    ///
    /// The request is bounded by `start_date`/`end_date`; `forecast_days` is
    /// never sent alongside them since the API rejects the combination.
    ///
    /// # Errors
    /// - `Forecast` on transport failure, timeout or a non-2xx status.
    /// - `NoForecast` when the response has no daily entry for `date`.
    #[instrument(skip(self, location), fields(location = %location.display_name()), level = "info")]
    pub async fn forecast(
        &self,
        location: &Location,
        date: NaiveDate,
    ) -> Result<Forecast, WeatherError> {
        let day = date.format(DATE_FORMAT).to_string();

        let response = self
            .http
            .get(&self.forecast_url)
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("daily", DAILY_METRICS.join(",")),
                ("timezone", "auto".to_string()),
                ("start_date", day.clone()),
                ("end_date", day),
            ])
            .timeout(self.forecast_timeout)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(WeatherError::Forecast)?;

        let body: ForecastResponse = response.json().await.map_err(WeatherError::Forecast)?;
        let daily = body.daily.ok_or(WeatherError::NoForecast(date))?;

        let forecast = daily_forecast(&daily, date, location.display_name())?;
        tracing::debug!("Forecast for {}: {:?}", date, forecast);
        Ok(forecast)
    }
}

/// Build a `Forecast` from index 0 of the `daily` block.
fn daily_forecast(
    daily: &Map<String, Value>,
    date: NaiveDate,
    location_name: String,
) -> Result<Forecast, WeatherError> {
    let first_day = daily
        .get("time")
        .and_then(Value::as_array)
        .and_then(|days| days.first())
        .and_then(Value::as_str)
        .ok_or(WeatherError::NoForecast(date))?;

    let day = NaiveDate::parse_from_str(first_day, DATE_FORMAT)
        .map_err(|e| WeatherError::Parse(format!("invalid forecast date {:?}: {}", first_day, e)))?;

    if day != date {
        tracing::warn!("Forecast starts at {} instead of requested {}", day, date);
        return Err(WeatherError::NoForecast(date));
    }

    Ok(Forecast {
        date: day,
        location_name,
        tmax: first_value(daily, TEMPERATURE_MAX_METRIC),
        tmin: first_value(daily, TEMPERATURE_MIN_METRIC),
        precipitation: first_value(daily, PRECIPITATION_SUM_METRIC),
        wind_max: first_value(daily, WIND_SPEED_MAX_METRIC),
    })
}

/// First value of a metric; missing, empty or null reads as `None`.
fn first_value(daily: &Map<String, Value>, metric: &str) -> Option<f64> {
    daily.get(metric)?.as_array()?.first()?.as_f64()
}
