use anyhow::{Context, Result};
use dayplan_tasks::{open_store, StorageBackend, StoreResult, TaskStore};
use dayplan_weather::{WeatherClient, WeatherError, DEFAULT_LANGUAGE, FORECAST_URL, GEOCODING_URL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_DIR: &str = "dayplan";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined into one line
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Task storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Weather settings
    #[serde(default)]
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which backend holds the tasks
    #[serde(default)]
    pub backend: StorageBackend,

    /// Task file used by the json backend
    #[serde(default = "default_json_path")]
    pub json_path: PathBuf,

    /// Database file used by the sqlite backend
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_json_path() -> PathBuf {
    data_dir().join("tasks.json")
}

fn default_sqlite_path() -> PathBuf {
    data_dir().join("dayplan.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            json_path: default_json_path(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

impl StorageConfig {
    /// File backing the selected backend.
    pub fn active_path(&self) -> &Path {
        match self.backend {
            StorageBackend::Json => &self.json_path,
            StorageBackend::Sqlite => &self.sqlite_path,
        }
    }

    /// Open the selected backend.
    ///
    /// # Errors
    /// Propagates the store's error if the file or schema can't be created.
    pub fn open(&self) -> StoreResult<Box<dyn TaskStore>> {
        open_store(self.backend, self.active_path())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Open-Meteo geocoding endpoint
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// Open-Meteo forecast endpoint
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    /// Language for resolved place names
    #[serde(default = "default_language")]
    pub language: String,

    /// Location used when none is given
    #[serde(default = "default_location")]
    pub default_location: String,
}

fn default_geocoding_url() -> String {
    GEOCODING_URL.to_string()
}

fn default_forecast_url() -> String {
    FORECAST_URL.to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_location() -> String {
    "Warszawa".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            language: default_language(),
            default_location: default_location(),
        }
    }
}

impl WeatherConfig {
    /// Build a client for the configured endpoints and language.
    ///
    /// # Errors
    /// Returns `WeatherError::Client` if the HTTP client can't be constructed.
    pub fn client(&self) -> Result<WeatherClient, WeatherError> {
        Ok(
            WeatherClient::with_endpoints(&self.geocoding_url, &self.forecast_url)?
                .with_language(&self.language),
        )
    }
}

impl Config {
    /// Load configuration from the default path, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Created default config at {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.weather.geocoding_url, "weather.geocoding_url", &mut result);
        validate_url(&self.weather.forecast_url, "weather.forecast_url", &mut result);

        if self.weather.language.trim().is_empty() {
            result.add_error("weather.language", "Language must not be empty");
        }

        if self.weather.default_location.trim().is_empty() {
            result.add_warning(
                "weather.default_location",
                "No default location - weather needs an explicit location",
            );
        }

        if self.storage.active_path().as_os_str().is_empty() {
            result.add_error(
                format!("storage.{}_path", self.storage.backend),
                "Path must not be empty",
            );
        }

        result
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join(APP_DIR);

        Ok(config_dir.join("config.toml"))
    }
}

/// Validate a URL field
fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
