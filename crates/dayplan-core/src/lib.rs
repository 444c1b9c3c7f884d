pub mod config;

pub use config::{Config, StorageConfig, ValidationResult, WeatherConfig};

use anyhow::Result;

/// Initialize logging.
///
/// Honours `RUST_LOG`; defaults to `info`. Logs go to stderr so command
/// output on stdout stays clean.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!("Dayplan core initialized");
    Ok(())
}
