//! Dayplan - tasks and weather for a chosen day.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use dayplan_core::Config;
use dayplan_tasks::{Task, TaskStore};
use dayplan_weather::{Forecast, WeatherError};

#[derive(Parser, Debug)]
#[command(name = "dayplan")]
#[command(about = "Daily tasks with a weather forecast")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "DAYPLAN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a task
    Add {
        text: String,
        #[command(flatten)]
        scope: Scope,
    },
    /// List the tasks of a day
    List {
        #[command(flatten)]
        scope: Scope,
        /// Show tasks of every location
        #[arg(long)]
        all_locations: bool,
    },
    /// Mark a task done, or not done again
    Toggle { id: i64 },
    /// Delete a task
    Delete { id: i64 },
    /// Show the forecast for a day
    Weather {
        #[command(flatten)]
        scope: Scope,
    },
}

#[derive(clap::Args, Debug, Default)]
struct Scope {
    /// Day as YYYY-MM-DD (defaults to today)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Location name (defaults to weather.default_location)
    #[arg(short, long)]
    location: Option<String>,
}

impl Scope {
    fn date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }

    fn location<'a>(&'a self, config: &'a Config) -> &'a str {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(config.weather.default_location.trim())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dayplan_core::init()?;

    let cli = Cli::parse();
    let (config, _) = Config::load_validated(cli.config.as_deref())?;

    match cli.command {
        Command::Add { text, scope } => {
            let text = text.trim();
            if text.is_empty() {
                anyhow::bail!("Task text must not be empty");
            }
            let location = scope.location(&config);
            let id = open_store(&config)?.add_task(
                scope.date(),
                text,
                Some(location).filter(|l| !l.is_empty()),
            )?;
            println!("Added task {}", id);
        }
        Command::List {
            scope,
            all_locations,
        } => {
            let date = scope.date();
            let location = (!all_locations).then(|| scope.location(&config));
            let tasks = open_store(&config)?.list_tasks(date, location)?;
            print!("{}", render_tasks(date, location, &tasks));
        }
        Command::Toggle { id } => {
            let matched = open_store(&config)?.toggle_task(id)?;
            println!("{}", outcome("Toggled", id, matched));
        }
        Command::Delete { id } => {
            let matched = open_store(&config)?.delete_task(id)?;
            println!("{}", outcome("Deleted", id, matched));
        }
        Command::Weather { scope } => {
            let client = config.weather.client()?;
            let location = scope.location(&config);

            match client.get_weather(location, scope.date()).await {
                Ok(forecast) => print!("{}", render_forecast(&forecast, location)),
                Err(e) if e.is_not_found() || matches!(e, WeatherError::EmptyLocation) => {
                    println!("{}", e.user_message());
                }
                Err(e) => {
                    tracing::error!("Weather lookup failed: {}", e);
                    let message = e.user_message();
                    return Err(anyhow::Error::new(e).context(message));
                }
            }
        }
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<Box<dyn TaskStore>> {
    config.storage.open().with_context(|| {
        format!(
            "Failed to open task store at {}",
            config.storage.active_path().display()
        )
    })
}

fn outcome(action: &str, id: i64, matched: bool) -> String {
    if matched {
        format!("{} task {}", action, id)
    } else {
        format!("No task {}, nothing changed", id)
    }
}

fn render_tasks(date: NaiveDate, location: Option<&str>, tasks: &[Task]) -> String {
    let mut out = match location {
        Some(location) => format!("Tasks for {} in {}\n", date, location),
        None => format!("Tasks for {}\n", date),
    };

    if tasks.is_empty() {
        out.push_str("  (none)\n");
    }
    for task in tasks {
        let mark = if task.done { 'x' } else { ' ' };
        out.push_str(&format!("  [{}] {:>3}  {}", mark, task.id, task.text));
        if let Some(location) = &task.location {
            out.push_str(&format!("  @{}", location));
        }
        out.push('\n');
    }
    out
}

fn render_forecast(forecast: &Forecast, requested: &str) -> String {
    let name = if forecast.location_name.is_empty() {
        requested
    } else {
        forecast.location_name.as_str()
    };

    format!(
        "{} on {}\n  max {}  min {}\n  precipitation {}\n  wind up to {}\n",
        name,
        forecast.date,
        metric(forecast.tmax, "°C"),
        metric(forecast.tmin, "°C"),
        metric(forecast.precipitation, "mm"),
        metric(forecast.wind_max, "km/h"),
    )
}

fn metric(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.1} {}", v, unit),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_cli_parses_add() {
        let cli = Cli::try_parse_from([
            "dayplan", "add", "Buy milk", "--date", "2024-06-01", "--location", "Warsaw",
        ])
        .unwrap();

        match cli.command {
            Command::Add { text, scope } => {
                assert_eq!(text, "Buy milk");
                assert_eq!(scope.date, Some(june_first()));
                assert_eq!(scope.location.as_deref(), Some("Warsaw"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_bad_date() {
        assert!(Cli::try_parse_from(["dayplan", "list", "--date", "01.06.2024"]).is_err());
    }

    #[test]
    fn test_scope_location_falls_back_to_config() {
        let config = Config::default();
        let blank = Scope {
            date: None,
            location: Some("  ".to_string()),
        };
        assert_eq!(blank.location(&config), "Warszawa");
        assert_eq!(Scope::default().location(&config), "Warszawa");

        let given = Scope {
            date: None,
            location: Some(" Krakow ".to_string()),
        };
        assert_eq!(given.location(&config), "Krakow");
    }

    #[test]
    fn test_outcome_reports_unknown_id() {
        assert_eq!(outcome("Toggled", 3, true), "Toggled task 3");
        assert_eq!(outcome("Deleted", 42, false), "No task 42, nothing changed");
    }

    #[test]
    fn test_render_tasks() {
        let tasks = vec![
            Task {
                id: 1,
                task_date: june_first(),
                text: "Buy milk".to_string(),
                location: Some("Warsaw".to_string()),
                done: true,
            },
            Task {
                id: 2,
                task_date: june_first(),
                text: "Call mom".to_string(),
                location: None,
                done: false,
            },
        ];

        let out = render_tasks(june_first(), Some("Warsaw"), &tasks);
        assert_eq!(
            out,
            "Tasks for 2024-06-01 in Warsaw\n  [x]   1  Buy milk  @Warsaw\n  [ ]   2  Call mom\n"
        );
        assert!(render_tasks(june_first(), None, &[]).contains("(none)"));
    }

    #[test]
    fn test_render_forecast_with_missing_metric() {
        let forecast = Forecast {
            date: june_first(),
            location_name: String::new(),
            tmax: Some(24.25),
            tmin: Some(13.0),
            precipitation: None,
            wind_max: Some(17.9),
        };

        let out = render_forecast(&forecast, "Warszawa");
        assert!(out.starts_with("Warszawa on 2024-06-01\n"));
        assert!(out.contains("max 24.2 °C") || out.contains("max 24.3 °C"));
        assert!(out.contains("precipitation n/a"));
        assert!(out.contains("wind up to 17.9 km/h"));
    }
}
