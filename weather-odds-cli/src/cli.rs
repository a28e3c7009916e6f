use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use weather_odds_core::{
    Config, Coordinates, Granularity, ProbabilityEngine, ProbabilityError, ThresholdPolicy,
};

use crate::{configure, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-odds",
    version,
    about = "Odds of extreme weather for a place and date, from past years"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct Location {
    /// Latitude in degrees, -90 to 90.
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in degrees, -180 to 180.
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Probabilities for a whole day.
    Daily {
        #[command(flatten)]
        location: Location,

        /// Target date as YYYYMMDD; defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// How many past years to sample; defaults to the configured value.
        #[arg(long)]
        years_back: Option<u32>,

        /// Threshold policy: "percentile" or "mean-std".
        #[arg(long, value_parser = parse_policy)]
        policy: Option<ThresholdPolicy>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Probabilities, conditions and advice for one hour of a day.
    Hourly {
        #[command(flatten)]
        location: Location,

        /// Target date as YYYYMMDD; defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Hour of the day, 0-23.
        #[arg(long)]
        hour: u32,

        #[arg(long)]
        years_back: Option<u32>,

        #[arg(long, value_parser = parse_policy)]
        policy: Option<ThresholdPolicy>,

        #[arg(long)]
        json: bool,
    },

    /// Raw upstream observations between two dates.
    Data {
        #[command(flatten)]
        location: Location,

        /// First date as YYYYMMDD.
        #[arg(long)]
        start: String,

        /// Last date as YYYYMMDD.
        #[arg(long)]
        end: String,

        /// Query hourly instead of daily observations.
        #[arg(long)]
        hourly: bool,

        #[arg(long)]
        json: bool,
    },

    /// Interactively set analysis defaults.
    Configure,

    /// Print the config file location.
    ConfigPath,
}

fn parse_policy(value: &str) -> anyhow::Result<ThresholdPolicy> {
    ThresholdPolicy::try_from(value)
}

/// Wrap an engine error so the kind leads the message.
fn with_kind(err: ProbabilityError) -> anyhow::Error {
    let kind = err.kind();
    anyhow::Error::new(err).context(format!("request failed ({kind})"))
}

fn today() -> String {
    chrono::Local::now().format("%Y%m%d").to_string()
}

fn engine(config: &Config, policy: Option<ThresholdPolicy>) -> anyhow::Result<ProbabilityEngine> {
    let engine = ProbabilityEngine::from_config(config)?;
    let engine = match policy {
        Some(policy) => engine.with_policy(policy),
        None => engine,
    };
    debug!(
        policy = %engine.analysis_config().threshold_policy,
        "engine ready"
    );
    Ok(engine)
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Daily {
                location,
                date,
                years_back,
                policy,
                json,
            } => {
                let config = Config::load()?;
                let report = engine(&config, policy)?
                    .calculate_probabilities(
                        location.lon,
                        location.lat,
                        &date.unwrap_or_else(today),
                        years_back,
                    )
                    .await
                    .map_err(with_kind)?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", render::daily_report(&report));
                }
            }

            Command::Hourly {
                location,
                date,
                hour,
                years_back,
                policy,
                json,
            } => {
                let config = Config::load()?;
                let report = engine(&config, policy)?
                    .calculate_hourly_probabilities(
                        location.lon,
                        location.lat,
                        &date.unwrap_or_else(today),
                        hour,
                        years_back,
                    )
                    .await
                    .map_err(with_kind)?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", render::hourly_report(&report));
                }
            }

            Command::Data {
                location,
                start,
                end,
                hourly,
                json,
            } => {
                let config = Config::load()?;
                let granularity = if hourly {
                    Granularity::Hourly
                } else {
                    Granularity::Daily
                };
                let weather = engine(&config, None)?
                    .weather_data(
                        Coordinates::new(location.lon, location.lat),
                        &start,
                        &end,
                        granularity,
                    )
                    .await
                    .map_err(with_kind)?;

                if json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&weather)
                            .context("Failed to serialize weather data")?
                    );
                } else {
                    print!("{}", render::point_weather(&weather));
                }
            }

            Command::Configure => configure::run()?,

            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
            }
        }

        Ok(())
    }
}
