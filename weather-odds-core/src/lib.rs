//! Core library for the `weather-odds` CLI.
//!
//! This crate defines:
//! - Configuration handling
//! - The upstream point-query source (NASA POWER)
//! - Historical sampling, statistics and comfort classification
//! - The probability engine exposing daily and hourly reports
//!
//! It is used by `weather-odds-cli`, but can also be reused by other binaries or services.

pub mod analysis;
pub mod comfort;
pub mod conditions;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod provider;
pub mod recommend;
pub mod sample;
pub mod stats;

pub use analysis::{ThresholdPolicy, UncomfortableRule};
pub use config::{AnalysisConfig, Config, UpstreamConfig};
pub use engine::{DailyReport, HourlyReport, ProbabilityEngine};
pub use error::{ErrorKind, ProbabilityError, UpstreamError};
pub use model::{Coordinates, Granularity, Observation, PointQuery, PointWeather};
pub use provider::PointWeatherSource;
