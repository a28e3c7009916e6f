use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::analysis::{ThresholdPolicy, UncomfortableRule};
use crate::model::Granularity;

/// Where and how to reach the upstream point-query service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub daily_url: String,
    pub hourly_url: String,
    pub community: String,
    pub daily_timeout_secs: u64,
    pub hourly_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            daily_url: "https://power.larc.nasa.gov/api/temporal/daily/point".to_string(),
            hourly_url: "https://power.larc.nasa.gov/api/temporal/hourly/point".to_string(),
            community: "RE".to_string(),
            daily_timeout_secs: 30,
            hourly_timeout_secs: 60,
        }
    }
}

impl UpstreamConfig {
    pub fn url(&self, granularity: Granularity) -> &str {
        match granularity {
            Granularity::Daily => &self.daily_url,
            Granularity::Hourly => &self.hourly_url,
        }
    }

    pub fn timeout(&self, granularity: Granularity) -> Duration {
        match granularity {
            Granularity::Daily => Duration::from_secs(self.daily_timeout_secs),
            Granularity::Hourly => Duration::from_secs(self.hourly_timeout_secs),
        }
    }
}

/// Tunables of the probability engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub threshold_policy: ThresholdPolicy,
    pub uncomfortable_rule: UncomfortableRule,
    pub daily_rain_threshold_mm: f64,
    pub hourly_rain_threshold_mm: f64,
    /// Pause between consecutive per-year hourly requests.
    pub hourly_request_delay_ms: u64,
    /// Days queried on each side of the target date in daily mode.
    pub daily_window_days: u32,
    pub daily_years_back: u32,
    pub hourly_years_back: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold_policy: ThresholdPolicy::default(),
            uncomfortable_rule: UncomfortableRule::default(),
            daily_rain_threshold_mm: 5.0,
            hourly_rain_threshold_mm: 2.0,
            hourly_request_delay_ms: 200,
            daily_window_days: 1,
            daily_years_back: 10,
            hourly_years_back: 5,
        }
    }
}

impl AnalysisConfig {
    pub fn rain_threshold(&self, granularity: Granularity) -> f64 {
        match granularity {
            Granularity::Daily => self.daily_rain_threshold_mm,
            Granularity::Hourly => self.hourly_rain_threshold_mm,
        }
    }

    pub fn hourly_request_delay(&self) -> Duration {
        Duration::from_millis(self.hourly_request_delay_ms)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [upstream]
/// community = "RE"
///
/// [analysis]
/// threshold_policy = "mean-std"
/// hourly_request_delay_ms = 250
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-odds", "weather-odds")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
