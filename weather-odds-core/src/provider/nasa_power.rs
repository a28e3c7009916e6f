use std::collections::BTreeMap;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::UpstreamConfig,
    error::UpstreamError,
    model::{
        Granularity, Observation, ParameterInfo, ParameterStats, PointQuery, PointWeather,
        SENTINEL, format_compact_date,
    },
};

use super::PointWeatherSource;

const SOURCE_LABEL: &str = "NASA POWER API";

const DAILY_PARAMETERS: &[&str] = &[
    "PRECTOTCORR",
    "T2M",
    "RH2M",
    "WS10M",
    "PS",
    "CLOUD_AMT_DAY",
    "ALLSKY_SFC_UV_INDEX",
    "ALLSKY_SFC_SW_DWN",
];

const HOURLY_PARAMETERS: &[&str] = &["PRECTOTCORR", "T2M", "RH2M", "WS10M", "PS", "ALLSKY_SFC_SW_DWN"];

/// Friendly name of an upstream parameter code.
fn friendly_name(code: &str) -> &str {
    match code {
        "PRECTOTCORR" => "precipitation",
        "T2M" => "temperature",
        "RH2M" => "humidity",
        "WS10M" => "windSpeed",
        "PS" => "pressure",
        "CLOUD_AMT_DAY" => "cloudAmount",
        "ALLSKY_SFC_UV_INDEX" => "uvIndex",
        "ALLSKY_SFC_SW_DWN" => "solarRadiation",
        other => other,
    }
}

/// Client for the NASA POWER temporal point API.
#[derive(Debug, Clone)]
pub struct NasaPowerSource {
    config: UpstreamConfig,
    http: Client,
}

impl NasaPowerSource {
    pub fn from_config(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .build()
            .context("Failed to build HTTP client for NASA POWER")?;

        Ok(Self {
            config: config.clone(),
            http,
        })
    }

    fn query_params(&self, query: &PointQuery) -> Vec<(&'static str, String)> {
        let parameters = match query.granularity {
            Granularity::Daily => DAILY_PARAMETERS,
            Granularity::Hourly => HOURLY_PARAMETERS,
        };

        vec![
            ("parameters", parameters.join(",")),
            ("community", self.config.community.clone()),
            ("longitude", query.coordinates.longitude.to_string()),
            ("latitude", query.coordinates.latitude.to_string()),
            ("start", format_compact_date(query.start)),
            ("end", format_compact_date(query.end)),
            ("format", "JSON".to_string()),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct PowerParameterInfo {
    #[serde(default)]
    units: String,
    #[serde(default)]
    longname: String,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    parameter: BTreeMap<String, BTreeMap<String, Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct PowerResponse {
    properties: Option<PowerProperties>,
    #[serde(default)]
    parameters: BTreeMap<String, PowerParameterInfo>,
}

#[async_trait]
impl PointWeatherSource for NasaPowerSource {
    async fn fetch_point_weather(&self, query: &PointQuery) -> Result<PointWeather, UpstreamError> {
        query.validate()?;

        let url = self.config.url(query.granularity);
        debug!(
            url,
            start = %query.start,
            end = %query.end,
            granularity = %query.granularity,
            "requesting point weather"
        );

        let res = self
            .http
            .get(url)
            .query(&self.query_params(query))
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.config.timeout(query.granularity))
            .send()
            .await
            .map_err(|source| UpstreamError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| UpstreamError::Request {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        decode_response(&body, query.granularity)
    }
}

/// Decode a POWER JSON body into observations, statistics and metadata.
pub fn decode_response(body: &str, granularity: Granularity) -> Result<PointWeather, UpstreamError> {
    let parsed: PowerResponse = serde_json::from_str(body)?;
    let properties = parsed.properties.ok_or(UpstreamError::DataUnavailable)?;
    let series = &properties.parameter;

    let value = |code: &str, key: &str| series.get(code).and_then(|s| s.get(key).copied().flatten());

    // Daily timestamps follow the precipitation series, hourly ones the temperature series.
    let timeline = match granularity {
        Granularity::Daily => "PRECTOTCORR",
        Granularity::Hourly => "T2M",
    };
    let keys: Vec<&String> = series
        .get(timeline)
        .or_else(|| series.values().next())
        .map(|s| s.keys().collect())
        .unwrap_or_default();

    let observations = keys
        .into_iter()
        .filter_map(|key| {
            let key = key.as_str();
            let (date, hour) = parse_timestamp(key, granularity)?;
            Some(Observation {
                date: Some(date),
                hour,
                temperature: value("T2M", key),
                humidity: value("RH2M", key),
                wind_speed: value("WS10M", key),
                precipitation: value("PRECTOTCORR", key),
                pressure: value("PS", key),
                solar_radiation: value("ALLSKY_SFC_SW_DWN", key),
                cloud_amount: value("CLOUD_AMT_DAY", key),
                uv_index: value("ALLSKY_SFC_UV_INDEX", key),
            })
        })
        .collect();

    let mut weather = PointWeather::from_observations(granularity, observations, SOURCE_LABEL);
    weather.statistics = series
        .iter()
        .filter_map(|(code, values)| Some((code.clone(), parameter_stats(values.values())?)))
        .collect();
    weather.metadata.parameters = parsed
        .parameters
        .into_iter()
        .map(|(code, info)| {
            (
                friendly_name(&code).to_string(),
                ParameterInfo {
                    units: info.units,
                    longname: info.longname,
                },
            )
        })
        .collect();

    Ok(weather)
}

fn parameter_stats<'a>(values: impl Iterator<Item = &'a Option<f64>>) -> Option<ParameterStats> {
    let valid: Vec<f64> = values.flatten().copied().filter(|v| *v != SENTINEL).collect();
    if valid.is_empty() {
        return None;
    }

    Some(ParameterStats {
        min: valid.iter().copied().fold(f64::INFINITY, f64::min),
        max: valid.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        avg: valid.iter().sum::<f64>() / valid.len() as f64,
    })
}

/// `YYYYMMDD` for daily series, `YYYYMMDDHH` for hourly ones.
fn parse_timestamp(key: &str, granularity: Granularity) -> Option<(NaiveDate, Option<u32>)> {
    let date = NaiveDate::parse_from_str(key.get(..8)?, "%Y%m%d").ok()?;
    match granularity {
        Granularity::Daily => Some((date, None)),
        Granularity::Hourly => {
            let hour: u32 = key.get(8..10)?.parse().ok()?;
            (hour < 24).then_some((date, Some(hour)))
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
