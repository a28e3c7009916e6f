use crate::{
    Config,
    error::UpstreamError,
    model::{PointQuery, PointWeather},
    provider::nasa_power::NasaPowerSource,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod nasa_power;

/// A point-query service returning historical measurements for one coordinate.
#[async_trait]
pub trait PointWeatherSource: Send + Sync + Debug {
    async fn fetch_point_weather(&self, query: &PointQuery) -> Result<PointWeather, UpstreamError>;
}

/// Construct the upstream source described by the config.
pub fn source_from_config(config: &Config) -> anyhow::Result<Box<dyn PointWeatherSource>> {
    let source = NasaPowerSource::from_config(&config.upstream)?;
    Ok(Box::new(source))
}
