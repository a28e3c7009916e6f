use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ProbabilityError, UpstreamError};

/// Value used by the upstream format for "not measured".
pub const SENTINEL: f64 = -999.0;

/// Longest span accepted for a single hourly point query.
pub const MAX_HOURLY_RANGE_DAYS: i64 = 366;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    pub fn validate(&self) -> Result<(), ProbabilityError> {
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ProbabilityError::InvalidInput(format!(
                "longitude {} is outside [-180, 180]",
                self.longitude
            )));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ProbabilityError::InvalidInput(format!(
                "latitude {} is outside [-90, 90]",
                self.latitude
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Hourly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Hourly => "hourly",
        }
    }

    /// Earliest year the upstream source has reliable data for.
    pub fn floor_year(&self) -> i32 {
        match self {
            Granularity::Daily => 1981,
            Granularity::Hourly => 2001,
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One point-in-day or point-in-time measurement as delivered upstream.
///
/// Every measured field is optional; a value equal to [`SENTINEL`] is
/// treated exactly like an absent one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    /// °C
    pub temperature: Option<f64>,
    /// %
    pub humidity: Option<f64>,
    /// m/s
    pub wind_speed: Option<f64>,
    /// mm per day or per hour, depending on granularity
    pub precipitation: Option<f64>,
    /// kPa
    pub pressure: Option<f64>,
    pub solar_radiation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,
}

fn measured(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != SENTINEL && !v.is_nan())
}

impl Observation {
    pub fn year(&self) -> Option<i32> {
        self.date.map(|d| d.year())
    }

    /// Valid iff temperature, humidity and wind speed are all measured.
    pub fn is_valid(&self) -> bool {
        self.reading().is_some()
    }

    /// The validated core values, or `None` if the observation is unusable.
    pub fn reading(&self) -> Option<Reading> {
        let date = self.date?;
        Some(Reading {
            year: date.year(),
            date,
            hour: self.hour,
            temperature: measured(self.temperature)?,
            humidity: measured(self.humidity)?,
            wind_speed: measured(self.wind_speed)?,
            precipitation: measured(self.precipitation),
        })
    }
}

/// A valid observation, as kept in a historical sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Year the reading was sampled for. Equals `date.year()` except when a
    /// daily window crosses New Year.
    pub year: i32,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub precipitation: Option<f64>,
}

/// A bounded-range point query against the upstream source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointQuery {
    pub coordinates: Coordinates,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
}

impl PointQuery {
    pub fn validate(&self) -> Result<(), UpstreamError> {
        if self.end < self.start {
            return Err(UpstreamError::InvalidDateRange {
                start: self.start,
                end: self.end,
            });
        }

        let days = (self.end - self.start).num_days();
        if self.granularity == Granularity::Hourly && days > MAX_HOURLY_RANGE_DAYS {
            return Err(UpstreamError::DateRangeTooLarge {
                days,
                max: MAX_HOURLY_RANGE_DAYS,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    pub units: String,
    pub longname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointMetadata {
    pub total_records: usize,
    pub total_days: usize,
    pub source: String,
    pub granularity: Granularity,
    /// Keyed by friendly parameter name, e.g. `temperature`.
    pub parameters: BTreeMap<String, ParameterInfo>,
}

/// Result of one point query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointWeather {
    pub observations: Vec<Observation>,
    /// Keyed by upstream parameter code, e.g. `T2M`.
    pub statistics: BTreeMap<String, ParameterStats>,
    pub metadata: PointMetadata,
}

impl PointWeather {
    /// Wrap decoded observations; statistics and parameter info start empty.
    pub fn from_observations(
        granularity: Granularity,
        observations: Vec<Observation>,
        source: &str,
    ) -> Self {
        let total_records = observations.len();
        let total_days = match granularity {
            Granularity::Daily => total_records,
            Granularity::Hourly => total_records.div_ceil(24),
        };

        Self {
            observations,
            statistics: BTreeMap::new(),
            metadata: PointMetadata {
                total_records,
                total_days,
                source: source.to_string(),
                granularity,
                parameters: BTreeMap::new(),
            },
        }
    }
}

/// Parse a `YYYYMMDD` date.
pub fn parse_compact_date(value: &str) -> Result<NaiveDate, ProbabilityError> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProbabilityError::InvalidInput(format!(
            "date '{value}' must be formatted as YYYYMMDD"
        )));
    }

    NaiveDate::parse_from_str(value, "%Y%m%d").map_err(|_| {
        ProbabilityError::InvalidInput(format!("date '{value}' is not a valid calendar date"))
    })
}

pub fn format_compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(temperature: Option<f64>, humidity: Option<f64>, wind: Option<f64>) -> Observation {
        Observation {
            date: NaiveDate::from_ymd_opt(2020, 7, 15),
            temperature,
            humidity,
            wind_speed: wind,
            ..Default::default()
        }
    }

    #[test]
    fn sentinel_or_missing_core_fields_invalidate() {
        assert!(observation(Some(20.0), Some(50.0), Some(3.0)).is_valid());
        assert!(!observation(Some(SENTINEL), Some(50.0), Some(3.0)).is_valid());
        assert!(!observation(Some(20.0), None, Some(3.0)).is_valid());
        assert!(!observation(Some(20.0), Some(50.0), Some(SENTINEL)).is_valid());
    }

    #[test]
    fn missing_precipitation_keeps_observation_valid() {
        let mut obs = observation(Some(20.0), Some(50.0), Some(3.0));
        obs.precipitation = Some(SENTINEL);

        let reading = obs.reading().expect("still valid");
        assert_eq!(reading.precipitation, None);
        assert_eq!(reading.year, 2020);
    }

    #[test]
    fn coordinates_out_of_range_are_rejected() {
        assert!(Coordinates::new(-68.1, -16.5).validate().is_ok());
        assert!(Coordinates::new(181.0, 0.0).validate().is_err());
        assert!(Coordinates::new(0.0, -90.5).validate().is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn compact_dates_parse_strictly() {
        assert_eq!(
            parse_compact_date("20260715").unwrap(),
            NaiveDate::from_ymd_opt(2026, 7, 15).unwrap()
        );
        assert!(parse_compact_date("2026-07-15").is_err());
        assert!(parse_compact_date("20260230").is_err());
        assert_eq!(format_compact_date(NaiveDate::from_ymd_opt(2001, 1, 9).unwrap()), "20010109");
    }

    #[test]
    fn point_query_rejects_reversed_and_oversized_ranges() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 10).unwrap();
        let mut query = PointQuery {
            coordinates: Coordinates::new(0.0, 0.0),
            start,
            end: NaiveDate::from_ymd_opt(2020, 1, 9).unwrap(),
            granularity: Granularity::Daily,
        };
        assert!(matches!(query.validate(), Err(UpstreamError::InvalidDateRange { .. })));

        query.end = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        assert!(query.validate().is_ok());

        query.granularity = Granularity::Hourly;
        assert!(matches!(query.validate(), Err(UpstreamError::DateRangeTooLarge { .. })));
    }
}
