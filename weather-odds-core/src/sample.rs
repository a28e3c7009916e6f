//! Building the year-by-year historical sample for one calendar key.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::time::Duration;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::comfort::feels_like;
use crate::error::{ProbabilityError, UpstreamError};
use crate::model::{Coordinates, Granularity, PointQuery, Reading};
use crate::provider::PointWeatherSource;

/// Inclusive span of sampled years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    /// Look-back window for `target_year`.
    ///
    /// Never samples the target year itself or the future, and never goes
    /// below `floor_year`; `years_back` is a ceiling, not a demand.
    pub fn derive(target_year: i32, years_back: u32, floor_year: i32, current_year: i32) -> Self {
        let end = (target_year - 1).min(current_year);
        let wanted = i32::try_from(years_back).unwrap_or(i32::MAX);
        let start = end.saturating_sub(wanted).saturating_add(1).max(floor_year);
        Self { start, end }
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.start..=self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start + 1) as usize
        }
    }
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Valid observations for one (location, month-day[, hour]) key across years.
///
/// Never empty: construction fails with [`ProbabilityError::NoHistoricalData`].
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalSample {
    granularity: Granularity,
    years: YearRange,
    readings: Vec<Reading>,
}

impl HistoricalSample {
    pub fn new(
        granularity: Granularity,
        start_year: i32,
        end_year: i32,
        readings: Vec<Reading>,
    ) -> Result<Self, ProbabilityError> {
        if readings.is_empty() {
            return Err(ProbabilityError::NoHistoricalData { start_year, end_year });
        }

        Ok(Self {
            granularity,
            years: YearRange {
                start: start_year,
                end: end_year,
            },
            readings,
        })
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn year_range(&self) -> YearRange {
        self.years
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Number of distinct years that contributed at least one reading.
    pub fn years_with_data(&self) -> usize {
        self.readings.iter().map(|r| r.year).collect::<BTreeSet<_>>().len()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.temperature).collect()
    }

    pub fn humidities(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.humidity).collect()
    }

    pub fn wind_speeds(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.wind_speed).collect()
    }

    /// Only the readings that carry a precipitation measurement.
    pub fn precipitations(&self) -> Vec<f64> {
        self.readings.iter().filter_map(|r| r.precipitation).collect()
    }

    pub fn feels_like(&self) -> Vec<f64> {
        self.readings
            .iter()
            .map(|r| feels_like(r.temperature, r.humidity, r.wind_speed))
            .collect()
    }
}

/// Month and day of the target date, resolved per sampled year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarKey {
    pub month: u32,
    pub day: u32,
}

impl CalendarKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    /// The key in `year`; Feb 29 falls back to Feb 28 outside leap years.
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day).or_else(|| {
            (self.month == 2 && self.day == 29)
                .then(|| NaiveDate::from_ymd_opt(year, 2, 28))
                .flatten()
        })
    }
}

/// Sequential pacing of upstream calls: a fixed pause before every call but the first.
#[derive(Debug, Clone)]
pub struct Throttle {
    delay: Duration,
    primed: bool,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            primed: false,
        }
    }

    pub async fn pace(&mut self) {
        if self.primed && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.primed = true;
    }
}

/// Builds historical samples by querying the source once per year.
#[derive(Debug)]
pub struct SampleFetcher<'a> {
    source: &'a dyn PointWeatherSource,
    coordinates: Coordinates,
}

impl<'a> SampleFetcher<'a> {
    pub fn new(source: &'a dyn PointWeatherSource, coordinates: Coordinates) -> Self {
        Self { source, coordinates }
    }

    /// Daily sample: every valid day within `window_days` of the key, per year.
    pub async fn fetch_daily(
        &self,
        key: CalendarKey,
        years: YearRange,
        window_days: u32,
    ) -> Result<HistoricalSample, ProbabilityError> {
        let window = Days::new(u64::from(window_days));
        let mut throttle = Throttle::new(Duration::ZERO);

        self.collect(Granularity::Daily, years, &mut throttle, |year| async move {
            let center = key.in_year(year).ok_or(UpstreamError::DataUnavailable)?;
            let query = PointQuery {
                coordinates: self.coordinates,
                start: center.checked_sub_days(window).unwrap_or(center),
                end: center.checked_add_days(window).unwrap_or(center),
                granularity: Granularity::Daily,
            };

            let weather = self.source.fetch_point_weather(&query).await?;
            Ok::<Vec<Reading>, UpstreamError>(weather.observations.iter().filter_map(|o| o.reading()).collect())
        })
        .await
    }

    /// Hourly sample: the single matching hour of the key's day, per year.
    pub async fn fetch_hourly(
        &self,
        key: CalendarKey,
        hour: u32,
        years: YearRange,
        delay: Duration,
    ) -> Result<HistoricalSample, ProbabilityError> {
        if hour > 23 {
            return Err(ProbabilityError::InvalidHour(hour));
        }
        let mut throttle = Throttle::new(delay);

        self.collect(Granularity::Hourly, years, &mut throttle, |year| async move {
            let day = key.in_year(year).ok_or(UpstreamError::DataUnavailable)?;
            let query = PointQuery {
                coordinates: self.coordinates,
                start: day,
                end: day,
                granularity: Granularity::Hourly,
            };

            let weather = self.source.fetch_point_weather(&query).await?;
            Ok::<Vec<Reading>, UpstreamError>(weather
                .observations
                .iter()
                .find(|o| o.hour == Some(hour))
                .and_then(|o| o.reading())
                .into_iter()
                .collect())
        })
        .await
    }

    /// Run `fetch_year` for every year in order, skipping years that fail or
    /// yield no valid readings.
    async fn collect<F, Fut>(
        &self,
        granularity: Granularity,
        years: YearRange,
        throttle: &mut Throttle,
        fetch_year: F,
    ) -> Result<HistoricalSample, ProbabilityError>
    where
        F: Fn(i32) -> Fut,
        Fut: Future<Output = Result<Vec<Reading>, UpstreamError>>,
    {
        debug!(%granularity, range = %years, "collecting historical sample");
        let mut readings = Vec::new();

        for year in years.years() {
            throttle.pace().await;

            match fetch_year(year).await {
                Ok(found) if found.is_empty() => {
                    warn!(year, %granularity, "no valid observations for year, skipping");
                }
                Ok(found) => readings.extend(found.into_iter().map(|r| Reading { year, ..r })),
                Err(err) => {
                    warn!(year, %granularity, error = %err, "upstream failed for year, skipping");
                }
            }
        }

        let sample = HistoricalSample::new(granularity, years.start, years.end, readings)?;
        info!(
            %granularity,
            range = %years,
            observations = sample.len(),
            years_with_data = sample.years_with_data(),
            "historical sample ready"
        );
        Ok(sample)
    }
}
