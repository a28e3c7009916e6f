//! The two public probability operations and the raw point query.

use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::{
    analysis::{SampleAnalysis, ThresholdPolicy, analyze},
    comfort::{DiscomfortAnalysis, analyze_discomfort},
    conditions::{ConditionAnalysis, analyze_hour_conditions},
    config::{AnalysisConfig, Config},
    error::{ProbabilityError, Result},
    model::{Coordinates, Granularity, PointQuery, PointWeather, parse_compact_date},
    provider::{PointWeatherSource, source_from_config},
    recommend::{Recommendations, hourly_recommendations},
    sample::{CalendarKey, HistoricalSample, SampleFetcher, YearRange},
};

/// Size and span of the sample a report was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleSummary {
    pub observations: usize,
    pub year_range: String,
    pub years_with_data: usize,
}

impl From<&HistoricalSample> for SampleSummary {
    fn from(sample: &HistoricalSample) -> Self {
        Self {
            observations: sample.len(),
            year_range: sample.year_range().to_string(),
            years_with_data: sample.years_with_data(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAnalysis {
    #[serde(flatten)]
    pub sample: SampleAnalysis,
    pub discomfort_analysis: DiscomfortAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyAnalysis {
    #[serde(flatten)]
    pub sample: SampleAnalysis,
    pub condition_analysis: ConditionAnalysis,
    pub recommendations: Recommendations,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub location: Coordinates,
    /// `YYYY-MM-DD`
    pub target_date: String,
    pub analysis: DailyAnalysis,
    pub historical_sample: SampleSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyReport {
    pub location: Coordinates,
    pub target_date: String,
    /// `HH:00`
    pub target_hour: String,
    pub analysis: HourlyAnalysis,
    pub historical_sample: SampleSummary,
}

/// Computes weather probabilities for a date from the same calendar day in
/// previous years.
#[derive(Debug)]
pub struct ProbabilityEngine {
    source: Box<dyn PointWeatherSource>,
    analysis: AnalysisConfig,
    current_year: Option<i32>,
}

impl ProbabilityEngine {
    pub fn new(source: Box<dyn PointWeatherSource>, analysis: AnalysisConfig) -> Self {
        Self {
            source,
            analysis,
            current_year: None,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(source_from_config(config)?, config.analysis.clone()))
    }

    /// Pin "now" to a fixed year instead of the local clock.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = Some(year);
        self
    }

    pub fn with_policy(mut self, policy: ThresholdPolicy) -> Self {
        self.analysis.threshold_policy = policy;
        self
    }

    pub fn analysis_config(&self) -> &AnalysisConfig {
        &self.analysis
    }

    fn current_year(&self) -> i32 {
        self.current_year.unwrap_or_else(|| Local::now().year())
    }

    /// Validate the shared request inputs and derive the look-back window.
    fn prepare(
        &self,
        coordinates: Coordinates,
        target_date: &str,
        years_back: u32,
        granularity: Granularity,
    ) -> Result<(NaiveDate, YearRange)> {
        coordinates.validate()?;
        let date = parse_compact_date(target_date)?;

        if years_back == 0 {
            return Err(ProbabilityError::InvalidInput(
                "years back must be at least 1".to_string(),
            ));
        }

        let current_year = self.current_year();
        if date.year() < current_year - 1 {
            return Err(ProbabilityError::InvalidInput(format!(
                "target date {date} is in the past; only {} onwards can be predicted",
                current_year - 1
            )));
        }

        let years = YearRange::derive(
            date.year(),
            years_back,
            granularity.floor_year(),
            current_year,
        );
        Ok((date, years))
    }

    /// Daily probabilities, expected values and discomfort for `target_date`
    /// (`YYYYMMDD`).
    pub async fn calculate_probabilities(
        &self,
        longitude: f64,
        latitude: f64,
        target_date: &str,
        years_back: Option<u32>,
    ) -> Result<DailyReport> {
        let coordinates = Coordinates::new(longitude, latitude);
        let years_back = years_back.unwrap_or(self.analysis.daily_years_back);
        let (date, years) = self.prepare(coordinates, target_date, years_back, Granularity::Daily)?;

        info!(
            longitude,
            latitude,
            %date,
            range = %years,
            policy = %self.analysis.threshold_policy,
            "calculating daily probabilities"
        );

        let sample = SampleFetcher::new(self.source.as_ref(), coordinates)
            .fetch_daily(CalendarKey::of(date), years, self.analysis.daily_window_days)
            .await?;

        let analysis = analyze(
            &sample,
            self.analysis.threshold_policy,
            self.analysis.uncomfortable_rule,
            self.analysis.rain_threshold(Granularity::Daily),
        );
        let discomfort = analyze_discomfort(sample.readings()).ok_or_else(|| {
            ProbabilityError::Internal("discomfort analysis of an empty sample".to_string())
        })?;

        Ok(DailyReport {
            location: coordinates,
            target_date: date.format("%Y-%m-%d").to_string(),
            analysis: DailyAnalysis {
                sample: analysis,
                discomfort_analysis: discomfort,
            },
            historical_sample: SampleSummary::from(&sample),
        })
    }

    /// Hourly probabilities, expected values, conditions and recommendations
    /// for `hour` (0-23) of `target_date` (`YYYYMMDD`).
    pub async fn calculate_hourly_probabilities(
        &self,
        longitude: f64,
        latitude: f64,
        target_date: &str,
        hour: u32,
        years_back: Option<u32>,
    ) -> Result<HourlyReport> {
        if hour > 23 {
            return Err(ProbabilityError::InvalidHour(hour));
        }

        let coordinates = Coordinates::new(longitude, latitude);
        let years_back = years_back.unwrap_or(self.analysis.hourly_years_back);
        let (date, years) =
            self.prepare(coordinates, target_date, years_back, Granularity::Hourly)?;

        info!(
            longitude,
            latitude,
            %date,
            hour,
            range = %years,
            policy = %self.analysis.threshold_policy,
            "calculating hourly probabilities"
        );

        let sample = SampleFetcher::new(self.source.as_ref(), coordinates)
            .fetch_hourly(
                CalendarKey::of(date),
                hour,
                years,
                self.analysis.hourly_request_delay(),
            )
            .await?;

        let analysis = analyze(
            &sample,
            self.analysis.threshold_policy,
            self.analysis.uncomfortable_rule,
            self.analysis.rain_threshold(Granularity::Hourly),
        );
        let conditions = analyze_hour_conditions(&sample, hour);
        let recommendations = hourly_recommendations(&analysis.probabilities, &conditions, hour);

        Ok(HourlyReport {
            location: coordinates,
            target_date: date.format("%Y-%m-%d").to_string(),
            target_hour: format!("{hour:02}:00"),
            analysis: HourlyAnalysis {
                sample: analysis,
                condition_analysis: conditions,
                recommendations,
            },
            historical_sample: SampleSummary::from(&sample),
        })
    }

    /// Raw point query between two `YYYYMMDD` dates.
    pub async fn weather_data(
        &self,
        coordinates: Coordinates,
        start: &str,
        end: &str,
        granularity: Granularity,
    ) -> Result<PointWeather> {
        coordinates.validate()?;
        let query = PointQuery {
            coordinates,
            start: parse_compact_date(start)?,
            end: parse_compact_date(end)?,
            granularity,
        };
        query.validate()?;

        Ok(self.source.fetch_point_weather(&query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comfort::{ComfortRating, DiscomfortRating};
    use crate::error::{ErrorKind, UpstreamError};
    use crate::provider::scripted::{ScriptedSource, observation};
    use approx::assert_abs_diff_eq;
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Lets a test keep a handle on the source the engine owns.
    #[derive(Debug)]
    struct Shared(Arc<ScriptedSource>);

    #[async_trait]
    impl PointWeatherSource for Shared {
        async fn fetch_point_weather(
            &self,
            query: &PointQuery,
        ) -> std::result::Result<PointWeather, UpstreamError> {
            self.0.fetch_point_weather(query).await
        }
    }

    /// 10 °C in 2016 rising by 2 °C per year.
    fn rising_source() -> ScriptedSource {
        ScriptedSource::new(|date, hour| {
            observation(date, hour, 10.0 + 2.0 * f64::from(date.year() - 2016))
        })
    }

    fn engine_with(source: ScriptedSource) -> (ProbabilityEngine, Arc<ScriptedSource>) {
        let source = Arc::new(source);
        let analysis = AnalysisConfig {
            daily_window_days: 0,
            hourly_request_delay_ms: 0,
            ..AnalysisConfig::default()
        };
        let engine = ProbabilityEngine::new(Box::new(Shared(Arc::clone(&source))), analysis)
            .with_current_year(2026);
        (engine, source)
    }

    #[tokio::test]
    async fn daily_report_over_ten_years() {
        let (engine, source) = engine_with(rising_source());

        let report = engine
            .calculate_probabilities(-68.1193, -16.4897, "20260715", None)
            .await
            .unwrap();

        assert_eq!(source.query_count(), 10);
        assert_eq!(report.target_date, "2026-07-15");
        assert_eq!(report.historical_sample.observations, 10);
        assert_eq!(report.historical_sample.year_range, "2016-2025");
        assert_eq!(report.historical_sample.years_with_data, 10);

        let temperature = &report.analysis.sample.expected_values.temperature;
        assert_eq!(temperature.average, 19.0);
        assert_eq!(temperature.min, 10.0);
        assert_eq!(temperature.max, 28.0);
        assert_eq!(temperature.p25, Some(14.5));
        assert_eq!(temperature.p75, Some(23.5));

        // Only 28 °C exceeds the 95th percentile (27.1).
        let hot = &report.analysis.sample.probabilities.very_hot;
        assert_eq!(hot.occurrences, 1);
        assert_eq!(hot.probability, 10.0);

        assert_eq!(
            report.analysis.discomfort_analysis.rating,
            DiscomfortRating::Comfortable
        );
    }

    #[tokio::test]
    async fn daily_report_serializes_camel_case() {
        let (engine, _) = engine_with(rising_source());
        let report = engine
            .calculate_probabilities(2.35, 48.85, "20260101", Some(3))
            .await
            .unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["targetDate"], "2026-01-01");
        assert_eq!(json["historicalSample"]["yearRange"], "2023-2025");
        assert!(json["analysis"]["probabilities"]["veryHot"].is_object());
        assert!(json["analysis"]["expectedValues"]["windSpeed"].is_object());
        assert!(json["analysis"]["discomfortAnalysis"]["averageScore"].is_number());
        assert_eq!(json["location"]["latitude"], 48.85);
    }

    #[tokio::test]
    async fn hourly_report_includes_conditions_and_recommendations() {
        let (engine, source) = engine_with(rising_source());

        let report = engine
            .calculate_hourly_probabilities(-68.1193, -16.4897, "20260715", 14, None)
            .await
            .unwrap();

        assert_eq!(source.query_count(), 5);
        assert_eq!(report.target_hour, "14:00");
        assert_eq!(report.historical_sample.year_range, "2021-2025");
        assert_eq!(report.historical_sample.observations, 5);

        let expected = &report.analysis.sample.expected_values;
        assert_eq!(expected.temperature.average, 24.0);
        // Heat index at 50 % humidity shifts every reading by the same amount.
        let feels_like = expected.feels_like.as_ref().unwrap();
        assert_abs_diff_eq!(feels_like.average, 22.9, epsilon = 1e-9);

        let conditions = &report.analysis.condition_analysis;
        assert_eq!(conditions.overall_condition.rating, ComfortRating::Good);

        let rec = &report.analysis.recommendations;
        assert_eq!(rec.clothing, vec!["Light, breathable clothing"]);
        assert_eq!(rec.activities, vec!["Good time for outdoor activities"]);
        assert_eq!(rec.precautions, vec!["Stay hydrated"]);
    }

    #[tokio::test]
    async fn failing_years_are_left_out() {
        let (engine, _) = engine_with(rising_source().failing([2017, 2019, 2023]));

        let report = engine
            .calculate_probabilities(10.0, 10.0, "20260715", Some(10))
            .await
            .unwrap();

        assert_eq!(report.historical_sample.observations, 7);
        assert_eq!(report.historical_sample.years_with_data, 7);
        assert_eq!(report.historical_sample.year_range, "2016-2025");
    }

    #[tokio::test]
    async fn new_year_target_never_reports_extra_years() {
        // Default ±1 day window, so each year's window crosses New Year.
        let engine = ProbabilityEngine::new(Box::new(rising_source()), AnalysisConfig::default())
            .with_current_year(2026);

        let report = engine
            .calculate_probabilities(10.0, 10.0, "20260101", Some(10))
            .await
            .unwrap();

        assert_eq!(report.historical_sample.year_range, "2016-2025");
        assert_eq!(report.historical_sample.observations, 30);
        assert_eq!(report.historical_sample.years_with_data, 10);
    }

    #[tokio::test]
    async fn every_year_failing_is_no_historical_data() {
        let (engine, source) = engine_with(rising_source().failing(2016..=2025));

        let err = engine
            .calculate_probabilities(10.0, 10.0, "20260715", Some(10))
            .await
            .unwrap_err();

        assert_eq!(source.query_count(), 10);
        assert_eq!(err.kind(), ErrorKind::NoHistoricalData);
        assert!(matches!(
            err,
            ProbabilityError::NoHistoricalData {
                start_year: 2016,
                end_year: 2025
            }
        ));
    }

    #[tokio::test]
    async fn invalid_requests_never_reach_upstream() {
        let (engine, source) = engine_with(rising_source());

        let err = engine
            .calculate_hourly_probabilities(10.0, 10.0, "20260715", 24, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbabilityError::InvalidHour(24)));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        for (lon, lat, date, years_back) in [
            (10.0, 95.0, "20260715", Some(5)),
            (181.0, 10.0, "20260715", Some(5)),
            (10.0, 10.0, "2026-07-15", Some(5)),
            (10.0, 10.0, "20260230", Some(5)),
            (10.0, 10.0, "20260715", Some(0)),
            (10.0, 10.0, "20240715", Some(5)),
        ] {
            let err = engine
                .calculate_probabilities(lon, lat, date, years_back)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{lon} {lat} {date}");
        }

        assert_eq!(source.query_count(), 0);
    }

    #[tokio::test]
    async fn last_year_is_still_accepted() {
        let (engine, _) = engine_with(rising_source());

        let report = engine
            .calculate_probabilities(10.0, 10.0, "20250715", Some(2))
            .await
            .unwrap();
        assert_eq!(report.historical_sample.year_range, "2023-2024");
    }

    #[tokio::test]
    async fn policy_override_switches_thresholds() {
        let (engine, _) = engine_with(rising_source());
        let engine = engine.with_policy(ThresholdPolicy::MeanStd);

        let report = engine
            .calculate_probabilities(10.0, 10.0, "20260715", Some(10))
            .await
            .unwrap();

        assert_eq!(report.analysis.sample.policy, ThresholdPolicy::MeanStd);
        // Population std of 10, 12, ..., 28 is sqrt(33).
        assert_abs_diff_eq!(
            report.analysis.sample.thresholds.hot,
            19.0 + 33f64.sqrt(),
            epsilon = 1e-9
        );
    }

    #[tokio::test]
    async fn weather_data_checks_the_range_first() {
        let (engine, source) = engine_with(rising_source());
        let coordinates = Coordinates::new(10.0, 10.0);

        let err = engine
            .weather_data(coordinates, "20200101", "20210301", Granularity::Hourly)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProbabilityError::Upstream(UpstreamError::DateRangeTooLarge { .. })
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(source.query_count(), 0);

        let weather = engine
            .weather_data(coordinates, "20200101", "20200103", Granularity::Daily)
            .await
            .unwrap();
        assert_eq!(weather.observations.len(), 3);
        assert_eq!(weather.metadata.total_days, 3);
    }
}
