//! Qualitative picture of a specific hour of the day.

use serde::Serialize;

use crate::comfort::{
    ComfortRating, HumidityLevel, PeriodOfDay, PrecipitationLevel, TemperatureLevel,
    VisibilityLevel, WindLevel, comfort_score,
};
use crate::sample::HistoricalSample;
use crate::stats::{self, round_to};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelReading<L> {
    pub level: L,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visibility {
    pub level: VisibilityLevel,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallCondition {
    pub rating: ComfortRating,
    pub score: u32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionAnalysis {
    pub period: PeriodOfDay,
    pub period_description: String,
    pub temperature: LevelReading<TemperatureLevel>,
    pub humidity: LevelReading<HumidityLevel>,
    pub wind: LevelReading<WindLevel>,
    pub precipitation: LevelReading<PrecipitationLevel>,
    pub visibility: Visibility,
    pub overall_condition: OverallCondition,
}

/// Classify the sample averages for `hour` and score the overall comfort.
pub fn analyze_hour_conditions(sample: &HistoricalSample, hour: u32) -> ConditionAnalysis {
    let temperature = stats::mean(&sample.temperatures()).unwrap_or_default();
    let humidity = stats::mean(&sample.humidities()).unwrap_or_default();
    let wind = stats::mean(&sample.wind_speeds()).unwrap_or_default();
    let precipitation = stats::mean(&sample.precipitations()).unwrap_or_default();

    let temperature = LevelReading {
        level: TemperatureLevel::classify(temperature),
        value: round_to(temperature, 1),
    };
    let humidity_reading = LevelReading {
        level: HumidityLevel::classify(humidity),
        value: round_to(humidity, 1),
    };
    let wind = LevelReading {
        level: WindLevel::classify(wind),
        value: round_to(wind, 1),
    };
    let precipitation_reading = LevelReading {
        level: PrecipitationLevel::classify(precipitation),
        value: round_to(precipitation, 2),
    };

    let visibility = VisibilityLevel::estimate(humidity, precipitation);
    let score = comfort_score(
        temperature.level,
        humidity_reading.level,
        wind.level,
        precipitation_reading.level,
    );
    let rating = ComfortRating::from_score(score);
    let period = PeriodOfDay::from_hour(hour);

    ConditionAnalysis {
        period,
        period_description: period.description().to_string(),
        temperature,
        humidity: humidity_reading,
        wind,
        precipitation: precipitation_reading,
        visibility: Visibility {
            level: visibility,
            description: visibility.description().to_string(),
        },
        overall_condition: OverallCondition {
            rating,
            score,
            color: rating.color().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Granularity, Reading};
    use chrono::NaiveDate;

    fn sample(values: &[(f64, f64, f64, Option<f64>)]) -> HistoricalSample {
        let readings = values
            .iter()
            .enumerate()
            .map(|(i, (t, h, w, p))| Reading {
                year: 2010 + i as i32,
                date: NaiveDate::from_ymd_opt(2010 + i as i32, 7, 15).unwrap(),
                hour: Some(14),
                temperature: *t,
                humidity: *h,
                wind_speed: *w,
                precipitation: *p,
            })
            .collect();
        HistoricalSample::new(Granularity::Hourly, 2010, 2020, readings).unwrap()
    }

    #[test]
    fn mild_calm_afternoon_is_ideal() {
        let analysis = analyze_hour_conditions(
            &sample(&[(14.0, 45.0, 1.0, Some(0.0)), (16.0, 55.0, 1.5, None)]),
            14,
        );

        assert_eq!(analysis.period, PeriodOfDay::Afternoon);
        assert_eq!(analysis.temperature.level, TemperatureLevel::Mild);
        assert_eq!(analysis.temperature.value, 15.0);
        assert_eq!(analysis.precipitation.level, PrecipitationLevel::None);
        assert_eq!(analysis.visibility.level, VisibilityLevel::Excellent);
        assert_eq!(analysis.overall_condition.rating, ComfortRating::Ideal);
        assert_eq!(analysis.overall_condition.color, "green");
    }

    #[test]
    fn stormy_night_is_adverse() {
        let analysis = analyze_hour_conditions(
            &sample(&[(-2.0, 92.0, 13.0, Some(5.0)), (-4.0, 88.0, 12.0, Some(3.0))]),
            22,
        );

        assert_eq!(analysis.period, PeriodOfDay::Night);
        assert_eq!(analysis.temperature.level, TemperatureLevel::VeryCold);
        assert_eq!(analysis.wind.level, WindLevel::VeryWindy);
        assert_eq!(analysis.precipitation.level, PrecipitationLevel::HeavyRain);
        assert_eq!(analysis.visibility.level, VisibilityLevel::Reduced);
        // 3 + 2 + 3 + 3
        assert_eq!(analysis.overall_condition.score, 11);
        assert_eq!(analysis.overall_condition.rating, ComfortRating::Adverse);
    }

    #[test]
    fn precipitation_average_ignores_unmeasured_hours() {
        let analysis = analyze_hour_conditions(
            &sample(&[(15.0, 50.0, 3.0, Some(1.5)), (15.0, 50.0, 3.0, None)]),
            8,
        );
        assert_eq!(analysis.precipitation.value, 1.5);
        assert_eq!(analysis.precipitation.level, PrecipitationLevel::ModerateRain);
        assert_eq!(analysis.visibility.level, VisibilityLevel::Good);
    }
}
