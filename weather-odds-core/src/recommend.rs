use serde::Serialize;

use crate::analysis::Probabilities;
use crate::comfort::{ComfortRating, PrecipitationLevel, TemperatureLevel};
use crate::conditions::ConditionAnalysis;

/// Probability above which a windy warning is emitted, percent.
const WINDY_WARNING_PROBABILITY: f64 = 30.0;
/// Probability above which a rain warning is emitted, percent.
const RAIN_WARNING_PROBABILITY: f64 = 40.0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Recommendations {
    pub clothing: Vec<String>,
    pub activities: Vec<String>,
    pub precautions: Vec<String>,
}

impl Recommendations {
    pub fn is_empty(&self) -> bool {
        self.clothing.is_empty() && self.activities.is_empty() && self.precautions.is_empty()
    }
}

/// Rule-based advice for a target hour. Rules run in a fixed order and
/// append to their buckets, so the output order is stable.
pub fn hourly_recommendations(
    probabilities: &Probabilities,
    conditions: &ConditionAnalysis,
    hour: u32,
) -> Recommendations {
    let mut out = Recommendations::default();
    let temperature = conditions.temperature.level;

    if temperature.is_cold() {
        out.clothing.push("Wear warm clothing in layers".to_string());
        if conditions.wind.level.is_windy() {
            out.clothing.push("A windbreaker is recommended".to_string());
        }
    } else if temperature.is_hot() {
        out.clothing.push("Light, breathable clothing".to_string());
        out.precautions.push("Stay hydrated".to_string());
    }

    match conditions.overall_condition.rating {
        ComfortRating::Ideal => out
            .activities
            .push("Excellent time for outdoor activities".to_string()),
        ComfortRating::Good => out
            .activities
            .push("Good time for outdoor activities".to_string()),
        _ => {}
    }

    match conditions.precipitation.level {
        PrecipitationLevel::HeavyRain => {
            out.precautions.push("Bring an umbrella or raincoat".to_string());
            out.activities.push("Consider indoor activities".to_string());
        }
        PrecipitationLevel::ModerateRain => out.precautions.push("Bring an umbrella".to_string()),
        _ => {}
    }

    if (12..=15).contains(&hour) && temperature == TemperatureLevel::VeryHot {
        out.precautions
            .push("Avoid prolonged sun exposure during peak hours".to_string());
        out.clothing.push("Use sunscreen and a hat".to_string());
    }

    if hour < 6 && temperature == TemperatureLevel::VeryCold {
        out.precautions
            .push("Coldest time of the day, take extra protection against the cold".to_string());
    }

    let windy = probabilities.very_windy.probability;
    if windy > WINDY_WARNING_PROBABILITY {
        out.precautions
            .push(format!("High probability ({windy:.1}%) of strong winds"));
    }

    let rainy = probabilities.rainy.probability;
    if rainy > RAIN_WARNING_PROBABILITY {
        out.precautions.push(format!("High probability ({rainy:.1}%) of rain"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ThresholdPolicy, UncomfortableRule, analyze};
    use crate::conditions::analyze_hour_conditions;
    use crate::model::{Granularity, Reading};
    use crate::sample::HistoricalSample;
    use chrono::NaiveDate;

    fn hourly_sample(values: &[(f64, f64, f64, f64)]) -> HistoricalSample {
        let readings = values
            .iter()
            .enumerate()
            .map(|(i, (t, h, w, p))| Reading {
                year: 2015 + i as i32,
                date: NaiveDate::from_ymd_opt(2015 + i as i32, 1, 20).unwrap(),
                hour: Some(3),
                temperature: *t,
                humidity: *h,
                wind_speed: *w,
                precipitation: Some(*p),
            })
            .collect();
        HistoricalSample::new(Granularity::Hourly, 2015, 2024, readings).unwrap()
    }

    fn recommend(sample: &HistoricalSample, hour: u32) -> Recommendations {
        let analysis = analyze(sample, ThresholdPolicy::Percentile, UncomfortableRule::Thresholds, 2.0);
        let conditions = analyze_hour_conditions(sample, hour);
        hourly_recommendations(&analysis.probabilities, &conditions, hour)
    }

    #[test]
    fn freezing_windy_dawn() {
        let sample = hourly_sample(&[
            (-5.0, 70.0, 9.0, 0.0),
            (-3.0, 70.0, 9.0, 0.0),
            (-4.0, 70.0, 10.0, 0.0),
            (-4.0, 70.0, 10.0, 0.0),
        ]);
        let rec = recommend(&sample, 3);

        assert_eq!(
            rec.clothing,
            vec!["Wear warm clothing in layers", "A windbreaker is recommended"]
        );
        assert!(rec.activities.is_empty());
        assert_eq!(
            rec.precautions,
            vec!["Coldest time of the day, take extra protection against the cold"]
        );
    }

    #[test]
    fn hot_afternoon_gets_sun_protection_after_hydration() {
        let sample = hourly_sample(&[(33.0, 35.0, 1.0, 0.0), (35.0, 35.0, 1.0, 0.0)]);
        let rec = recommend(&sample, 13);

        assert_eq!(
            rec.clothing,
            vec!["Light, breathable clothing", "Use sunscreen and a hat"]
        );
        assert_eq!(
            rec.precautions,
            vec!["Stay hydrated", "Avoid prolonged sun exposure during peak hours"]
        );
    }

    #[test]
    fn mild_hour_suggests_going_out() {
        let sample = hourly_sample(&[(15.0, 50.0, 1.0, 0.0), (16.0, 50.0, 1.0, 0.0)]);
        let rec = recommend(&sample, 10);

        assert!(rec.clothing.is_empty());
        assert_eq!(rec.activities, vec!["Excellent time for outdoor activities"]);
        assert!(rec.precautions.is_empty());
    }

    #[test]
    fn heavy_rain_and_rain_probability_warning() {
        // Every hour rains over 2 mm, so the rainy probability is 100 %.
        let sample = hourly_sample(&[(15.0, 60.0, 3.0, 5.0), (15.0, 60.0, 3.0, 6.0)]);
        let rec = recommend(&sample, 10);

        assert_eq!(rec.activities, vec!["Consider indoor activities"]);
        assert_eq!(
            rec.precautions,
            vec![
                "Bring an umbrella or raincoat".to_string(),
                "High probability (100.0%) of rain".to_string(),
            ]
        );
    }

    #[test]
    fn rain_level_decides_the_umbrella_advice() {
        let cases: [(f64, &[&str]); 4] = [
            (0.9, &[]),
            (1.0, &["Bring an umbrella"]),
            (
                3.9,
                &["Bring an umbrella", "High probability (100.0%) of rain"],
            ),
            (
                4.0,
                &["Bring an umbrella or raincoat", "High probability (100.0%) of rain"],
            ),
        ];

        for (rain, expected) in cases {
            let sample = hourly_sample(&[(15.0, 50.0, 1.0, rain), (15.0, 50.0, 1.0, rain)]);
            let rec = recommend(&sample, 10);

            assert_eq!(rec.precautions, expected, "rain {rain}");
            assert_eq!(
                rec.activities.contains(&"Consider indoor activities".to_string()),
                rain >= 4.0,
                "rain {rain}"
            );
        }
    }

    #[test]
    fn windy_probability_warning_carries_the_number() {
        // Wind mean 4, population std ~4.9: two of five hours exceed it.
        let sample = hourly_sample(&[
            (15.0, 50.0, 0.0, 0.0),
            (15.0, 50.0, 0.0, 0.0),
            (15.0, 50.0, 0.0, 0.0),
            (15.0, 50.0, 10.0, 0.0),
            (15.0, 50.0, 10.0, 0.0),
        ]);
        let analysis = analyze(&sample, ThresholdPolicy::MeanStd, UncomfortableRule::Thresholds, 2.0);
        let conditions = analyze_hour_conditions(&sample, 10);
        let rec = hourly_recommendations(&analysis.probabilities, &conditions, 10);

        assert_eq!(analysis.probabilities.very_windy.occurrences, 2);
        assert_eq!(rec.precautions, vec!["High probability (40.0%) of strong winds"]);
    }
}
