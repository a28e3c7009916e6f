//! Extreme-condition probabilities and expected values of a historical sample.

use serde::{Deserialize, Serialize};

use crate::comfort::{feels_like, heat_index};
use crate::model::Granularity;
use crate::sample::HistoricalSample;
use crate::stats::{self, percentage, round_to};

/// How "extreme" thresholds are derived from a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThresholdPolicy {
    /// Hot/cold at the 95th/5th temperature percentile, windy/humid at the 90th.
    #[default]
    Percentile,
    /// Hot/cold at mean ± one standard deviation, windy/humid at mean + one.
    MeanStd,
}

impl ThresholdPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdPolicy::Percentile => "percentile",
            ThresholdPolicy::MeanStd => "mean-std",
        }
    }

    pub const fn all() -> &'static [ThresholdPolicy] {
        &[ThresholdPolicy::Percentile, ThresholdPolicy::MeanStd]
    }
}

impl std::fmt::Display for ThresholdPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ThresholdPolicy {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "percentile" => Ok(ThresholdPolicy::Percentile),
            "mean-std" | "meanstd" => Ok(ThresholdPolicy::MeanStd),
            _ => Err(anyhow::anyhow!(
                "Unknown threshold policy '{value}'. Supported policies: percentile, mean-std."
            )),
        }
    }
}

/// Which bounds decide whether an observation is "very uncomfortable".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UncomfortableRule {
    /// Felt temperature against the hot/cold thresholds, wind against the windy one.
    #[default]
    Thresholds,
    /// Fixed comfort limits per granularity.
    Absolute,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    pub hot: f64,
    pub cold: f64,
    pub windy: f64,
    pub humid: f64,
    pub rain: f64,
}

impl Thresholds {
    pub fn derive(sample: &HistoricalSample, policy: ThresholdPolicy, rain: f64) -> Self {
        let temps = sample.temperatures();
        let wind = sample.wind_speeds();
        let humidity = sample.humidities();

        let (hot, cold, windy, humid) = match policy {
            ThresholdPolicy::Percentile => (
                stats::percentile(&temps, 95.0),
                stats::percentile(&temps, 5.0),
                stats::percentile(&wind, 90.0),
                stats::percentile(&humidity, 90.0),
            ),
            ThresholdPolicy::MeanStd => {
                let upper = |v: &[f64]| Some(stats::mean(v)? + stats::std_dev(v)?);
                let lower = |v: &[f64]| Some(stats::mean(v)? - stats::std_dev(v)?);
                (upper(&temps), lower(&temps), upper(&wind), upper(&humidity))
            }
        };

        Self {
            hot: hot.unwrap_or_default(),
            cold: cold.unwrap_or_default(),
            windy: windy.unwrap_or_default(),
            humid: humid.unwrap_or_default(),
            rain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionProbability {
    /// Percentage of the sample, one decimal.
    pub probability: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub description: String,
    pub occurrences: usize,
}

impl ConditionProbability {
    fn new(occurrences: usize, total: usize, description: String) -> Self {
        Self {
            probability: percentage(occurrences, total),
            threshold: None,
            unit: None,
            description,
            occurrences,
        }
    }

    fn with_threshold(mut self, threshold: f64, unit: &str) -> Self {
        self.threshold = Some(round_to(threshold, 1));
        self.unit = Some(unit.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Probabilities {
    pub very_hot: ConditionProbability,
    pub very_cold: ConditionProbability,
    pub very_windy: ConditionProbability,
    pub very_humid: ConditionProbability,
    pub rainy: ConditionProbability,
    pub very_uncomfortable: ConditionProbability,
}

fn precipitation_unit(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Daily => "mm",
        Granularity::Hourly => "mm/h",
    }
}

fn is_uncomfortable(
    rule: UncomfortableRule,
    granularity: Granularity,
    thresholds: &Thresholds,
    (temperature, humidity, wind_speed): (f64, f64, f64),
) -> bool {
    match (rule, granularity) {
        (UncomfortableRule::Thresholds, _) => {
            let felt = feels_like(temperature, humidity, wind_speed);
            felt > thresholds.hot || felt < thresholds.cold || wind_speed > thresholds.windy
        }
        (UncomfortableRule::Absolute, Granularity::Daily) => {
            heat_index(temperature, humidity) > 27.0 || temperature < 5.0 || wind_speed > 10.0
        }
        (UncomfortableRule::Absolute, Granularity::Hourly) => {
            let felt = feels_like(temperature, humidity, wind_speed);
            felt > 28.0 || felt < 3.0 || wind_speed > 8.0
        }
    }
}

fn count_where(values: &[f64], pred: impl Fn(f64) -> bool) -> usize {
    values.iter().filter(|v| pred(**v)).count()
}

pub fn extreme_probabilities(
    sample: &HistoricalSample,
    thresholds: &Thresholds,
    rule: UncomfortableRule,
) -> Probabilities {
    let total = sample.len();
    let readings = sample.readings();
    let temps = sample.temperatures();

    let very_hot = count_where(&temps, |t| t > thresholds.hot);
    let very_cold = count_where(&temps, |t| t < thresholds.cold);
    let very_windy = count_where(&sample.wind_speeds(), |w| w > thresholds.windy);
    let very_humid = count_where(&sample.humidities(), |h| h > thresholds.humid);
    let rainy = count_where(&sample.precipitations(), |p| p > thresholds.rain);
    let uncomfortable = readings
        .iter()
        .filter(|r| {
            is_uncomfortable(
                rule,
                sample.granularity(),
                thresholds,
                (r.temperature, r.humidity, r.wind_speed),
            )
        })
        .count();

    let rain_unit = precipitation_unit(sample.granularity());
    let per = match sample.granularity() {
        Granularity::Daily => "day",
        Granularity::Hourly => "hour",
    };

    Probabilities {
        very_hot: ConditionProbability::new(
            very_hot,
            total,
            format!("Temperature above {:.1}°C", thresholds.hot),
        )
        .with_threshold(thresholds.hot, "°C"),
        very_cold: ConditionProbability::new(
            very_cold,
            total,
            format!("Temperature below {:.1}°C", thresholds.cold),
        )
        .with_threshold(thresholds.cold, "°C"),
        very_windy: ConditionProbability::new(
            very_windy,
            total,
            format!("Wind above {:.1} m/s", thresholds.windy),
        )
        .with_threshold(thresholds.windy, "m/s"),
        very_humid: ConditionProbability::new(
            very_humid,
            total,
            format!("Humidity above {:.1}%", thresholds.humid),
        )
        .with_threshold(thresholds.humid, "%"),
        rainy: ConditionProbability::new(
            rainy,
            total,
            format!("Precipitation above {:.1} mm per {per}", thresholds.rain),
        )
        .with_threshold(thresholds.rain, rain_unit),
        very_uncomfortable: ConditionProbability::new(
            uncomfortable,
            total,
            "Generally uncomfortable conditions (extreme felt temperature or strong wind)"
                .to_string(),
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSummary {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p25: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p75: Option<f64>,
    pub unit: String,
}

impl VariableSummary {
    fn of(values: &[f64], unit: &str) -> Self {
        Self {
            average: round_to(stats::mean(values).unwrap_or_default(), 1),
            min: round_to(stats::min(values).unwrap_or_default(), 1),
            max: round_to(stats::max(values).unwrap_or_default(), 1),
            p25: None,
            p75: None,
            unit: unit.to_string(),
        }
    }

    fn with_quartiles(mut self, values: &[f64]) -> Self {
        self.p25 = stats::percentile(values, 25.0).map(|v| round_to(v, 1));
        self.p75 = stats::percentile(values, 75.0).map(|v| round_to(v, 1));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecipitationSummary {
    pub average: f64,
    pub max: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedValues {
    pub temperature: VariableSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<VariableSummary>,
    pub humidity: VariableSummary,
    pub wind_speed: VariableSummary,
    pub precipitation: PrecipitationSummary,
}

pub fn expected_values(sample: &HistoricalSample) -> ExpectedValues {
    let temps = sample.temperatures();
    let precipitation = sample.precipitations();

    let feels_like = match sample.granularity() {
        Granularity::Daily => None,
        Granularity::Hourly => Some(VariableSummary::of(&sample.feels_like(), "°C")),
    };

    ExpectedValues {
        temperature: VariableSummary::of(&temps, "°C").with_quartiles(&temps),
        feels_like,
        humidity: VariableSummary::of(&sample.humidities(), "%"),
        wind_speed: VariableSummary::of(&sample.wind_speeds(), "m/s"),
        precipitation: PrecipitationSummary {
            average: round_to(stats::mean(&precipitation).unwrap_or_default(), 2),
            max: round_to(stats::max(&precipitation).unwrap_or_default(), 2),
            unit: precipitation_unit(sample.granularity()).to_string(),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleAnalysis {
    pub policy: ThresholdPolicy,
    pub thresholds: Thresholds,
    pub probabilities: Probabilities,
    pub expected_values: ExpectedValues,
}

/// Derive thresholds under `policy`, then the probabilities and expected values.
pub fn analyze(
    sample: &HistoricalSample,
    policy: ThresholdPolicy,
    rule: UncomfortableRule,
    rain_threshold: f64,
) -> SampleAnalysis {
    let thresholds = Thresholds::derive(sample, policy, rain_threshold);

    SampleAnalysis {
        policy,
        probabilities: extreme_probabilities(sample, &thresholds, rule),
        expected_values: expected_values(sample),
        thresholds,
    }
}
