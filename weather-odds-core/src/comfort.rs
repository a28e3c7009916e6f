//! Felt temperature, qualitative levels and comfort scoring.

use serde::Serialize;

use crate::model::Reading;
use crate::stats::{self, round_to};

/// Wind speed above which wind chill applies, m/s.
const WIND_CHILL_MIN_WIND: f64 = 1.34;

/// Exponential term of the heat-index approximation, evaluated at 14 °C.
fn heat_index_vapour_term() -> f64 {
    6.11 * (5417.753_f64 * (1.0 / 273.16 - 1.0 / (273.15 + 14.0)) / 1000.0).exp()
}

/// Heat-index approximation, applied without any temperature/humidity gate.
pub fn heat_index(temperature: f64, humidity: f64) -> f64 {
    temperature + 0.5555 * (heat_index_vapour_term() - 10.0) * (humidity / 100.0)
}

pub fn wind_chill(temperature: f64, wind_speed: f64) -> f64 {
    let wind_kmh_pow = (wind_speed * 3.6).powf(0.16);
    13.12 + 0.6215 * temperature - 11.37 * wind_kmh_pow + 0.3965 * temperature * wind_kmh_pow
}

/// Perceived temperature in °C.
///
/// Wind chill is checked first, then heat index; otherwise the actual
/// temperature is returned unchanged.
pub fn feels_like(temperature: f64, humidity: f64, wind_speed: f64) -> f64 {
    if temperature <= 10.0 && wind_speed > WIND_CHILL_MIN_WIND {
        wind_chill(temperature, wind_speed)
    } else if temperature >= 20.0 && humidity > 40.0 {
        heat_index(temperature, humidity)
    } else {
        temperature
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureLevel {
    VeryCold,
    Cold,
    Mild,
    Warm,
    VeryHot,
}

impl TemperatureLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryCold => "very cold",
            Self::Cold => "cold",
            Self::Mild => "mild",
            Self::Warm => "warm",
            Self::VeryHot => "very hot",
        }
    }

    pub fn classify(temperature: f64) -> Self {
        match temperature {
            t if t < 0.0 => Self::VeryCold,
            t if t < 10.0 => Self::Cold,
            t if t < 20.0 => Self::Mild,
            t if t < 30.0 => Self::Warm,
            _ => Self::VeryHot,
        }
    }

    pub fn is_cold(&self) -> bool {
        matches!(self, Self::VeryCold | Self::Cold)
    }

    pub fn is_hot(&self) -> bool {
        matches!(self, Self::Warm | Self::VeryHot)
    }
}

impl std::fmt::Display for TemperatureLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HumidityLevel {
    Dry,
    Comfortable,
    Humid,
    VeryHumid,
}

impl HumidityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dry => "dry",
            Self::Comfortable => "comfortable",
            Self::Humid => "humid",
            Self::VeryHumid => "very humid",
        }
    }

    pub fn classify(humidity: f64) -> Self {
        match humidity {
            h if h < 30.0 => Self::Dry,
            h if h < 60.0 => Self::Comfortable,
            h if h < 80.0 => Self::Humid,
            _ => Self::VeryHumid,
        }
    }
}

impl std::fmt::Display for HumidityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindLevel {
    Calm,
    LightBreeze,
    ModerateBreeze,
    StrongWind,
    VeryWindy,
}

impl WindLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::LightBreeze => "light breeze",
            Self::ModerateBreeze => "moderate breeze",
            Self::StrongWind => "strong wind",
            Self::VeryWindy => "very windy",
        }
    }

    pub fn classify(wind_speed: f64) -> Self {
        match wind_speed {
            w if w < 2.0 => Self::Calm,
            w if w < 5.0 => Self::LightBreeze,
            w if w < 8.0 => Self::ModerateBreeze,
            w if w < 12.0 => Self::StrongWind,
            _ => Self::VeryWindy,
        }
    }

    pub fn is_windy(&self) -> bool {
        matches!(self, Self::StrongWind | Self::VeryWindy)
    }
}

impl std::fmt::Display for WindLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecipitationLevel {
    None,
    Drizzle,
    ModerateRain,
    HeavyRain,
}

impl PrecipitationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Drizzle => "drizzle",
            Self::ModerateRain => "moderate rain",
            Self::HeavyRain => "heavy rain",
        }
    }

    pub fn classify(precipitation: f64) -> Self {
        match precipitation {
            p if p < 0.1 => Self::None,
            p if p < 1.0 => Self::Drizzle,
            p if p < 4.0 => Self::ModerateRain,
            _ => Self::HeavyRain,
        }
    }
}

impl std::fmt::Display for PrecipitationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodOfDay {
    Dawn,
    Morning,
    Afternoon,
    Night,
}

impl PeriodOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => Self::Dawn,
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            _ => Self::Night,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Dawn => "Early morning",
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Night => "Night",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityLevel {
    Excellent,
    VeryGood,
    Good,
    Reduced,
}

impl VisibilityLevel {
    pub fn estimate(humidity: f64, precipitation: f64) -> Self {
        if humidity > 90.0 || precipitation > 2.0 {
            Self::Reduced
        } else if humidity > 80.0 || precipitation > 0.5 {
            Self::Good
        } else if humidity > 60.0 {
            Self::VeryGood
        } else {
            Self::Excellent
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent visibility",
            Self::VeryGood => "Very good visibility",
            Self::Good => "Good visibility, possible haze",
            Self::Reduced => "Visibility reduced by humidity or precipitation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComfortRating {
    Ideal,
    Good,
    Acceptable,
    Challenging,
    Adverse,
}

impl ComfortRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ideal => "ideal",
            Self::Good => "good",
            Self::Acceptable => "acceptable",
            Self::Challenging => "challenging",
            Self::Adverse => "adverse",
        }
    }

    pub fn from_score(score: u32) -> Self {
        match score {
            0 => Self::Ideal,
            1..=2 => Self::Good,
            3..=4 => Self::Acceptable,
            5..=6 => Self::Challenging,
            _ => Self::Adverse,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Ideal => "green",
            Self::Good => "light-green",
            Self::Acceptable => "yellow",
            Self::Challenging => "orange",
            Self::Adverse => "red",
        }
    }
}

impl std::fmt::Display for ComfortRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Additive discomfort score over the four qualitative levels.
pub fn comfort_score(
    temperature: TemperatureLevel,
    humidity: HumidityLevel,
    wind: WindLevel,
    precipitation: PrecipitationLevel,
) -> u32 {
    let mut score = 0;

    score += match temperature {
        TemperatureLevel::VeryCold | TemperatureLevel::VeryHot => 3,
        TemperatureLevel::Cold | TemperatureLevel::Warm => 1,
        TemperatureLevel::Mild => 0,
    };
    if humidity == HumidityLevel::VeryHumid {
        score += 2;
    }
    score += match wind {
        WindLevel::VeryWindy => 3,
        WindLevel::StrongWind => 2,
        _ => 0,
    };
    if matches!(
        precipitation,
        PrecipitationLevel::HeavyRain | PrecipitationLevel::ModerateRain
    ) {
        score += 3;
    }

    score
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscomfortRating {
    Comfortable,
    Moderate,
    Uncomfortable,
    VeryUncomfortable,
}

impl DiscomfortRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comfortable => "comfortable",
            Self::Moderate => "moderate",
            Self::Uncomfortable => "uncomfortable",
            Self::VeryUncomfortable => "very uncomfortable",
        }
    }

    pub fn from_average(score: f64) -> Self {
        if score < 2.0 {
            Self::Comfortable
        } else if score < 4.0 {
            Self::Moderate
        } else if score < 6.0 {
            Self::Uncomfortable
        } else {
            Self::VeryUncomfortable
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Comfortable => "Generally comfortable conditions for outdoor activities",
            Self::Moderate => "Moderate conditions, minor precautions may be needed",
            Self::Uncomfortable => "Uncomfortable conditions, careful planning is recommended",
            Self::VeryUncomfortable => {
                "Very uncomfortable conditions, consider rescheduling activities"
            }
        }
    }
}

impl std::fmt::Display for DiscomfortRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discomfort score of a single day.
pub fn daily_discomfort_score(temperature: f64, humidity: f64, wind_speed: f64) -> u32 {
    let mut score = 0;

    if temperature > 35.0 || temperature < 0.0 {
        score += 3;
    } else if temperature > 30.0 || temperature < 5.0 {
        score += 2;
    }

    if humidity > 85.0 {
        score += 2;
    } else if humidity > 75.0 {
        score += 1;
    }

    if wind_speed > 15.0 {
        score += 3;
    } else if wind_speed > 10.0 {
        score += 2;
    } else if wind_speed > 7.0 {
        score += 1;
    }

    let heat_index = heat_index(temperature, humidity);
    if heat_index > 32.0 {
        score += 2;
    } else if heat_index > 27.0 {
        score += 1;
    }

    score
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscomfortAnalysis {
    pub rating: DiscomfortRating,
    pub average_score: f64,
    pub comfortable_days_percentage: f64,
    pub uncomfortable_days_percentage: f64,
    pub description: String,
}

/// Score every day of a sample and summarise. `None` for an empty sample.
pub fn analyze_discomfort(readings: &[Reading]) -> Option<DiscomfortAnalysis> {
    let scores: Vec<u32> = readings
        .iter()
        .map(|r| daily_discomfort_score(r.temperature, r.humidity, r.wind_speed))
        .collect();

    let as_f64: Vec<f64> = scores.iter().map(|s| f64::from(*s)).collect();
    let average = stats::mean(&as_f64)?;
    let comfortable = scores.iter().filter(|s| **s <= 2).count();
    let rating = DiscomfortRating::from_average(average);

    Some(DiscomfortAnalysis {
        rating,
        average_score: round_to(average, 2),
        comfortable_days_percentage: stats::percentage(comfortable, scores.len()),
        uncomfortable_days_percentage: stats::percentage(scores.len() - comfortable, scores.len()),
        description: rating.description().to_string(),
    })
}
