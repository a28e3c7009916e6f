//! Plain-text rendering of engine reports.

use std::fmt::Write;

use weather_odds_core::{
    DailyReport, HourlyReport, PointWeather,
    analysis::{ConditionProbability, ExpectedValues, Probabilities, VariableSummary},
    engine::SampleSummary,
};

fn probability_line(name: &str, p: &ConditionProbability) -> String {
    format!("  {name:<20}{:>6.1}%  {}\n", p.probability, p.description)
}

fn summary_line(name: &str, v: &VariableSummary) -> String {
    let mut line = format!(
        "  {name:<14}{:>6.1} {} (min {:.1}, max {:.1}",
        v.average, v.unit, v.min, v.max
    );
    if let (Some(p25), Some(p75)) = (v.p25, v.p75) {
        let _ = write!(line, ", p25 {p25:.1}, p75 {p75:.1}");
    }
    line.push_str(")\n");
    line
}

fn sample_line(sample: &SampleSummary) -> String {
    format!(
        "Sample: {} observations from {} ({} years with data)\n",
        sample.observations, sample.year_range, sample.years_with_data
    )
}

fn probabilities(out: &mut String, p: &Probabilities) {
    out.push_str("\nProbabilities\n");
    out.push_str(&probability_line("very hot", &p.very_hot));
    out.push_str(&probability_line("very cold", &p.very_cold));
    out.push_str(&probability_line("very windy", &p.very_windy));
    out.push_str(&probability_line("very humid", &p.very_humid));
    out.push_str(&probability_line("rainy", &p.rainy));
    out.push_str(&probability_line("very uncomfortable", &p.very_uncomfortable));
}

fn expected_values(out: &mut String, e: &ExpectedValues) {
    out.push_str("\nExpected values\n");
    out.push_str(&summary_line("temperature", &e.temperature));
    if let Some(feels_like) = &e.feels_like {
        out.push_str(&summary_line("feels like", feels_like));
    }
    out.push_str(&summary_line("humidity", &e.humidity));
    out.push_str(&summary_line("wind", &e.wind_speed));
    let _ = writeln!(
        out,
        "  {:<14}{:>6.2} {} (max {:.2})",
        "precipitation", e.precipitation.average, e.precipitation.unit, e.precipitation.max
    );
}

fn bullets(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {title}:");
    for item in items {
        let _ = writeln!(out, "    - {item}");
    }
}

pub fn daily_report(report: &DailyReport) -> String {
    let mut out = format!(
        "Weather odds for {} at lat {}, lon {}\n",
        report.target_date, report.location.latitude, report.location.longitude
    );
    out.push_str(&sample_line(&report.historical_sample));
    let _ = writeln!(out, "Policy: {}", report.analysis.sample.policy);

    probabilities(&mut out, &report.analysis.sample.probabilities);
    expected_values(&mut out, &report.analysis.sample.expected_values);

    let discomfort = &report.analysis.discomfort_analysis;
    let _ = write!(
        out,
        "\nDiscomfort: {} (average score {:.2}, {:.1}% comfortable days)\n  {}\n",
        discomfort.rating,
        discomfort.average_score,
        discomfort.comfortable_days_percentage,
        discomfort.description
    );

    out
}

pub fn hourly_report(report: &HourlyReport) -> String {
    let mut out = format!(
        "Weather odds for {} {} at lat {}, lon {}\n",
        report.target_date,
        report.target_hour,
        report.location.latitude,
        report.location.longitude
    );
    out.push_str(&sample_line(&report.historical_sample));
    let _ = writeln!(out, "Policy: {}", report.analysis.sample.policy);

    probabilities(&mut out, &report.analysis.sample.probabilities);
    expected_values(&mut out, &report.analysis.sample.expected_values);

    let c = &report.analysis.condition_analysis;
    let _ = write!(
        out,
        "\nConditions ({})\n  temperature   {} ({:.1} °C)\n  humidity      {} ({:.1} %)\n  wind          {} ({:.1} m/s)\n  precipitation {} ({:.2} mm/h)\n  visibility    {}\n  overall       {} (score {}, {})\n",
        c.period_description,
        c.temperature.level,
        c.temperature.value,
        c.humidity.level,
        c.humidity.value,
        c.wind.level,
        c.wind.value,
        c.precipitation.level,
        c.precipitation.value,
        c.visibility.description,
        c.overall_condition.rating,
        c.overall_condition.score,
        c.overall_condition.color,
    );

    let rec = &report.analysis.recommendations;
    if !rec.is_empty() {
        out.push_str("\nRecommendations\n");
        bullets(&mut out, "clothing", &rec.clothing);
        bullets(&mut out, "activities", &rec.activities);
        bullets(&mut out, "precautions", &rec.precautions);
    }

    out
}

pub fn point_weather(weather: &PointWeather) -> String {
    let meta = &weather.metadata;
    let mut out = format!(
        "{} {} data: {} records over {} days\n",
        meta.source, meta.granularity, meta.total_records, meta.total_days
    );

    if !weather.statistics.is_empty() {
        out.push_str("\nParameter        min       max       avg\n");
        for (code, stats) in &weather.statistics {
            let _ = writeln!(
                out,
                "{code:<14}{:>8.2}  {:>8.2}  {:>8.2}",
                stats.min, stats.max, stats.avg
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_odds_core::comfort::{DiscomfortRating, WindLevel};

    #[test]
    fn levels_render_as_words() {
        assert_eq!(format!("wind {}", WindLevel::LightBreeze), "wind light breeze");
        assert_eq!(
            format!("Discomfort: {}", DiscomfortRating::VeryUncomfortable),
            "Discomfort: very uncomfortable"
        );
    }

    #[test]
    fn quartiles_only_when_present() {
        let mut v = VariableSummary {
            average: 19.0,
            min: 10.0,
            max: 28.0,
            p25: Some(14.5),
            p75: Some(23.5),
            unit: "°C".to_string(),
        };
        assert!(summary_line("temperature", &v).contains("p25 14.5, p75 23.5"));

        v.p25 = None;
        v.p75 = None;
        assert!(summary_line("temperature", &v).ends_with("max 28.0)\n"));
    }

    #[test]
    fn empty_buckets_are_skipped() {
        let mut out = String::new();
        bullets(&mut out, "clothing", &[]);
        assert!(out.is_empty());

        bullets(&mut out, "clothing", &["Scarf".to_string()]);
        assert_eq!(out, "  clothing:\n    - Scarf\n");
    }
}
