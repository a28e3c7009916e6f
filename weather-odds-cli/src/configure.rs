use anyhow::Context;
use inquire::{CustomType, Select, validator::Validation};
use weather_odds_core::{Config, ThresholdPolicy};

fn at_least_one(value: &u32) -> Result<Validation, inquire::error::CustomUserError> {
    Ok(if *value >= 1 {
        Validation::Valid
    } else {
        Validation::Invalid("Must be at least 1".into())
    })
}

fn ask_years_back(message: &str, current: u32) -> anyhow::Result<u32> {
    CustomType::<u32>::new(message)
        .with_default(current)
        .with_validator(at_least_one)
        .with_error_message("Please type a whole number of years")
        .prompt()
        .context("Failed to read look-back years")
}

/// Prompt for the analysis defaults and save them to the config file.
pub fn run() -> anyhow::Result<()> {
    let mut config = Config::load()?;
    let analysis = &mut config.analysis;

    let policies = ThresholdPolicy::all().to_vec();
    let cursor = policies
        .iter()
        .position(|p| *p == analysis.threshold_policy)
        .unwrap_or_default();
    analysis.threshold_policy = Select::new("Threshold policy:", policies)
        .with_starting_cursor(cursor)
        .with_help_message("percentile: 95th/5th and 90th percentiles; mean-std: mean ± one std")
        .prompt()
        .context("Failed to read threshold policy")?;

    analysis.daily_years_back = ask_years_back("Years to look back (daily):", analysis.daily_years_back)?;
    analysis.hourly_years_back =
        ask_years_back("Years to look back (hourly):", analysis.hourly_years_back)?;

    analysis.hourly_request_delay_ms = CustomType::<u64>::new("Pause between hourly requests (ms):")
        .with_default(analysis.hourly_request_delay_ms)
        .with_error_message("Please type a whole number of milliseconds")
        .prompt()
        .context("Failed to read request delay")?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
