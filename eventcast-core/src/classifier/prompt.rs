//! Prompts for the remote summarizer.
//!
//! The rule text is rendered from the same [`Thresholds`] the local evaluator uses, so
//! both strategies describe one rule table.

use std::fmt;

use super::rules::{DAILY_THRESHOLDS, HISTORICAL_THRESHOLDS, Thresholds};
use crate::{
    catalog,
    model::{AggregatedHistoricalSummary, Condition, PointWeather},
};

pub fn daily_prompt(point: &PointWeather) -> String {
    DailyPrompt(point).to_string()
}

pub fn historical_prompt(summary: &AggregatedHistoricalSummary) -> String {
    HistoricalPrompt(summary).to_string()
}

struct DailyPrompt<'a>(&'a PointWeather);

impl fmt::Display for DailyPrompt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let point = self.0;

        writeln!(f, "You are a weather analyst for an outdoor event forecasting service.")?;
        writeln!(f, "Based on the following weather data for an event at a specific time:")?;
        writeln!(f, "- Precipitation Probability: {}%", point.precipitation_probability)?;
        writeln!(f, "- Temperature: {}°C", point.temperature)?;
        writeln!(f, "- Weather Description: \"{}\"", catalog::describe(point.weather_code))?;
        writeln!(f, "- Wind Speed: {} km/h", point.wind_speed)?;
        writeln!(f)?;
        writeln!(f, "Please analyze this data and provide a JSON response.")?;
        writeln!(
            f,
            "- The 'rainProbability' must be exactly the 'Precipitation Probability' from the \
             input data."
        )?;
        write_condition_domain(f)?;
        writeln!(f)?;
        write_rules(
            f,
            &DAILY_THRESHOLDS,
            "If 'Precipitation Probability' is {wet}% or higher",
            "'Wind Speed'",
            "'Temperature'",
        )
    }
}

struct HistoricalPrompt<'a>(&'a AggregatedHistoricalSummary);

impl fmt::Display for HistoricalPrompt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        let total = summary.total_valid_years;
        let rainy = summary.rainy_years;

        writeln!(f, "You are a climatologist for an outdoor event forecasting service.")?;
        writeln!(
            f,
            "You are providing a long-range climatological forecast based on historical data \
             for this date over the past {total} years."
        )?;
        writeln!(f)?;
        writeln!(f, "Historical Data Summary:")?;
        writeln!(f, "- It has rained on this day in {rainy} out of the last {total} years.")?;
        writeln!(f, "- Average Temperature: {:.1}°C", summary.avg_temperature)?;
        writeln!(f, "- Average Wind Speed: {:.1} km/h", summary.avg_wind_speed)?;
        writeln!(f, "- Most Common Condition: \"{}\"", summary.dominant_condition)?;
        writeln!(f)?;
        writeln!(f, "Please analyze this historical data and provide a JSON response.")?;
        writeln!(
            f,
            "- The 'rainProbability' should be the percentage of years it has rained, \
             calculated as ({rainy} / {total}) * 100, rounded to the nearest integer."
        )?;
        write_condition_domain(f)?;
        writeln!(f)?;
        write_rules(
            f,
            &HISTORICAL_THRESHOLDS,
            "If it has rained in {wet}% or more of the past years",
            "'Average Wind Speed'",
            "'Average Temperature'",
        )
    }
}

fn write_condition_domain(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let domain = Condition::all()
        .iter()
        .map(|c| format!("'{c}'"))
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(
        f,
        "- The 'condition' must be ONE of the following strings based on a strict \
         hierarchical analysis: {domain}."
    )
}

fn write_rules(
    f: &mut fmt::Formatter<'_>,
    t: &Thresholds,
    wet_clause: &str,
    wind_name: &str,
    temperature_name: &str,
) -> fmt::Result {
    let wet_clause = wet_clause.replace("{wet}", &degrees(t.wet_percent));

    writeln!(f, "Follow these rules in order:")?;
    writeln!(f, "1. {wet_clause}, the condition is 'very wet'.")?;
    writeln!(
        f,
        "2. If the condition is not 'very wet', and {wind_name} is above {} km/h, the \
         condition is 'very windy'.",
        degrees(t.windy_kmh)
    )?;
    writeln!(
        f,
        "3. If neither of the above, determine the condition based on {temperature_name}:"
    )?;
    writeln!(f, "    - Above {}°C: 'very hot'", degrees(t.very_hot_above))?;
    writeln!(f, "    - {}°C to {}°C: 'hot'", degrees(t.hot_from), degrees(t.very_hot_above))?;
    writeln!(
        f,
        "    - {}°C to {}°C: 'standard'",
        degrees(t.standard_from),
        degrees(t.hot_from - 0.1)
    )?;
    writeln!(
        f,
        "    - {}°C to {}°C: 'cold'",
        degrees(t.cold_from),
        degrees(t.standard_from - 0.1)
    )?;
    writeln!(f, "    - Below {}°C: 'very cold'", degrees(t.cold_from))
}

/// Whole numbers without decimals, everything else with one.
fn degrees(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}
