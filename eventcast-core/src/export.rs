//! JSON and CSV snapshots of a finished forecast.

use serde::{Deserialize, Serialize};

use crate::{
    catalog,
    model::{EventQuery, ForecastResult},
};

/// A query together with its result, as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub query: EventQuery,
    pub result: ForecastResult,
}

impl Snapshot {
    pub fn new(query: EventQuery, result: ForecastResult) -> Self {
        Self { query, result }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// One row for a historical result, one row per outlook hour for a daily one.
    ///
    /// Floats use their shortest exact representation, and every [`ForecastResult`]
    /// field has a column.
    pub fn to_csv(&self) -> String {
        let q = &self.query;
        let verdict = self.result.verdict();
        let mut out = String::new();

        match &self.result {
            ForecastResult::Historical { summary, .. } => {
                out.push_str(
                    "location,date,forecast_type,forecast_condition,\
                     forecast_rain_probability_percent,historical_avg_temp_c,\
                     historical_avg_wind_kmh,historical_rainy_years,historical_total_years,\
                     historical_common_conditions,historical_common_code\n",
                );
                let row = [
                    quote(&q.location),
                    q.date.to_string(),
                    self.result.kind().to_string(),
                    verdict.condition.to_string(),
                    verdict.rain_probability.to_string(),
                    summary.avg_temperature.to_string(),
                    summary.avg_wind_speed.to_string(),
                    summary.rainy_years.to_string(),
                    summary.total_valid_years.to_string(),
                    quote(&summary.dominant_condition),
                    summary.dominant_weather_code.to_string(),
                ];
                out.push_str(&row.join(","));
                out.push('\n');
            }
            ForecastResult::Daily { point_weather, hourly_window, .. } => {
                out.push_str(
                    "location,date,time,forecast_condition,forecast_rain_probability_percent,\
                     event_time_temp_c,event_time_precip_prob_percent,event_time_wind_kmh,\
                     event_time_weather_desc,hourly_time,hourly_precip_prob_percent,\
                     event_time,event_time_weather_code\n",
                );
                let event = [
                    quote(&q.location),
                    q.date.to_string(),
                    q.time.format("%H:%M").to_string(),
                    verdict.condition.to_string(),
                    verdict.rain_probability.to_string(),
                    point_weather.temperature.to_string(),
                    point_weather.precipitation_probability.to_string(),
                    point_weather.wind_speed.to_string(),
                    quote(catalog::describe(point_weather.weather_code)),
                ]
                .join(",");
                let point = format!(
                    "{},{}",
                    point_weather.time.format("%Y-%m-%dT%H:%M:%S"),
                    point_weather.weather_code
                );

                if hourly_window.is_empty() {
                    out.push_str(&format!("{event},,,{point}\n"));
                }
                for hour in hourly_window {
                    out.push_str(&format!(
                        "{event},{},{},{point}\n",
                        quote(&hour.time),
                        hour.precipitation_probability
                    ));
                }
            }
        }

        out
    }

    /// `forecast_<location>_<date>`, with everything but ASCII letters and digits as `_`.
    pub fn file_stem(&self) -> String {
        let location: String = self
            .query
            .location
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("forecast_{}_{}", location, self.query.date)
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
