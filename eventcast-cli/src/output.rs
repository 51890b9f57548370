//! Human-readable rendering of a forecast.

use std::fmt;

use eventcast_core::{ForecastResult, Snapshot, catalog, historical::YEARS_TO_FETCH};

pub fn render(snapshot: &Snapshot) -> String {
    Report(snapshot).to_string()
}

struct Report<'a>(&'a Snapshot);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let q = &self.0.query;
        let verdict = self.0.result.verdict();

        writeln!(f, "{} on {} at {}", q.location, q.date, q.time.format("%H:%M"))?;
        writeln!(f, "Condition:      {}", verdict.condition)?;
        writeln!(f, "Chance of rain: {}%", verdict.rain_probability)?;
        writeln!(f)?;

        match &self.0.result {
            ForecastResult::Daily { point_weather: p, hourly_window, .. } => {
                writeln!(f, "Forecast for {}:", p.time.format("%-I %p"))?;
                writeln!(f, "  {}", catalog::describe(p.weather_code))?;
                writeln!(f, "  Temperature {:.1}°C, wind {:.1} km/h", p.temperature, p.wind_speed)?;

                if !hourly_window.is_empty() {
                    writeln!(f)?;
                    writeln!(f, "Hourly precipitation:")?;
                    for hour in hourly_window {
                        writeln!(f, "  {:>5}  {:>3}%", hour.time, hour.precipitation_probability)?;
                    }
                }
            }
            ForecastResult::Historical { summary: s, .. } => {
                writeln!(
                    f,
                    "Too far ahead for a forecast; based on {} of the last {YEARS_TO_FETCH} years:",
                    s.total_valid_years
                )?;
                writeln!(
                    f,
                    "  Rain on this day in {} of {} years",
                    s.rainy_years, s.total_valid_years
                )?;
                writeln!(
                    f,
                    "  Average temperature {:.1}°C, wind {:.1} km/h",
                    s.avg_temperature, s.avg_wind_speed
                )?;
                writeln!(f, "  Most common: {}", s.dominant_condition)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use eventcast_core::{
        AggregatedHistoricalSummary, Condition, ConditionVerdict, EventQuery, HourlyPoint,
        PointWeather,
    };

    fn query() -> EventQuery {
        EventQuery::new(
            "Lisbon",
            NaiveDate::from_ymd_opt(2026, 10, 20).expect("valid date"),
            NaiveTime::from_hms_opt(9, 15, 0).expect("valid time"),
        )
    }

    #[test]
    fn daily_shows_point_and_window() {
        let q = query();
        let snapshot = Snapshot::new(
            q.clone(),
            ForecastResult::Daily {
                verdict: ConditionVerdict { condition: Condition::Standard, rain_probability: 25 },
                point_weather: PointWeather {
                    time: q.date.and_hms_opt(9, 0, 0).expect("valid datetime"),
                    temperature: 17.0,
                    precipitation_probability: 25,
                    weather_code: 2,
                    wind_speed: 14.5,
                },
                hourly_window: vec![
                    HourlyPoint { time: "8 AM".into(), precipitation_probability: 20 },
                    HourlyPoint { time: "9 AM".into(), precipitation_probability: 25 },
                ],
            },
        );

        let text = render(&snapshot);
        assert!(text.starts_with("Lisbon on 2026-10-20 at 09:15\n"));
        assert!(text.contains("Condition:      standard"));
        assert!(text.contains("Chance of rain: 25%"));
        assert!(text.contains("Forecast for 9 AM:"));
        assert!(text.contains("Partly cloudy"));
        assert!(text.contains(" 9 AM   25%"));
    }

    #[test]
    fn historical_shows_summary() {
        let snapshot = Snapshot::new(
            query(),
            ForecastResult::Historical {
                verdict: ConditionVerdict { condition: Condition::Cold, rain_probability: 35 },
                summary: AggregatedHistoricalSummary {
                    rainy_years: 7,
                    total_valid_years: 20,
                    avg_temperature: 9.04,
                    avg_wind_speed: 21.0,
                    dominant_condition: "Overcast".into(),
                    dominant_weather_code: 3,
                },
            },
        );

        let text = render(&snapshot);
        assert!(text.contains("based on 20 of the last 20 years"));
        assert!(text.contains("Rain on this day in 7 of 20 years"));
        assert!(text.contains("Average temperature 9.0°C, wind 21.0 km/h"));
        assert!(text.contains("Most common: Overcast"));
        assert!(!text.contains("Hourly"));
    }
}
