use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::ForecastError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// What the user asked about: where, which day, and at what local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventQuery {
    pub location: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl EventQuery {
    pub fn new(location: impl Into<String>, date: NaiveDate, time: NaiveTime) -> Self {
        Self { location: location.into(), date, time }
    }

    /// Reject empty locations and events in the past relative to `today`.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ForecastError> {
        if self.location.trim().is_empty() {
            return Err(ForecastError::InvalidQuery("location must not be empty".into()));
        }
        if self.date < today {
            return Err(ForecastError::InvalidQuery(format!(
                "{} is in the past; pick today or a later date",
                self.date
            )));
        }
        Ok(())
    }
}

/// One date of hourly forecast values, stored as index-aligned columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HourlyForecastSeries {
    time: Vec<NaiveDateTime>,
    temperature: Vec<f64>,
    precipitation_probability: Vec<u8>,
    weather_code: Vec<i32>,
    wind_speed: Vec<f64>,
}

impl HourlyForecastSeries {
    /// Build a series; all columns must have the same length.
    pub fn new(
        time: Vec<NaiveDateTime>,
        temperature: Vec<f64>,
        precipitation_probability: Vec<u8>,
        weather_code: Vec<i32>,
        wind_speed: Vec<f64>,
    ) -> Result<Self, ForecastError> {
        let len = time.len();
        let aligned = temperature.len() == len
            && precipitation_probability.len() == len
            && weather_code.len() == len
            && wind_speed.len() == len;

        if !aligned {
            return Err(ForecastError::NetworkFailure(format!(
                "malformed hourly forecast: {} times, {} temperatures, {} precipitation \
                 probabilities, {} weather codes, {} wind speeds",
                len,
                temperature.len(),
                precipitation_probability.len(),
                weather_code.len(),
                wind_speed.len(),
            )));
        }

        Ok(Self { time, temperature, precipitation_probability, weather_code, wind_speed })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn times(&self) -> &[NaiveDateTime] {
        &self.time
    }

    pub fn precipitation_probabilities(&self) -> &[u8] {
        &self.precipitation_probability
    }

    /// The full row at `idx`, if in range.
    pub fn point(&self, idx: usize) -> Option<PointWeather> {
        Some(PointWeather {
            time: *self.time.get(idx)?,
            temperature: *self.temperature.get(idx)?,
            precipitation_probability: *self.precipitation_probability.get(idx)?,
            weather_code: *self.weather_code.get(idx)?,
            wind_speed: *self.wind_speed.get(idx)?,
        })
    }
}

/// A single hour taken out of [`HourlyForecastSeries`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointWeather {
    pub time: NaiveDateTime,
    /// °C
    pub temperature: f64,
    /// %
    pub precipitation_probability: u8,
    pub weather_code: i32,
    /// km/h
    pub wind_speed: f64,
}

/// Daily archive values for one past year on the event's calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalYearSample {
    pub weather_code: i32,
    pub mean_temperature: f64,
    /// mm
    pub precipitation_sum: f64,
    pub mean_wind_speed: f64,
}

/// Climatology for the event's calendar day over the valid past years.
///
/// Only produced by the historical aggregator, which guarantees
/// `0 < total_valid_years` and `rainy_years <= total_valid_years`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedHistoricalSummary {
    pub rainy_years: u32,
    pub total_valid_years: u32,
    pub avg_temperature: f64,
    pub avg_wind_speed: f64,
    pub dominant_condition: String,
    pub dominant_weather_code: i32,
}

impl AggregatedHistoricalSummary {
    /// Share of valid years with rain, in percent.
    pub fn rainy_percent(&self) -> f64 {
        if self.total_valid_years == 0 {
            return 0.0;
        }
        f64::from(self.rainy_years) / f64::from(self.total_valid_years) * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "very wet")]
    VeryWet,
    #[serde(rename = "very windy")]
    VeryWindy,
    #[serde(rename = "very hot")]
    VeryHot,
    #[serde(rename = "hot")]
    Hot,
    #[serde(rename = "standard")]
    Standard,
    #[serde(rename = "cold")]
    Cold,
    #[serde(rename = "very cold")]
    VeryCold,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::VeryWet => "very wet",
            Condition::VeryWindy => "very windy",
            Condition::VeryHot => "very hot",
            Condition::Hot => "hot",
            Condition::Standard => "standard",
            Condition::Cold => "cold",
            Condition::VeryCold => "very cold",
        }
    }

    pub const fn all() -> &'static [Condition] {
        &[
            Condition::VeryWet,
            Condition::VeryWindy,
            Condition::VeryHot,
            Condition::Hot,
            Condition::Standard,
            Condition::Cold,
            Condition::VeryCold,
        ]
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = ForecastError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lower = value.trim().to_lowercase();

        Condition::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| {
                ForecastError::ServiceContractViolation(format!(
                    "condition '{value}' is not one of: very wet, very windy, very hot, hot, \
                     standard, cold, very cold"
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionVerdict {
    pub condition: Condition,
    /// 0..=100
    pub rain_probability: u8,
}

/// One bar of the hourly outlook around the event time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyPoint {
    /// Localized hour label, e.g. "2 PM".
    pub time: String,
    pub precipitation_probability: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForecastResult {
    Daily {
        verdict: ConditionVerdict,
        point_weather: PointWeather,
        hourly_window: Vec<HourlyPoint>,
    },
    Historical {
        verdict: ConditionVerdict,
        summary: AggregatedHistoricalSummary,
    },
}

impl ForecastResult {
    pub fn verdict(&self) -> &ConditionVerdict {
        match self {
            ForecastResult::Daily { verdict, .. } | ForecastResult::Historical { verdict, .. } => {
                verdict
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ForecastResult::Daily { .. } => "daily",
            ForecastResult::Historical { .. } => "historical",
        }
    }
}
