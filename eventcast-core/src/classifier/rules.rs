//! Deterministic condition rules.
//!
//! A verdict is the first matching entry of [`RULES`]: wet, then windy, then the
//! temperature bands from hottest to coldest. The last band matches everything, so
//! every input (NaN included) gets exactly one condition.

use async_trait::async_trait;
use tracing::debug;

use super::{ClassifierInput, ConditionClassifier};
use crate::{
    error::ForecastError,
    model::{AggregatedHistoricalSummary, Condition, ConditionVerdict, PointWeather},
};

/// Cut-offs for one input shape. Temperatures in °C, wind in km/h, rain in %.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Rain indicator at or above this is "very wet".
    pub wet_percent: f64,
    /// Wind strictly above this is "very windy".
    pub windy_kmh: f64,
    /// Strictly above: "very hot".
    pub very_hot_above: f64,
    /// Lower bounds (inclusive) of the hot, standard and cold bands.
    pub hot_from: f64,
    pub standard_from: f64,
    pub cold_from: f64,
}

pub const DAILY_THRESHOLDS: Thresholds = Thresholds {
    wet_percent: 40.0,
    windy_kmh: 50.0,
    very_hot_above: 30.0,
    hot_from: 20.0,
    standard_from: 10.0,
    cold_from: 0.0,
};

pub const HISTORICAL_THRESHOLDS: Thresholds = Thresholds {
    wet_percent: 40.0,
    windy_kmh: 40.0,
    very_hot_above: 25.0,
    hot_from: 18.0,
    standard_from: 8.0,
    cold_from: 0.0,
};

/// The three numbers the rules look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Indicators {
    pub rain_percent: f64,
    pub wind_kmh: f64,
    pub temperature: f64,
}

impl Indicators {
    pub fn from_point(point: &PointWeather) -> Self {
        Self {
            rain_percent: f64::from(point.precipitation_probability),
            wind_kmh: point.wind_speed,
            temperature: point.temperature,
        }
    }

    pub fn from_summary(summary: &AggregatedHistoricalSummary) -> Self {
        Self {
            rain_percent: summary.rainy_percent(),
            wind_kmh: summary.avg_wind_speed,
            temperature: summary.avg_temperature,
        }
    }
}

pub type Rule = (fn(&Indicators, &Thresholds) -> bool, Condition);

/// Priority order; first match wins.
pub static RULES: [Rule; 7] = [
    (is_wet, Condition::VeryWet),
    (is_windy, Condition::VeryWindy),
    (is_very_hot, Condition::VeryHot),
    (is_hot, Condition::Hot),
    (is_standard, Condition::Standard),
    (is_cold, Condition::Cold),
    (always, Condition::VeryCold),
];

fn is_wet(i: &Indicators, t: &Thresholds) -> bool {
    i.rain_percent >= t.wet_percent
}

fn is_windy(i: &Indicators, t: &Thresholds) -> bool {
    i.wind_kmh > t.windy_kmh
}

fn is_very_hot(i: &Indicators, t: &Thresholds) -> bool {
    i.temperature > t.very_hot_above
}

fn is_hot(i: &Indicators, t: &Thresholds) -> bool {
    i.temperature >= t.hot_from
}

fn is_standard(i: &Indicators, t: &Thresholds) -> bool {
    i.temperature >= t.standard_from
}

fn is_cold(i: &Indicators, t: &Thresholds) -> bool {
    i.temperature >= t.cold_from
}

fn always(_: &Indicators, _: &Thresholds) -> bool {
    true
}

pub fn evaluate(indicators: &Indicators, thresholds: &Thresholds) -> Condition {
    RULES
        .iter()
        .find(|(matches, _)| matches(indicators, thresholds))
        .map(|(_, condition)| *condition)
        .unwrap_or(Condition::VeryCold)
}

/// Verdict for a single forecast hour. The rain probability is passed through.
pub fn classify_point(point: &PointWeather) -> ConditionVerdict {
    ConditionVerdict {
        condition: evaluate(&Indicators::from_point(point), &DAILY_THRESHOLDS),
        rain_probability: point.precipitation_probability.min(100),
    }
}

/// Verdict for a climatology summary. The rain probability is the rounded rainy-year share.
pub fn classify_summary(summary: &AggregatedHistoricalSummary) -> ConditionVerdict {
    let indicators = Indicators::from_summary(summary);
    ConditionVerdict {
        condition: evaluate(&indicators, &HISTORICAL_THRESHOLDS),
        rain_probability: indicators.rain_percent.round().clamp(0.0, 100.0) as u8,
    }
}

/// Local evaluator; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleClassifier;

#[async_trait]
impl ConditionClassifier for RuleClassifier {
    async fn classify(
        &self,
        input: &ClassifierInput<'_>,
    ) -> Result<ConditionVerdict, ForecastError> {
        let verdict = match input {
            ClassifierInput::Point(point) => classify_point(point),
            ClassifierInput::Historical(summary) => classify_summary(summary),
        };
        debug!(
            condition = %verdict.condition,
            rain = verdict.rain_probability,
            "Classified locally"
        );
        Ok(verdict)
    }
}
