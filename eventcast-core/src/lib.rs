//! Core library for the `eventcast` CLI.
//!
//! This crate defines:
//! - The forecast router (hourly forecast vs. 20-year climatology)
//! - Historical aggregation over Open-Meteo archive data
//! - Condition classification, locally or through Gemini
//! - Configuration handling and JSON/CSV snapshots
//!
//! It is used by `eventcast-cli`, but can also be reused by other binaries or services.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod export;
pub mod historical;
pub mod model;
pub mod provider;
pub mod router;

pub use classifier::{
    ClassifierId, ClassifierInput, ConditionClassifier, classifier_from_config,
    default_classifier_from_config, gemini::GeminiClassifier, rules::RuleClassifier,
};
pub use config::{ClassifierConfig, Config, EndpointsConfig};
pub use error::ForecastError;
pub use export::Snapshot;
pub use historical::HistoricalAggregator;
pub use model::{
    AggregatedHistoricalSummary, Condition, ConditionVerdict, Coordinates, EventQuery,
    ForecastResult, HistoricalYearSample, HourlyForecastSeries, HourlyPoint, PointWeather,
};
pub use provider::{ArchiveDay, ArchiveSource, ForecastSource, Geocoder, OpenMeteoClient};
pub use router::{DAILY_FORECAST_HORIZON_DAYS, ForecastPath, ForecastRouter};
