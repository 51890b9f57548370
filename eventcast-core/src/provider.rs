//! Boundaries to the external weather services.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use std::fmt::{self, Debug};

use crate::{
    error::ForecastError,
    model::{Coordinates, HistoricalYearSample, HourlyForecastSeries},
};

pub mod open_meteo;

pub use open_meteo::OpenMeteoClient;

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// `Ok(None)` when nothing matches; that is not an error.
    async fn geocode(&self, location: &str) -> Result<Option<Coordinates>, ForecastError>;
}

#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    /// Hourly values for one local date; may be empty.
    async fn hourly_forecast(
        &self,
        coords: Coordinates,
        date: NaiveDate,
    ) -> Result<HourlyForecastSeries, ForecastError>;
}

#[async_trait]
pub trait ArchiveSource: Send + Sync + Debug {
    /// Daily archive values for one day; `Ok(None)` for missing or incomplete records.
    async fn daily_sample(
        &self,
        coords: Coordinates,
        day: ArchiveDay,
    ) -> Result<Option<HistoricalYearSample>, ForecastError>;
}

/// A calendar day that is not checked for existence.
///
/// Moving Feb 29 to a non-leap year yields `YYYY-02-29`; the archive service decides
/// what that means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArchiveDay {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl ArchiveDay {
    /// Same month and day as `date`, in `year`.
    pub fn same_day_in(date: NaiveDate, year: i32) -> Self {
        Self { year, month: date.month(), day: date.day() }
    }
}

impl fmt::Display for ArchiveDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}
