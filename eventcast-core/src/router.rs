//! Picks the forecast path for an event and assembles the [`ForecastResult`].

use chrono::{Datelike, Local, NaiveDate, NaiveTime, Timelike};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    classifier::{ClassifierInput, ConditionClassifier},
    error::ForecastError,
    historical::HistoricalAggregator,
    model::{Coordinates, EventQuery, ForecastResult, HourlyForecastSeries, HourlyPoint},
    provider::{ArchiveSource, ForecastSource, Geocoder, OpenMeteoClient},
};

/// Events at most this many days ahead use the hourly forecast; later ones use climatology.
pub const DAILY_FORECAST_HORIZON_DAYS: i64 = 15;

/// Hours shown on each side of the event hour in the outlook.
pub const WINDOW_HOURS_EACH_SIDE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastPath {
    Daily,
    Historical,
}

impl ForecastPath {
    pub fn for_lead_days(lead_days: i64) -> Self {
        if lead_days <= DAILY_FORECAST_HORIZON_DAYS {
            ForecastPath::Daily
        } else {
            ForecastPath::Historical
        }
    }
}

/// Whole days from `today` to `event_date`, both taken at midnight.
pub fn lead_days(today: NaiveDate, event_date: NaiveDate) -> i64 {
    (event_date - today).num_days()
}

/// First hour in the series whose hour-of-day equals the event's.
pub fn find_event_hour(series: &HourlyForecastSeries, time: NaiveTime) -> Option<usize> {
    series.times().iter().position(|t| t.hour() == time.hour())
}

/// Up to three hours either side of `idx`, clipped to the series.
pub fn hourly_window(series: &HourlyForecastSeries, idx: usize) -> Vec<HourlyPoint> {
    let start = idx.saturating_sub(WINDOW_HOURS_EACH_SIDE);
    let end = (idx + WINDOW_HOURS_EACH_SIDE + 1).min(series.len());
    if start >= end {
        return Vec::new();
    }

    series.times()[start..end]
        .iter()
        .zip(&series.precipitation_probabilities()[start..end])
        .map(|(t, p)| HourlyPoint {
            time: t.format("%-I %p").to_string(),
            precipitation_probability: *p,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ForecastRouter {
    geocoder: Arc<dyn Geocoder>,
    forecast: Arc<dyn ForecastSource>,
    historical: HistoricalAggregator,
    classifier: Arc<dyn ConditionClassifier>,
}

impl ForecastRouter {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        forecast: Arc<dyn ForecastSource>,
        archive: Arc<dyn ArchiveSource>,
        classifier: Arc<dyn ConditionClassifier>,
    ) -> Self {
        Self { geocoder, forecast, historical: HistoricalAggregator::new(archive), classifier }
    }

    /// All three weather roles served by one Open-Meteo client.
    pub fn open_meteo(client: OpenMeteoClient, classifier: Arc<dyn ConditionClassifier>) -> Self {
        let client = Arc::new(client);
        Self::new(client.clone(), client.clone(), client, classifier)
    }

    pub async fn route(&self, query: &EventQuery) -> Result<ForecastResult, ForecastError> {
        self.route_on(query, Local::now().date_naive()).await
    }

    /// [`route`](Self::route) with an explicit "today".
    #[instrument(skip(self, query), fields(location = %query.location, date = %query.date))]
    pub async fn route_on(
        &self,
        query: &EventQuery,
        today: NaiveDate,
    ) -> Result<ForecastResult, ForecastError> {
        query.validate(today)?;

        let coords = self
            .geocoder
            .geocode(query.location.trim())
            .await?
            .ok_or(ForecastError::LocationNotFound)?;

        let lead = lead_days(today, query.date);
        let path = ForecastPath::for_lead_days(lead);
        info!(lead_days = lead, ?path, "Routing forecast");

        match path {
            ForecastPath::Daily => self.daily(coords, query).await,
            ForecastPath::Historical => self.historical(coords, query, today).await,
        }
    }

    async fn daily(
        &self,
        coords: Coordinates,
        query: &EventQuery,
    ) -> Result<ForecastResult, ForecastError> {
        let series = self.forecast.hourly_forecast(coords, query.date).await?;
        if series.is_empty() {
            return Err(ForecastError::NoWeatherData);
        }

        let idx = find_event_hour(&series, query.time).ok_or(ForecastError::TimeUnavailable)?;
        let point_weather = series.point(idx).ok_or(ForecastError::TimeUnavailable)?;
        let hourly_window = hourly_window(&series, idx);

        let verdict = self.classifier.classify(&ClassifierInput::Point(&point_weather)).await?;
        info!(
            condition = %verdict.condition,
            rain = verdict.rain_probability,
            "Daily forecast ready"
        );

        Ok(ForecastResult::Daily { verdict, point_weather, hourly_window })
    }

    async fn historical(
        &self,
        coords: Coordinates,
        query: &EventQuery,
        today: NaiveDate,
    ) -> Result<ForecastResult, ForecastError> {
        let summary = self.historical.aggregate_from(coords, query.date, today.year()).await?;

        let verdict = self.classifier.classify(&ClassifierInput::Historical(&summary)).await?;
        info!(
            condition = %verdict.condition,
            rain = verdict.rain_probability,
            "Historical forecast ready"
        );

        Ok(ForecastResult::Historical { verdict, summary })
    }
}
