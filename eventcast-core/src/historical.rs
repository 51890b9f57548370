//! Same-calendar-day climatology over the previous twenty years.

use chrono::{Datelike, Local, NaiveDate};
use futures::future::join_all;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info, instrument};

use crate::{
    catalog,
    error::ForecastError,
    model::{AggregatedHistoricalSummary, Coordinates, HistoricalYearSample},
    provider::{ArchiveDay, ArchiveSource},
};

pub const YEARS_TO_FETCH: i32 = 20;

/// Daily precipitation above this many millimetres counts as a rainy day.
pub const RAIN_THRESHOLD_MM: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct HistoricalAggregator {
    archive: Arc<dyn ArchiveSource>,
}

impl HistoricalAggregator {
    pub fn new(archive: Arc<dyn ArchiveSource>) -> Self {
        Self { archive }
    }

    pub async fn aggregate(
        &self,
        coords: Coordinates,
        date: NaiveDate,
    ) -> Result<AggregatedHistoricalSummary, ForecastError> {
        self.aggregate_from(coords, date, Local::now().year()).await
    }

    /// Fetch the 20 years before `current_year` concurrently and summarize them.
    ///
    /// A failed year is logged and left out; it never fails the batch.
    #[instrument(skip(self, coords), fields(lat = %coords.latitude, lon = %coords.longitude))]
    pub async fn aggregate_from(
        &self,
        coords: Coordinates,
        date: NaiveDate,
        current_year: i32,
    ) -> Result<AggregatedHistoricalSummary, ForecastError> {
        let requests = (1..=YEARS_TO_FETCH).map(|i| {
            let day = ArchiveDay::same_day_in(date, current_year - i);
            async move {
                match self.archive.daily_sample(coords, day).await {
                    Ok(sample) => {
                        if sample.is_none() {
                            debug!(%day, "Archive returned no usable record");
                        }
                        sample
                    }
                    Err(err) => {
                        debug!(%day, error = %err, "Skipping archive year");
                        None
                    }
                }
            }
        });

        // Output order matches request order, whatever order they finish in.
        let samples: Vec<Option<HistoricalYearSample>> = join_all(requests).await;

        let summary = summarize(&samples)?;
        info!(
            valid = summary.total_valid_years,
            rainy = summary.rainy_years,
            dominant = %summary.dominant_condition,
            "Historical aggregation finished"
        );
        Ok(summary)
    }
}

/// Reduce per-year slots into a summary. Absent slots are ignored.
pub fn summarize(
    samples: &[Option<HistoricalYearSample>],
) -> Result<AggregatedHistoricalSummary, ForecastError> {
    let valid: Vec<&HistoricalYearSample> = samples.iter().flatten().collect();
    if valid.is_empty() {
        return Err(ForecastError::NoHistoricalData);
    }

    let count = valid.len() as f64;
    let rainy_years = valid.iter().filter(|s| s.precipitation_sum > RAIN_THRESHOLD_MM).count();
    let avg_temperature = valid.iter().map(|s| s.mean_temperature).sum::<f64>() / count;
    let avg_wind_speed = valid.iter().map(|s| s.mean_wind_speed).sum::<f64>() / count;

    let dominant_weather_code = dominant_code(valid.iter().map(|s| s.weather_code));

    Ok(AggregatedHistoricalSummary {
        rainy_years: rainy_years as u32,
        total_valid_years: valid.len() as u32,
        avg_temperature,
        avg_wind_speed,
        dominant_condition: catalog::describe(dominant_weather_code).to_string(),
        dominant_weather_code,
    })
}

/// Most frequent code; on a tie, the code that reached the top count first wins.
fn dominant_code(codes: impl IntoIterator<Item = i32>) -> i32 {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    let mut best = (0, 0);

    for code in codes {
        let n = counts.entry(code).or_insert(0);
        *n += 1;
        if *n > best.1 {
            best = (code, *n);
        }
    }

    best.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn sample(code: i32, temp: f64, precip: f64, wind: f64) -> HistoricalYearSample {
        HistoricalYearSample {
            weather_code: code,
            mean_temperature: temp,
            precipitation_sum: precip,
            mean_wind_speed: wind,
        }
    }

    #[test]
    fn empty_or_all_absent_is_no_historical_data() {
        assert_eq!(summarize(&[]).unwrap_err(), ForecastError::NoHistoricalData);
        assert_eq!(summarize(&[None, None, None]).unwrap_err(), ForecastError::NoHistoricalData);
    }

    #[test]
    fn averages_ignore_absent_years() {
        let samples = vec![
            Some(sample(3, 10.0, 0.0, 5.0)),
            None,
            Some(sample(3, 20.0, 0.5, 15.0)),
            None,
        ];

        let summary = summarize(&samples).expect("two valid years");
        assert_eq!(summary.total_valid_years, 2);
        assert_eq!(summary.rainy_years, 1);
        assert!((summary.avg_temperature - 15.0).abs() < 1e-9);
        assert!((summary.avg_wind_speed - 10.0).abs() < 1e-9);
        assert_eq!(summary.dominant_condition, "Overcast");
    }

    #[test]
    fn trace_precipitation_is_not_rain() {
        let samples = vec![
            Some(sample(0, 10.0, 0.1, 5.0)),
            Some(sample(0, 10.0, 0.11, 5.0)),
            Some(sample(0, 10.0, 0.0, 5.0)),
        ];

        let summary = summarize(&samples).expect("valid");
        assert_eq!(summary.rainy_years, 1);
        assert!(summary.rainy_years <= summary.total_valid_years);
    }

    #[test]
    fn dominant_code_tie_goes_to_first_to_reach_max() {
        assert_eq!(dominant_code([1, 2, 2, 1]), 2);
        assert_eq!(dominant_code([61, 3, 3, 61, 0]), 3);
        assert_eq!(dominant_code([5, 7]), 5);
        assert_eq!(dominant_code([0, 61, 61, 61, 0]), 61);
    }

    /// Archive fake keyed by year; years it doesn't know fail.
    #[derive(Debug, Default)]
    struct FakeArchive {
        by_year: HashMap<i32, Option<HistoricalYearSample>>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ArchiveSource for FakeArchive {
        async fn daily_sample(
            &self,
            _coords: Coordinates,
            day: ArchiveDay,
        ) -> Result<Option<HistoricalYearSample>, ForecastError> {
            if let Ok(mut requested) = self.requested.lock() {
                requested.push(day.to_string());
            }
            self.by_year
                .get(&day.year)
                .cloned()
                .ok_or_else(|| ForecastError::NetworkFailure("boom".into()))
        }
    }

    fn coords() -> Coordinates {
        Coordinates { latitude: 41.0, longitude: 29.0 }
    }

    #[tokio::test]
    async fn requests_the_same_day_in_each_of_the_last_twenty_years() {
        let archive = Arc::new(FakeArchive::default());
        let aggregator = HistoricalAggregator::new(archive.clone());
        let date = NaiveDate::from_ymd_opt(2026, 8, 15).expect("valid date");

        let err = aggregator.aggregate_from(coords(), date, 2026).await.unwrap_err();
        assert_eq!(err, ForecastError::NoHistoricalData);

        let mut requested = archive.requested.lock().expect("lock").clone();
        requested.sort();
        let expected: Vec<String> = (2006..=2025).map(|y| format!("{y}-08-15")).collect();
        assert_eq!(requested, expected);
    }

    #[tokio::test]
    async fn partial_failures_are_excluded_not_fatal() {
        let mut by_year = HashMap::new();
        by_year.insert(2025, Some(sample(61, 12.0, 4.0, 20.0)));
        by_year.insert(2024, Some(sample(61, 14.0, 0.0, 10.0)));
        by_year.insert(2023, None);
        by_year.insert(2010, Some(sample(2, 16.0, 1.2, 30.0)));
        let archive = Arc::new(FakeArchive { by_year, ..Default::default() });

        let aggregator = HistoricalAggregator::new(archive);
        let date = NaiveDate::from_ymd_opt(2026, 5, 20).expect("valid date");
        let summary = aggregator.aggregate_from(coords(), date, 2026).await.expect("summary");

        assert_eq!(summary.total_valid_years, 3);
        assert_eq!(summary.rainy_years, 2);
        assert!((summary.avg_temperature - 14.0).abs() < 1e-9);
        assert!((summary.avg_wind_speed - 20.0).abs() < 1e-9);
        assert_eq!(summary.dominant_weather_code, 61);
        assert_eq!(summary.dominant_condition, "Slight rain");
    }
}
