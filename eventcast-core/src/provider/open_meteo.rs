use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{ArchiveDay, ArchiveSource, ForecastSource, Geocoder};
use crate::{
    config::EndpointsConfig,
    error::{ForecastError, truncate_body},
    model::{Coordinates, HistoricalYearSample, HourlyForecastSeries},
};

const HOURLY_FIELDS: &str = "temperature_2m,precipitation_probability,weather_code,wind_speed_10m";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_mean,precipitation_sum,wind_speed_10m_mean";
const FORECAST_MODEL: &str = "gfs_global";

/// Open-Meteo geocoding, forecast and archive APIs behind one HTTP client.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    endpoints: EndpointsConfig,
    http: Client,
}

impl OpenMeteoClient {
    pub fn new(endpoints: EndpointsConfig) -> Result<Self, ForecastError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(endpoints.timeout_secs))
            .build()?;

        Ok(Self { endpoints, http })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        what: &str,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, ForecastError> {
        debug!(%url, "Requesting Open-Meteo {what}");

        let res = self.http.get(&url).query(query).send().await.map_err(|e| {
            ForecastError::NetworkFailure(format!("Open-Meteo {what} request failed: {e}"))
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            ForecastError::NetworkFailure(format!("Failed to read Open-Meteo {what} body: {e}"))
        })?;

        if !status.is_success() {
            return Err(ForecastError::NetworkFailure(format!(
                "Open-Meteo {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ForecastError::NetworkFailure(format!("Failed to parse Open-Meteo {what} JSON: {e}"))
        })
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

fn coord_query(coords: Coordinates) -> Vec<(&'static str, String)> {
    vec![
        ("latitude", coords.latitude.to_string()),
        ("longitude", coords.longitude.to_string()),
    ]
}

#[async_trait]
impl Geocoder for OpenMeteoClient {
    #[instrument(skip(self))]
    async fn geocode(&self, location: &str) -> Result<Option<Coordinates>, ForecastError> {
        let query = [
            ("name", location.to_string()),
            ("count", "1".to_string()),
            ("language", "en".to_string()),
            ("format", "json".to_string()),
        ];

        let parsed: OmGeocodingResponse = self
            .get_json("geocoding", join_url(&self.endpoints.geocoding_url, "search"), &query)
            .await?;

        let coords = parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|r| Coordinates { latitude: r.latitude, longitude: r.longitude });

        debug!(?coords, "Geocoding finished");
        Ok(coords)
    }
}

#[async_trait]
impl ForecastSource for OpenMeteoClient {
    #[instrument(skip(self, coords), fields(lat = %coords.latitude, lon = %coords.longitude))]
    async fn hourly_forecast(
        &self,
        coords: Coordinates,
        date: NaiveDate,
    ) -> Result<HourlyForecastSeries, ForecastError> {
        let day = date.format("%Y-%m-%d").to_string();
        let mut query = coord_query(coords);
        query.extend([
            ("hourly", HOURLY_FIELDS.to_string()),
            ("models", FORECAST_MODEL.to_string()),
            ("start_date", day.clone()),
            ("end_date", day),
            ("timezone", "auto".to_string()),
        ]);

        let parsed: OmForecastResponse = self
            .get_json("forecast", join_url(&self.endpoints.forecast_url, "forecast"), &query)
            .await?;

        match parsed.hourly {
            Some(hourly) => hourly.into_series(),
            None => Ok(HourlyForecastSeries::default()),
        }
    }
}

#[async_trait]
impl ArchiveSource for OpenMeteoClient {
    #[instrument(skip(self, coords, day), fields(day = %day))]
    async fn daily_sample(
        &self,
        coords: Coordinates,
        day: ArchiveDay,
    ) -> Result<Option<HistoricalYearSample>, ForecastError> {
        let day = day.to_string();
        let mut query = coord_query(coords);
        query.extend([
            ("start_date", day.clone()),
            ("end_date", day),
            ("daily", DAILY_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
        ]);

        let parsed: OmArchiveResponse = self
            .get_json("archive", join_url(&self.endpoints.archive_url, "archive"), &query)
            .await?;

        Ok(parsed.daily.and_then(OmDaily::first_sample))
    }
}

#[derive(Debug, Deserialize)]
struct OmGeocodingResponse {
    results: Option<Vec<OmGeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct OmGeocodingResult {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    hourly: Option<OmHourly>,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<i32>>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
}

impl OmHourly {
    /// Hours with any null value are dropped whole, which keeps the columns aligned.
    fn into_series(self) -> Result<HourlyForecastSeries, ForecastError> {
        let len = self.time.len();
        if [
            self.temperature_2m.len(),
            self.precipitation_probability.len(),
            self.weather_code.len(),
            self.wind_speed_10m.len(),
        ]
        .iter()
        .any(|&n| n != len)
        {
            return Err(ForecastError::NetworkFailure(
                "Open-Meteo returned hourly columns of different lengths".to_string(),
            ));
        }

        let mut time = Vec::with_capacity(len);
        let mut temperature = Vec::with_capacity(len);
        let mut precipitation = Vec::with_capacity(len);
        let mut codes = Vec::with_capacity(len);
        let mut wind = Vec::with_capacity(len);

        for i in 0..len {
            let row = (
                self.temperature_2m[i],
                self.precipitation_probability[i],
                self.weather_code[i],
                self.wind_speed_10m[i],
            );
            let (Some(t), Some(p), Some(c), Some(w)) = row else {
                debug!(time = %self.time[i], "Skipping incomplete forecast hour");
                continue;
            };

            time.push(parse_local_time(&self.time[i])?);
            temperature.push(t);
            precipitation.push(p.round().clamp(0.0, 100.0) as u8);
            codes.push(c);
            wind.push(w);
        }

        HourlyForecastSeries::new(time, temperature, precipitation, codes, wind)
    }
}

fn parse_local_time(s: &str) -> Result<NaiveDateTime, ForecastError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| {
            warn!(value = s, "Unparseable forecast time");
            ForecastError::NetworkFailure(format!("Invalid forecast time '{s}': {e}"))
        })
}

#[derive(Debug, Deserialize)]
struct OmArchiveResponse {
    daily: Option<OmDaily>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    #[serde(default)]
    weather_code: Vec<Option<i32>>,
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m_mean: Vec<Option<f64>>,
}

impl OmDaily {
    fn first_sample(self) -> Option<HistoricalYearSample> {
        let first = |v: &[Option<f64>]| v.first().copied().flatten();

        Some(HistoricalYearSample {
            precipitation_sum: first(&self.precipitation_sum)?,
            mean_temperature: first(&self.temperature_2m_mean)?,
            mean_wind_speed: first(&self.wind_speed_10m_mean)?,
            weather_code: self.weather_code.first().copied().flatten()?,
        })
    }
}
