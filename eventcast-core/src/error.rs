use thiserror::Error;

/// Everything that can abort a single forecast query.
///
/// Each variant renders as one sentence that can be shown to the user as-is.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Invalid event: {0}")]
    InvalidQuery(String),

    #[error("Could not find location. Please try a more specific address or city.")]
    LocationNotFound,

    #[error("Could not retrieve weather data for the specified date.")]
    NoWeatherData,

    #[error(
        "Weather data for the specific time is not available. Please try an earlier time on the same day."
    )]
    TimeUnavailable,

    #[error("Could not retrieve any historical weather data for this location and date.")]
    NoHistoricalData,

    #[error("The forecast summary service returned an unusable answer: {0}")]
    ServiceContractViolation(String),

    #[error("Network request failed: {0}")]
    NetworkFailure(String),
}

impl From<reqwest::Error> for ForecastError {
    fn from(err: reqwest::Error) -> Self {
        ForecastError::NetworkFailure(err.to_string())
    }
}

/// Error bodies are cut to this many characters before they go into a message.
const MAX_BODY_CHARS: usize = 200;

pub(crate) fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
