use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{ClassifierInput, ConditionClassifier, prompt, validate_verdict};
use crate::{
    error::{ForecastError, truncate_body},
    model::ConditionVerdict,
};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Delegates classification to Gemini with a structured-output schema.
///
/// The answer is only trusted after [`validate_verdict`] accepts it.
#[derive(Debug, Clone)]
pub struct GeminiClassifier {
    api_key: String,
    model: String,
    base_url: String,
    http: Client,
}

impl GeminiClassifier {
    pub fn new(api_key: String, model: String) -> Result<Self, ForecastError> {
        Self::with_base_url(api_key, model, GEMINI_BASE_URL.to_string())
    }

    pub fn with_base_url(
        api_key: String,
        model: String,
        base_url: String,
    ) -> Result<Self, ForecastError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { api_key, model, base_url, http })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url.trim_end_matches('/'), self.model)
    }

    fn request_body(prompt: &str) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "condition": {
                            "type": "STRING",
                            "description": "A single descriptor for the weather: 'very hot', 'hot', 'standard', 'cold', 'very cold', 'very windy', or 'very wet'."
                        },
                        "rainProbability": {
                            "type": "NUMBER",
                            "description": "The probability of rain as a percentage (0-100)."
                        }
                    },
                    "required": ["condition", "rainProbability"]
                }
            }
        })
    }
}

#[async_trait]
impl ConditionClassifier for GeminiClassifier {
    #[instrument(skip(self, input), fields(model = %self.model))]
    async fn classify(
        &self,
        input: &ClassifierInput<'_>,
    ) -> Result<ConditionVerdict, ForecastError> {
        let prompt = match input {
            ClassifierInput::Point(point) => prompt::daily_prompt(point),
            ClassifierInput::Historical(summary) => prompt::historical_prompt(summary),
        };

        debug!(prompt_len = prompt.len(), "Sending generateContent request");

        let res = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&Self::request_body(&prompt))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to reach Gemini");
                ForecastError::NetworkFailure(format!("Gemini request failed: {e}"))
            })?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            warn!(%status, "Gemini returned an error status");
            return Err(ForecastError::NetworkFailure(format!(
                "Gemini request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        parse_verdict(&body)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    condition: String,
    #[serde(rename = "rainProbability")]
    rain_probability: f64,
}

fn parse_verdict(body: &str) -> Result<ConditionVerdict, ForecastError> {
    let violation = |msg: String| ForecastError::ServiceContractViolation(msg);

    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| violation(format!("response is not valid JSON: {e}")))?;

    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(violation("response contained no candidate text".to_string()));
    }

    let raw: RawVerdict = serde_json::from_str(text.trim())
        .map_err(|e| violation(format!("answer does not match the verdict schema: {e}")))?;

    validate_verdict(&raw.condition, raw.rain_probability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Condition;

    fn wrap(text: &str) -> String {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string()
    }

    #[test]
    fn endpoint_includes_model() {
        let c = GeminiClassifier::with_base_url(
            "k".into(),
            "gemini-2.5-flash".into(),
            "http://localhost:1234/".into(),
        )
        .expect("client");
        assert_eq!(c.endpoint(), "http://localhost:1234/models/gemini-2.5-flash:generateContent");
    }

    #[test]
    fn request_body_requires_both_fields() {
        let body = GeminiClassifier::request_body("hi");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            body["generationConfig"]["responseSchema"]["required"],
            json!(["condition", "rainProbability"])
        );
    }

    #[test]
    fn parses_structured_answer() {
        let verdict =
            parse_verdict(&wrap(r#"{"condition":"very windy","rainProbability":10}"#)).expect("ok");
        assert_eq!(verdict.condition, Condition::VeryWindy);
        assert_eq!(verdict.rain_probability, 10);
    }

    #[test]
    fn rejects_answers_outside_the_contract() {
        for text in [
            r#"{"condition":"drizzly","rainProbability":10}"#,
            r#"{"condition":"hot","rainProbability":140}"#,
            r#"{"condition":"hot"}"#,
            "not json at all",
            "",
        ] {
            let err = parse_verdict(&wrap(text)).unwrap_err();
            assert!(matches!(err, ForecastError::ServiceContractViolation(_)), "{text}: {err:?}");
        }
    }

    #[test]
    fn rejects_empty_candidates() {
        let err = parse_verdict(r#"{"candidates":[]}"#).unwrap_err();
        assert!(matches!(err, ForecastError::ServiceContractViolation(_)));
    }
}
