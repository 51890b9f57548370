use crate::{
    Config,
    classifier::{gemini::GeminiClassifier, rules::RuleClassifier},
    error::ForecastError,
    model::{AggregatedHistoricalSummary, Condition, ConditionVerdict, PointWeather},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod gemini;
pub mod prompt;
pub mod rules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifierId {
    Local,
    Gemini,
}

impl ClassifierId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierId::Local => "local",
            ClassifierId::Gemini => "gemini",
        }
    }

    pub const fn all() -> &'static [ClassifierId] {
        &[ClassifierId::Local, ClassifierId::Gemini]
    }

    pub fn needs_api_key(&self) -> bool {
        matches!(self, ClassifierId::Gemini)
    }
}

impl std::fmt::Display for ClassifierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ClassifierId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "local" => Ok(ClassifierId::Local),
            "gemini" => Ok(ClassifierId::Gemini),
            _ => Err(anyhow::anyhow!(
                "Unknown classifier '{value}'. Supported classifiers: local, gemini."
            )),
        }
    }
}

/// The two shapes of data a verdict can be derived from.
#[derive(Debug, Clone, Copy)]
pub enum ClassifierInput<'a> {
    Point(&'a PointWeather),
    Historical(&'a AggregatedHistoricalSummary),
}

#[async_trait]
pub trait ConditionClassifier: Send + Sync + Debug {
    async fn classify(&self, input: &ClassifierInput<'_>)
    -> Result<ConditionVerdict, ForecastError>;
}

/// Check an externally produced verdict against the classifier contract.
pub fn validate_verdict(
    condition: &str,
    rain_probability: f64,
) -> Result<ConditionVerdict, ForecastError> {
    let condition: Condition = condition.parse()?;

    if !rain_probability.is_finite() || !(0.0..=100.0).contains(&rain_probability) {
        return Err(ForecastError::ServiceContractViolation(format!(
            "rain probability {rain_probability} is outside 0..=100"
        )));
    }

    Ok(ConditionVerdict { condition, rain_probability: rain_probability.round() as u8 })
}

/// Construct a classifier from config and explicit ClassifierId.
pub fn classifier_from_config(
    id: ClassifierId,
    config: &Config,
) -> anyhow::Result<Box<dyn ConditionClassifier>> {
    let boxed: Box<dyn ConditionClassifier> = match id {
        ClassifierId::Local => Box::new(RuleClassifier),
        ClassifierId::Gemini => {
            let api_key = config.classifier_api_key(id).ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured for classifier '{id}'.\n\
                     Hint: run `eventcast configure {id}` or set {}.",
                    crate::config::GEMINI_API_KEY_ENV
                )
            })?;
            Box::new(GeminiClassifier::new(api_key, config.gemini_model())?)
        }
    };

    Ok(boxed)
}

/// Construct the default classifier from config, using the `default_classifier` field.
pub fn default_classifier_from_config(
    config: &Config,
) -> anyhow::Result<Box<dyn ConditionClassifier>> {
    let id = config.default_classifier_id()?;
    classifier_from_config(id, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_id_as_str_roundtrip() {
        for id in ClassifierId::all() {
            let parsed = ClassifierId::try_from(id.as_str()).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_classifier_error() {
        let err = ClassifierId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown classifier"));
    }

    #[test]
    fn local_classifier_needs_no_config() {
        let cfg = Config::default();
        assert!(classifier_from_config(ClassifierId::Local, &cfg).is_ok());
        assert!(default_classifier_from_config(&cfg).is_ok());
    }

    #[test]
    fn gemini_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.upsert_classifier_api_key(ClassifierId::Gemini, "KEY".to_string());

        assert!(default_classifier_from_config(&cfg).is_ok());
    }

    #[test]
    fn validate_accepts_contract_values() {
        let verdict = validate_verdict("very wet", 45.0).expect("valid");
        assert_eq!(verdict.condition, Condition::VeryWet);
        assert_eq!(verdict.rain_probability, 45);

        let verdict = validate_verdict("Standard", 12.6).expect("valid");
        assert_eq!(verdict.condition, Condition::Standard);
        assert_eq!(verdict.rain_probability, 13);
    }

    #[test]
    fn validate_rejects_out_of_domain_values() {
        for (condition, probability) in
            [("sunny", 10.0), ("hot", -1.0), ("hot", 100.5), ("cold", f64::NAN)]
        {
            let err = validate_verdict(condition, probability).unwrap_err();
            assert!(
                matches!(err, ForecastError::ServiceContractViolation(_)),
                "{condition} / {probability}: {err:?}"
            );
        }
    }
}
