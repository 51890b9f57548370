use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, fs, path::PathBuf};

use crate::classifier::ClassifierId;

/// Overrides the stored Gemini API key when set.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Settings for a remote classifier (API key and optional model override).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Base URLs of the Open-Meteo services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    #[serde(default = "default_archive_url")]
    pub archive_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_archive_url() -> String {
    "https://archive-api.open-meteo.com/v1".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            archive_url: default_archive_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default classifier id, "local" or "gemini". Unset means "local".
    pub default_classifier: Option<String>,

    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Example TOML:
    /// [classifiers.gemini]
    /// api_key = "..."
    #[serde(default)]
    pub classifiers: HashMap<String, ClassifierConfig>,
}

impl Config {
    /// Return the default classifier as a strongly-typed ClassifierId.
    pub fn default_classifier_id(&self) -> Result<ClassifierId> {
        match self.default_classifier.as_deref() {
            None => Ok(ClassifierId::Local),
            Some(s) => ClassifierId::try_from(s),
        }
    }

    pub fn classifier_config(&self, id: ClassifierId) -> Option<&ClassifierConfig> {
        self.classifiers.get(id.as_str())
    }

    pub fn set_default_classifier(&mut self, id: ClassifierId) {
        self.default_classifier = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "eventcast", "eventcast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a classifier API key; the first configured classifier becomes the default.
    pub fn upsert_classifier_api_key(&mut self, id: ClassifierId, api_key: String) {
        let model = self.classifier_config(id).and_then(|cfg| cfg.model.clone());
        self.classifiers.insert(id.as_str().to_string(), ClassifierConfig { api_key, model });

        if self.default_classifier.is_none() {
            self.default_classifier = Some(id.to_string());
        }
    }

    /// API key for a classifier; the Gemini key can come from the environment.
    pub fn classifier_api_key(&self, id: ClassifierId) -> Option<String> {
        if id == ClassifierId::Gemini {
            if let Some(key) = env::var(GEMINI_API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()) {
                return Some(key);
            }
        }

        self.classifier_config(id).map(|cfg| cfg.api_key.clone())
    }

    pub fn gemini_model(&self) -> String {
        self.classifier_config(ClassifierId::Gemini)
            .and_then(|cfg| cfg.model.clone())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_classifier_is_local_when_not_set() {
        let cfg = Config::default();
        assert_eq!(cfg.default_classifier_id().expect("local"), ClassifierId::Local);
    }

    #[test]
    fn unknown_default_classifier_errors() {
        let cfg = Config { default_classifier: Some("oracle".into()), ..Default::default() };
        let err = cfg.default_classifier_id().unwrap_err();
        assert!(err.to_string().contains("Unknown classifier"));
    }

    #[test]
    fn upsert_sets_key_and_default() {
        let mut cfg = Config::default();
        cfg.upsert_classifier_api_key(ClassifierId::Gemini, "GEMINI_KEY".into());

        assert_eq!(cfg.default_classifier_id().expect("gemini"), ClassifierId::Gemini);
        assert_eq!(
            cfg.classifier_config(ClassifierId::Gemini).map(|c| c.api_key.as_str()),
            Some("GEMINI_KEY")
        );
    }

    #[test]
    fn upsert_keeps_model_override_and_existing_default() {
        let mut cfg = Config::default();
        cfg.set_default_classifier(ClassifierId::Local);
        cfg.classifiers.insert(
            "gemini".into(),
            ClassifierConfig { api_key: "OLD".into(), model: Some("gemini-2.0-pro".into()) },
        );

        cfg.upsert_classifier_api_key(ClassifierId::Gemini, "NEW".into());

        assert_eq!(cfg.default_classifier_id().expect("local"), ClassifierId::Local);
        assert_eq!(cfg.gemini_model(), "gemini-2.0-pro");
    }

    #[test]
    fn gemini_model_defaults() {
        assert_eq!(Config::default().gemini_model(), DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn partial_toml_fills_endpoint_defaults() {
        let cfg = Config::from_toml(
            r#"
            default_classifier = "gemini"

            [endpoints]
            forecast_url = "http://localhost:9000"

            [classifiers.gemini]
            api_key = "abc"
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.endpoints.forecast_url, "http://localhost:9000");
        assert_eq!(cfg.endpoints.archive_url, default_archive_url());
        assert_eq!(cfg.endpoints.timeout_secs, 30);
        assert_eq!(cfg.default_classifier_id().expect("gemini"), ClassifierId::Gemini);
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let mut cfg = Config::default();
        cfg.upsert_classifier_api_key(ClassifierId::Gemini, "KEY".into());

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let back = Config::from_toml(&text).expect("parse");

        assert_eq!(back.endpoints, cfg.endpoints);
        assert_eq!(back.default_classifier, cfg.default_classifier);
    }
}
