use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, bail};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand, ValueEnum};
use eventcast_core::{
    ClassifierId, ConditionClassifier, Config, EventQuery, ForecastRouter, OpenMeteoClient,
    Snapshot, catalog, classifier_from_config, config::DEFAULT_GEMINI_MODEL,
    default_classifier_from_config,
};
use inquire::{Password, PasswordDisplayMode, Text};
use tracing::info;

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "eventcast", version, about = "Will it rain on my event?")]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Choose the condition classifier and store its credentials.
    Configure {
        /// Classifier short name, "local" or "gemini".
        classifier: String,
    },

    /// Forecast the conditions for an event.
    Forecast {
        /// Place name, e.g. "Izmir, Turkey".
        location: String,

        /// Event date, YYYY-MM-DD.
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        /// Event time, HH:MM (local to the location).
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,

        /// Override the configured classifier.
        #[arg(long)]
        classifier: Option<String>,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Write to this file instead of stdout. A directory gets a generated file name.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the description of a WMO weather code.
    Describe { code: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Csv,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Text => "txt",
            Format::Json => "json",
            Format::Csv => "csv",
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD ({e})"))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| format!("expected HH:MM ({e})"))
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { classifier } => configure(&classifier),
            Command::Forecast { location, date, time, classifier, format, output } => {
                let query = EventQuery::new(location, date, time);
                forecast(query, classifier.as_deref(), format, output).await
            }
            Command::Describe { code } => {
                println!("{code}: {}", catalog::describe(code));
                Ok(())
            }
        }
    }
}

fn configure(classifier: &str) -> anyhow::Result<()> {
    let id = ClassifierId::try_from(classifier)?;
    let mut config = Config::load()?;

    if id.needs_api_key() {
        let api_key = Password::new(&format!("API key for {id}:"))
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;
        if api_key.trim().is_empty() {
            bail!("API key must not be empty");
        }

        let current = config
            .classifier_config(id)
            .and_then(|cfg| cfg.model.clone())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let model = Text::new("Model:")
            .with_default(&current)
            .prompt()
            .context("Failed to read model name")?;

        config.upsert_classifier_api_key(id, api_key.trim().to_string());
        if let Some(cfg) = config.classifiers.get_mut(id.as_str()) {
            cfg.model = Some(model.trim().to_string()).filter(|m| !m.is_empty());
        }
    }

    config.set_default_classifier(id);
    config.save()?;

    println!("Default classifier set to '{id}' ({}).", Config::config_file_path()?.display());
    Ok(())
}

async fn forecast(
    query: EventQuery,
    classifier: Option<&str>,
    format: Format,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let classifier: Arc<dyn ConditionClassifier> = match classifier {
        Some(name) => Arc::from(classifier_from_config(ClassifierId::try_from(name)?, &config)?),
        None => Arc::from(default_classifier_from_config(&config)?),
    };
    let client = OpenMeteoClient::new(config.endpoints.clone())?;
    let router = ForecastRouter::open_meteo(client, classifier);

    let result = router.route(&query).await?;
    let snapshot = Snapshot::new(query, result);

    let rendered = match format {
        Format::Text => output::render(&snapshot),
        Format::Json => snapshot.to_json()?,
        Format::Csv => snapshot.to_csv(),
    };

    match output {
        None => print!("{rendered}"),
        Some(path) => {
            let path = if path.is_dir() {
                path.join(format!("{}.{}", snapshot.file_stem(), format.extension()))
            } else {
                path
            };
            fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Forecast written");
        }
    }

    Ok(())
}
