//! Binary crate for the `eventcast` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive classifier configuration
//! - Human-friendly output and file export

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod output;

const DEFAULT_FILTER: &str = "eventcast=info,eventcast_core=info";
const VERBOSE_FILTER: &str = "eventcast=debug,eventcast_core=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();

    let fallback = if cmd.verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    cmd.run().await
}
