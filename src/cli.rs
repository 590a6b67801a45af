//! Command-line interface using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{DEFAULT_CONFIG_PATH, DEFAULT_SECTION};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text (default).
    #[default]
    Text,
    /// Structured JSON for log aggregation.
    Json,
}

/// Post monitoring events to Slack channels through incoming webhooks.
#[derive(Parser, Debug)]
#[command(name = "handler-slack")]
#[command(version)]
#[command(about = "Post monitoring events to Slack channels through incoming webhooks")]
pub struct Cli {
    /// Path to the settings file.
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Name of the settings section to use.
    #[arg(short = 'j', long = "json", default_value = DEFAULT_SECTION)]
    pub section: String,

    /// Read the event from this file instead of stdin.
    #[arg(short = 'e', long = "event")]
    pub event: Option<PathBuf>,

    /// Validate the settings section and exit.
    #[arg(long = "validate")]
    pub validate: bool,

    /// Log format: text or json.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text, env = "LOG_FORMAT")]
    pub log_format: LogFormat,
}
