//! Centralized error types for the handler using thiserror.
//!
//! Each concern gets its own enum; [`HandlerError`] aggregates them at the
//! invocation boundary and maps every failure to a process exit code.

use std::time::Duration;
use thiserror::Error;

/// Exit code used when the handler configuration is missing or malformed.
///
/// Matches the monitoring convention of reporting "unknown" (3) for a
/// misconfigured plugin.
pub const EXIT_CONFIG: i32 = 3;

/// Exit code used when the event cannot be read or a template fails.
pub const EXIT_INPUT: i32 = 2;

/// Exit code used when at least one channel could not be delivered.
pub const EXIT_DELIVERY: i32 = 1;

/// Errors related to loading and validating the handler settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    LoadError(String),
    #[error("invalid configuration: {0}")]
    ValidationError(String),
    #[error("settings section '{name}' not found (check the --json value)")]
    MissingSection { name: String },
    #[error("invalid setting '{key}': {message}")]
    InvalidSetting { key: String, message: String },
}

/// Errors related to reading the inbound event document.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("failed to read event: {0}")]
    ReadFailed(String),
    #[error("invalid event JSON: {0}")]
    InvalidJson(String),
}

/// Errors related to template loading and rendering.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("cannot read template '{path}': {message}")]
    ReadFailed { path: String, message: String },
    #[error("template render failed: {message}")]
    RenderFailed { message: String },
}

/// Errors related to webhook delivery.
///
/// The first three variants are the retryable failures of a single attempt;
/// the rest are terminal for the channel.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("webhook returned HTTP {status}{}", detail_suffix(.detail))]
    HttpStatus { status: u16, detail: Option<String> },
    #[error("attempt timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("no webhook configured for channel '{channel}'")]
    NoEndpoint { channel: String },
    #[error("failed to build payload: {0}")]
    Payload(String),
    #[error("gave up after {attempts} attempt(s), last error: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<DeliveryError>,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) if !d.is_empty() => format!(" ({})", d),
        _ => String::new(),
    }
}

impl DeliveryError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeliveryError::HttpStatus { .. } | DeliveryError::Timeout(_) | DeliveryError::Network(_)
        )
    }
}

/// Top-level error of one handler invocation.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("event error: {0}")]
    Event(#[from] EventError),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("delivery failed for channel(s): {}", .channels.join(", "))]
    Delivery { channels: Vec<String> },
}

impl HandlerError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            HandlerError::Config(_) => EXIT_CONFIG,
            HandlerError::Event(_) | HandlerError::Template(_) => EXIT_INPUT,
            HandlerError::Delivery { .. } => EXIT_DELIVERY,
        }
    }
}
