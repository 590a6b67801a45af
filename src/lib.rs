// src/lib.rs
//! slack-handler - post monitoring events to Slack incoming webhooks.

pub mod channels;
pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod notice;
pub mod notify;
pub mod severity;
pub mod template;

// Re-export commonly used types
pub use channels::{ChannelSet, ChannelSource, Resolution, resolve};
pub use cli::LogFormat;
pub use config::{HandlerConfig, HandlerSettings};
pub use error::HandlerError;
pub use event::Event;
pub use handler::{EventHandler, HandleReport};
pub use notice::{Notice, format_notice};
pub use notify::{DeliveryEngine, Notifier, RetryPolicy, SlackNotifier};
pub use severity::{Severity, translate};
pub use template::{JinjaRenderer, TemplateContext, TemplateRenderer};
