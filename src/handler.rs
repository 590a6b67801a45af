//! Event handling: one event in, one notice per resolved channel out.
//!
//! ```text
//! event -> channels::resolve -> notice::format_notice (once)
//!       -> payload for every channel -> Notifier::send, in order
//! ```
//!
//! Channels are delivered sequentially. A failed channel is recorded and the
//! next one is still attempted. Template errors abort the invocation before
//! anything is sent.

use crate::channels::{self, ChannelSource};
use crate::config::HandlerConfig;
use crate::error::{ConfigError, DeliveryError, HandlerError};
use crate::event::Event;
use crate::notice::format_notice;
use crate::notify::{
    Delivery, Notifier, RequestBody, SlackNotifier, build_payload, render_payload_template,
};
use crate::template::{JinjaRenderer, TemplateRenderer, load_template};
use std::sync::Arc;
use tracing::Instrument;

/// Outcome of one channel.
#[derive(Debug)]
pub struct ChannelOutcome {
    pub channel: String,
    pub result: Result<Delivery, DeliveryError>,
}

/// What happened during one invocation.
#[derive(Debug)]
pub struct HandleReport {
    pub source: ChannelSource,
    pub outcomes: Vec<ChannelOutcome>,
}

impl HandleReport {
    /// Nothing was resolved, so nothing was sent.
    pub fn is_noop(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn delivered(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| o.channel.as_str())
    }

    pub fn failed_channels(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.channel.clone())
            .collect()
    }

    /// Turn per-channel failures into a [`HandlerError::Delivery`].
    pub fn into_result(self) -> Result<Self, HandlerError> {
        let failed = self.failed_channels();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(HandlerError::Delivery { channels: failed })
        }
    }
}

/// Handles events for one compiled settings section.
pub struct EventHandler {
    config: HandlerConfig,
    notifier: Arc<dyn Notifier>,
    renderer: Arc<dyn TemplateRenderer>,
}

impl EventHandler {
    /// Handler with the Slack notifier and the Jinja renderer.
    pub fn new(config: HandlerConfig) -> Result<Self, ConfigError> {
        let notifier = Arc::new(SlackNotifier::from_config(&config)?);
        Ok(Self::with_parts(
            config,
            notifier,
            Arc::new(JinjaRenderer::new()),
        ))
    }

    pub fn with_parts(
        config: HandlerConfig,
        notifier: Arc<dyn Notifier>,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            config,
            notifier,
            renderer,
        }
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Resolve, format and deliver.
    ///
    /// # Errors
    /// Only template failures are returned as errors. Delivery failures are
    /// recorded per channel in the report; see [`HandleReport::into_result`].
    pub async fn handle(&self, event: &Event) -> Result<HandleReport, HandlerError> {
        let span = tracing::info_span!(
            "handle_event",
            handler = %self.config.name,
            client = %event.client.name,
            check = %event.check.name
        );
        self.handle_in_span(event).instrument(span).await
    }

    async fn handle_in_span(&self, event: &Event) -> Result<HandleReport, HandlerError> {
        let resolution = channels::resolve(event, &self.config.channels);
        if resolution.channels.is_empty() {
            tracing::info!("No channels resolved, nothing to send");
            return Ok(HandleReport {
                source: resolution.source,
                outcomes: Vec::new(),
            });
        }

        let notice = format_notice(event, &self.config.notice, self.renderer.as_ref())?;
        let payload_template = self
            .config
            .payload
            .template
            .as_deref()
            .map(load_template)
            .transpose()?;

        // Every body is prepared before the first send, so a render failure
        // on a later channel cannot leave earlier channels notified.
        let mut prepared = Vec::with_capacity(resolution.channels.len());
        for channel in resolution.channels.iter() {
            let body = match &payload_template {
                Some(source) => Ok(render_payload_template(
                    source,
                    &notice,
                    channel,
                    event,
                    self.renderer.as_ref(),
                )?),
                None => {
                    let payload = build_payload(&notice, channel, event, &self.config.payload);
                    RequestBody::structured(&payload).inspect_err(|e| {
                        tracing::error!(channel = %channel, error = %e, "Failed to build payload");
                    })
                }
            };
            prepared.push((channel, body));
        }

        let mut outcomes = Vec::with_capacity(prepared.len());
        for (channel, body) in prepared {
            let result = match body {
                Ok(body) => self.notifier.send(channel, &body).await,
                Err(e) => Err(e),
            };
            outcomes.push(ChannelOutcome {
                channel: channel.to_string(),
                result,
            });
        }

        let report = HandleReport {
            source: resolution.source,
            outcomes,
        };
        tracing::info!(
            source = report.source.as_str(),
            delivered = report.delivered().count(),
            failed = report.failed_channels().len(),
            "Event handled"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandler")
            .field("config", &self.config)
            .field("notifier", &self.notifier.name())
            .finish()
    }
}
