//! Notification delivery to Slack incoming webhooks.
//!
//! - [`payload`] turns a notice into a request body
//! - [`delivery`] posts bodies with the retry/timeout policy
//! - [`Notifier`] is the per-channel send seam; [`SlackNotifier`] maps a
//!   channel to its webhook and drives the delivery engine
//!
//! Each channel is an independent delivery unit: a failure is reported for
//! that channel only.

pub mod delivery;
pub mod payload;

use crate::config::{Endpoints, HandlerConfig};
use crate::error::{ConfigError, DeliveryError};
use async_trait::async_trait;
use tracing::Instrument;

pub use delivery::{Delivery, DeliveryEngine, RetryPolicy, build_client};
pub use payload::{
    Attachment, Field, RequestBody, SlackPayload, build_fields, build_payload, is_short,
    render_payload_template,
};

/// Sends a request body to one channel.
///
/// Implementations own their retry policy; an `Err` means the channel is
/// given up on.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Name used in logs (the settings section name).
    fn name(&self) -> &str;

    /// Deliver `body` to `channel`.
    async fn send(&self, channel: &str, body: &RequestBody) -> Result<Delivery, DeliveryError>;
}

/// Notifier for Slack-compatible incoming webhooks.
pub struct SlackNotifier {
    name: String,
    endpoints: Endpoints,
    engine: DeliveryEngine,
}

impl SlackNotifier {
    pub fn new(name: impl Into<String>, endpoints: Endpoints, engine: DeliveryEngine) -> Self {
        Self {
            name: name.into(),
            endpoints,
            engine,
        }
    }

    /// Build the notifier, its HTTP client and proxy from a compiled config.
    pub fn from_config(config: &HandlerConfig) -> Result<Self, ConfigError> {
        let client = build_client(config.proxy.as_ref())?;
        Ok(Self::new(
            config.name.clone(),
            config.endpoints.clone(),
            DeliveryEngine::new(client, config.retry),
        ))
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, channel: &str, body: &RequestBody) -> Result<Delivery, DeliveryError> {
        let Some(endpoint) = self.endpoints.for_channel(channel) else {
            tracing::error!(channel = %channel, "No webhook configured for channel");
            return Err(DeliveryError::NoEndpoint {
                channel: channel.to_string(),
            });
        };

        let span = tracing::info_span!(
            "deliver",
            handler = %self.name,
            channel = %channel,
            endpoint = %endpoint.endpoint_hint()
        );

        async {
            tracing::debug!(body_kind = body.kind(), body_len = body.as_str().len(), "Sending notice");
            match self.engine.deliver(body, endpoint).await {
                Ok(delivery) => {
                    tracing::info!(
                        attempts = delivery.attempts,
                        status = delivery.status,
                        "Notice delivered"
                    );
                    Ok(delivery)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to deliver notice");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for SlackNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let endpoints = match &self.endpoints {
            Endpoints::Single(_) => "single".to_string(),
            Endpoints::PerChannel(map) => format!("{} channel(s)", map.len()),
        };
        f.debug_struct("SlackNotifier")
            .field("name", &self.name)
            .field("endpoints", &endpoints)
            .field("policy", self.engine.policy())
            .finish()
    }
}
