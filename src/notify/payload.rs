//! Slack webhook payload construction.
//!
//! The structured payload is one attachment per notice: title, prefixed
//! text, severity color and optional custom fields. When a payload template
//! is configured the rendered text replaces the structured payload and is
//! sent as-is.

use crate::config::{LinkNames, PayloadOptions};
use crate::error::{DeliveryError, TemplateError};
use crate::event::Event;
use crate::notice::Notice;
use crate::template::{TemplateContext, TemplateRenderer};
use serde::Serialize;
use serde_json::Value;

/// Values longer than this are displayed full width.
const SHORT_FIELD_MAX_CHARS: usize = 50;

/// Incoming-webhook payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlackPayload {
    pub icon_url: String,
    pub attachments: Vec<Attachment>,
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_names: Option<LinkNames>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub title: String,
    pub text: String,
    pub color: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mrkdwn_in: Vec<&'static str>,
}

/// One custom field. `value` is omitted when the event has no such key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub short: bool,
}

/// Request body handed to the delivery engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Serialized [`SlackPayload`].
    Structured(String),
    /// Rendered payload template, sent verbatim.
    Templated(String),
}

impl RequestBody {
    /// Serialize a structured payload.
    pub fn structured(payload: &SlackPayload) -> Result<Self, DeliveryError> {
        serde_json::to_string(payload)
            .map(RequestBody::Structured)
            .map_err(|e| DeliveryError::Payload(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            RequestBody::Structured(body) | RequestBody::Templated(body) => body,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RequestBody::Structured(_) => "structured",
            RequestBody::Templated(_) => "templated",
        }
    }
}

/// Whether a field value fits the half-width layout.
pub fn is_short(value: &str) -> bool {
    value.chars().count() <= SHORT_FIELD_MAX_CHARS
}

/// Look up each configured field in the event.
pub fn build_fields(event: &Event, names: &[String]) -> Vec<Field> {
    names
        .iter()
        .map(|name| {
            let value = event.field_value(name).map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            });
            Field {
                title: name.clone(),
                short: value.as_deref().is_none_or(is_short),
                value,
            }
        })
        .collect()
}

/// Assemble the structured payload for one channel.
pub fn build_payload(
    notice: &Notice,
    channel: &str,
    event: &Event,
    options: &PayloadOptions,
) -> SlackPayload {
    let severity = event.severity();
    SlackPayload {
        icon_url: options.icon_url.clone(),
        attachments: vec![Attachment {
            title: format!("{} - {}", event.client_label(), severity.label()),
            text: notice.with_prefix(options.message_prefix.as_deref()),
            color: severity.color(),
            fields: build_fields(event, &options.fields),
            mrkdwn_in: if options.markdown_enabled {
                vec!["text"]
            } else {
                Vec::new()
            },
        }],
        channel: channel.to_string(),
        username: options.bot_name.clone(),
        icon_emoji: options.icon_emoji.clone(),
        link_names: options.link_names,
    }
}

/// Render a payload template for one channel.
///
/// The context carries `notice` and `channel` in addition to the event keys.
pub fn render_payload_template(
    source: &str,
    notice: &Notice,
    channel: &str,
    event: &Event,
    renderer: &dyn TemplateRenderer,
) -> Result<RequestBody, TemplateError> {
    let context = TemplateContext::new(event, notice.incident_key())
        .with_notice(notice.as_str())
        .with_channel(channel);
    renderer.render(source, &context).map(RequestBody::Templated)
}
