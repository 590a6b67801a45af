//! Inbound event document.
//!
//! The event is the JSON record the monitoring pipeline hands to the handler:
//! a `client` (the monitored host) and a `check` (the result being reported).
//! Keys the handler does not model are kept in `extra` maps so templates and
//! custom field lookups can still reach them.
//!
//! Channel overrides (`slack`, `slack_channel`) are kept as raw JSON and read
//! leniently: a wrongly shaped override is ignored with a warning so routing
//! falls through to the next tier instead of rejecting the event.

use crate::error::EventError;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status used when the event omits `check.status`.
const MISSING_STATUS: i64 = 3;

/// A check result for one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub client: Client,
    pub check: Check,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The monitored host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub subscriptions: Vec<String>,
    /// Per-client routing block (`client.slack.channels`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack: Option<Value>,
    /// Single-channel shorthand (`client.slack_channel`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_channel: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The check result being reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    #[serde(default = "missing_status")]
    pub status: i64,
    #[serde(default)]
    pub output: String,
    /// Pre-built notification text; used verbatim when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_channel: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn missing_status() -> i64 {
    MISSING_STATUS
}

impl Event {
    /// Parse an event from its JSON text.
    pub fn from_json(input: &str) -> Result<Self, EventError> {
        serde_json::from_str(input).map_err(|e| EventError::InvalidJson(e.to_string()))
    }

    /// Severity of the check result.
    pub fn severity(&self) -> Severity {
        Severity::from_status(self.check.status)
    }

    /// Client identifier for titles: the address, or the name without one.
    pub fn client_label(&self) -> &str {
        match self.client.address.as_deref() {
            Some(address) if !address.is_empty() => address,
            _ => &self.client.name,
        }
    }

    /// Look up a custom field by key, client first, then check.
    ///
    /// Returns `None` for missing keys and explicit `null` values.
    pub fn field_value(&self, key: &str) -> Option<Value> {
        [
            serde_json::to_value(&self.client),
            serde_json::to_value(&self.check),
        ]
        .into_iter()
        .filter_map(Result::ok)
        .find_map(|section| section.get(key).filter(|v| !v.is_null()).cloned())
    }

    /// The whole event as a JSON value (template context).
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Client {
    /// Channels configured on the client, if any.
    pub fn routed_channels(&self) -> Option<Vec<String>> {
        routed_channels("client", self.slack.as_ref(), self.slack_channel.as_ref())
    }
}

impl Check {
    /// Channels configured on the check, if any.
    pub fn routed_channels(&self) -> Option<Vec<String>> {
        routed_channels("check", self.slack.as_ref(), self.slack_channel.as_ref())
    }
}

/// The routing block's list wins over the single-channel shorthand.
/// Blank and non-string entries are dropped; an empty result counts as not
/// configured.
fn routed_channels(
    scope: &'static str,
    routing: Option<&Value>,
    single: Option<&Value>,
) -> Option<Vec<String>> {
    let from_block = routing
        .filter(|r| !r.is_null())
        .and_then(|r| block_channels(scope, r));
    let candidates = from_block.or_else(|| single.and_then(|s| shorthand_channel(scope, s)))?;

    let channels: Vec<String> = candidates
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    if channels.is_empty() {
        None
    } else {
        Some(channels)
    }
}

/// `slack.channels`: a string or a list of strings.
fn block_channels(scope: &'static str, routing: &Value) -> Option<Vec<String>> {
    let Some(block) = routing.as_object() else {
        tracing::warn!(scope, "Ignoring malformed slack routing block: expected an object");
        return None;
    };
    match block.get("channels")? {
        Value::Null => None,
        Value::String(channel) => Some(vec![channel.clone()]),
        Value::Array(entries) => {
            let channels: Vec<String> = entries
                .iter()
                .filter_map(|entry| entry.as_str().map(str::to_string))
                .collect();
            if channels.len() < entries.len() {
                tracing::warn!(
                    scope,
                    dropped = entries.len() - channels.len(),
                    "Ignoring non-string entries in slack.channels"
                );
            }
            Some(channels)
        }
        _ => {
            tracing::warn!(scope, "Ignoring malformed slack.channels: expected a string or a list");
            None
        }
    }
}

/// `slack_channel`: a single string.
fn shorthand_channel(scope: &'static str, single: &Value) -> Option<Vec<String>> {
    match single {
        Value::Null => None,
        Value::String(channel) => Some(vec![channel.clone()]),
        _ => {
            tracing::warn!(scope, "Ignoring malformed slack_channel: expected a string");
            None
        }
    }
}
