//! Raw settings as they appear in the settings file, and loading.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default settings file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sensu/conf.d/slack.json";

/// Default settings section name (`-j/--json`).
pub const DEFAULT_SECTION: &str = "slack";

/// Key under which pipelines usually nest handler settings.
const HANDLERS_KEY: &str = "handlers";

/// One handler settings section. Every key is optional here; defaults and
/// required-key checks are applied by [`HandlerSettings::compile`].
///
/// [`HandlerSettings::compile`]: super::HandlerSettings::compile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandlerSettings {
    /// Single incoming webhook URL (supports `${ENV_VAR}`).
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Channel -> webhook URL mapping; supersedes `webhook_url`.
    #[serde(default)]
    pub webhook_urls: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub channels: Option<ChannelsSettings>,
    /// Single default channel, used when `channels.default` is unset.
    #[serde(default)]
    pub channel: Option<String>,
    /// Notice template file; `message_template` is the older spelling.
    #[serde(default)]
    pub template: Option<PathBuf>,
    #[serde(default)]
    pub message_template: Option<PathBuf>,
    /// Full request body template file.
    #[serde(default)]
    pub payload_template: Option<PathBuf>,
    #[serde(default)]
    pub bot_name: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub icon_emoji: Option<String>,
    #[serde(default)]
    pub message_prefix: Option<String>,
    #[serde(default)]
    pub surround: Option<String>,
    #[serde(default)]
    pub markdown_enabled: Option<bool>,
    #[serde(default, alias = "custom_field")]
    pub fields: Option<OneOrMany>,
    #[serde(default)]
    pub webhook_retries: Option<u32>,
    #[serde(default)]
    pub webhook_timeout: Option<DurationSetting>,
    #[serde(default)]
    pub webhook_retry_sleep: Option<DurationSetting>,
    #[serde(default, alias = "proxy_addr")]
    pub proxy_address: Option<String>,
    #[serde(default)]
    pub proxy_port: Option<u16>,
    #[serde(default)]
    pub proxy_username: Option<String>,
    #[serde(default)]
    pub proxy_password: Option<String>,
    /// URL prefix used to turn the incident key into a link.
    #[serde(default)]
    pub dashboard: Option<String>,
    #[serde(default)]
    pub link_names: Option<LinkNames>,
}

/// `channels` block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelsSettings {
    #[serde(default)]
    pub default: Option<OneOrMany>,
    #[serde(default)]
    pub compulsory: Option<OneOrMany>,
}

/// A setting written either as a single string or as a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value.clone()],
            OneOrMany::Many(values) => values.clone(),
        }
    }
}

/// Slack's `link_names` flag. Slack accepts `true` as well as `1`, and the
/// value is passed through in whichever form the settings use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkNames {
    Flag(bool),
    Number(i64),
}

/// A duration given as whole seconds (`10`) or a humantime string (`"250ms"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DurationSetting {
    Seconds(u64),
    Human(#[serde(with = "humantime_serde")] Duration),
}

impl DurationSetting {
    pub fn as_duration(self) -> Duration {
        match self {
            DurationSetting::Seconds(secs) => Duration::from_secs(secs),
            DurationSetting::Human(d) => d,
        }
    }
}

impl HandlerSettings {
    /// Load one section from a settings file.
    ///
    /// The section is looked up at the root first, then under `handlers:`.
    ///
    /// # Errors
    /// [`ConfigError::LoadError`] if the file cannot be read,
    /// [`ConfigError::ValidationError`] if it is not valid YAML/JSON or the
    /// section has the wrong shape, [`ConfigError::MissingSection`] if the
    /// section does not exist.
    pub fn load(path: &Path, section: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;
        Self::from_str_section(&content, section)
    }

    /// Parse one section from settings text.
    pub fn from_str_section(content: &str, section: &str) -> Result<Self, ConfigError> {
        let root: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        let raw = root
            .get(section)
            .or_else(|| root.get(HANDLERS_KEY).and_then(|h| h.get(section)))
            .filter(|v| !v.is_null())
            .ok_or_else(|| ConfigError::MissingSection {
                name: section.to_string(),
            })?;

        serde_yaml::from_value(raw.clone())
            .map_err(|e| ConfigError::ValidationError(format!("section '{}': {}", section, e)))
    }
}
