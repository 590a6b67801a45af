//! Runtime configuration: settings with defaults applied and secrets resolved.

use super::env::{resolve_env_vars, resolve_path};
use super::secret::SecretString;
use super::types::{HandlerSettings, LinkNames, OneOrMany};
use super::validation::{validate_proxy_address, validate_webhook_url};
use crate::error::ConfigError;
use crate::notify::RetryPolicy;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Icon shown when neither `icon_url` nor a per-event icon is configured.
pub const DEFAULT_ICON_URL: &str =
    "https://raw.githubusercontent.com/sensu/sensu-logo/master/sensu1_flat%20white%20bg_png.png";

/// Compiled handler configuration for one invocation.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Settings section name, for logging.
    pub name: String,
    pub endpoints: Endpoints,
    pub channels: ChannelRouting,
    pub notice: NoticeOptions,
    pub payload: PayloadOptions,
    pub retry: RetryPolicy,
    pub proxy: Option<ProxyConfig>,
}

/// Where requests go.
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoints {
    /// One webhook for every channel.
    Single(SecretString),
    /// One webhook per channel; unmapped channels cannot be delivered.
    PerChannel(BTreeMap<String, SecretString>),
}

impl Endpoints {
    /// Webhook for a channel.
    pub fn for_channel(&self, channel: &str) -> Option<&SecretString> {
        match self {
            Endpoints::Single(url) => Some(url),
            Endpoints::PerChannel(map) => map.get(channel),
        }
    }
}

/// Configured channel tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelRouting {
    pub default: Vec<String>,
    pub compulsory: Vec<String>,
}

/// Options for the notice formatter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticeOptions {
    /// Message template file, already resolved against the config directory.
    pub template: Option<PathBuf>,
    pub surround: Option<String>,
    pub dashboard: Option<String>,
}

/// Options for the payload builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadOptions {
    /// Full request body template; supersedes the structured payload.
    pub template: Option<PathBuf>,
    pub icon_url: String,
    pub icon_emoji: Option<String>,
    pub bot_name: Option<String>,
    pub message_prefix: Option<String>,
    pub markdown_enabled: bool,
    pub link_names: Option<LinkNames>,
    pub fields: Vec<String>,
}

impl Default for PayloadOptions {
    fn default() -> Self {
        Self {
            template: None,
            icon_url: DEFAULT_ICON_URL.to_string(),
            icon_emoji: None,
            bot_name: None,
            message_prefix: None,
            markdown_enabled: true,
            link_names: None,
            fields: Vec::new(),
        }
    }
}

/// HTTP proxy used for every attempt of the invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    /// Proxy URL, e.g. `http://proxy.internal:3128`.
    pub url: String,
    pub credentials: Option<(String, SecretString)>,
}

impl HandlerSettings {
    /// Apply defaults, resolve secrets and paths, and validate.
    ///
    /// # Errors
    /// Every problem found is returned, not only the first.
    pub fn compile(self, name: &str, config_dir: &Path) -> Result<HandlerConfig, Vec<ConfigError>> {
        let mut errors = Vec::new();

        let endpoints = match compile_endpoints(&self) {
            Ok(endpoints) => Some(endpoints),
            Err(mut errs) => {
                errors.append(&mut errs);
                None
            }
        };

        let proxy = match compile_proxy(&self) {
            Ok(proxy) => proxy,
            Err(e) => {
                errors.push(e);
                None
            }
        };

        let retry = compile_retry(&self).unwrap_or_else(|e| {
            errors.push(e);
            RetryPolicy::default()
        });

        let (Some(endpoints), true) = (endpoints, errors.is_empty()) else {
            return Err(errors);
        };

        let channels = self.channels.unwrap_or_default();
        let routing = ChannelRouting {
            default: channels
                .default
                .as_ref()
                .map(OneOrMany::to_vec)
                .or_else(|| self.channel.clone().map(|c| vec![c]))
                .unwrap_or_default(),
            compulsory: channels
                .compulsory
                .as_ref()
                .map(OneOrMany::to_vec)
                .unwrap_or_default(),
        };

        let message_template = self
            .template
            .or(self.message_template)
            .map(|p| resolve_path(&p, config_dir));

        Ok(HandlerConfig {
            name: name.to_string(),
            endpoints,
            channels: routing,
            notice: NoticeOptions {
                template: message_template,
                surround: self.surround.filter(|s| !s.is_empty()),
                dashboard: self.dashboard.filter(|s| !s.is_empty()),
            },
            payload: PayloadOptions {
                template: self.payload_template.map(|p| resolve_path(&p, config_dir)),
                icon_url: self.icon_url.unwrap_or_else(|| DEFAULT_ICON_URL.to_string()),
                icon_emoji: self.icon_emoji,
                bot_name: self.bot_name,
                message_prefix: self.message_prefix,
                markdown_enabled: self.markdown_enabled.unwrap_or(true),
                link_names: self.link_names,
                fields: self.fields.as_ref().map(OneOrMany::to_vec).unwrap_or_default(),
            },
            retry,
            proxy,
        })
    }
}

fn compile_endpoints(settings: &HandlerSettings) -> Result<Endpoints, Vec<ConfigError>> {
    let resolve = |key: String, raw: &str| -> Result<SecretString, ConfigError> {
        let url = resolve_env_vars(raw).map_err(|e| ConfigError::InvalidSetting {
            key: key.clone(),
            message: e.to_string(),
        })?;
        validate_webhook_url(&url).map_err(|message| ConfigError::InvalidSetting { key, message })?;
        Ok(SecretString::new(url))
    };

    match (&settings.webhook_urls, &settings.webhook_url) {
        (Some(map), _) if !map.is_empty() => {
            let mut errors = Vec::new();
            let mut resolved = BTreeMap::new();
            for (channel, raw) in map {
                match resolve(format!("webhook_urls.{}", channel), raw) {
                    Ok(url) => {
                        resolved.insert(channel.clone(), url);
                    }
                    Err(e) => errors.push(e),
                }
            }
            if errors.is_empty() {
                Ok(Endpoints::PerChannel(resolved))
            } else {
                Err(errors)
            }
        }
        (_, Some(raw)) => resolve("webhook_url".to_string(), raw)
            .map(Endpoints::Single)
            .map_err(|e| vec![e]),
        _ => Err(vec![ConfigError::ValidationError(
            "one of webhook_url or webhook_urls is required".to_string(),
        )]),
    }
}

fn compile_proxy(settings: &HandlerSettings) -> Result<Option<ProxyConfig>, ConfigError> {
    let Some(address) = settings.proxy_address.as_deref().filter(|a| !a.is_empty()) else {
        if settings.proxy_port.is_some() || settings.proxy_username.is_some() {
            return Err(ConfigError::InvalidSetting {
                key: "proxy_address".to_string(),
                message: "proxy_port/proxy_username given without a proxy address".to_string(),
            });
        }
        return Ok(None);
    };

    let invalid = |message: String| ConfigError::InvalidSetting {
        key: "proxy_address".to_string(),
        message,
    };

    let base = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    };
    let mut parsed =
        reqwest::Url::parse(&base).map_err(|e| invalid(format!("not a valid address: {}", e)))?;
    // `proxy_port` replaces any port already written into the address.
    if let Some(port) = settings.proxy_port {
        parsed
            .set_port(Some(port))
            .map_err(|()| invalid("proxy address cannot carry a port".to_string()))?;
    }
    let url = parsed.as_str().trim_end_matches('/').to_string();
    validate_proxy_address(&url).map_err(invalid)?;

    let credentials = match (&settings.proxy_username, &settings.proxy_password) {
        (Some(user), Some(password)) => {
            let password = resolve_env_vars(password).map_err(|e| ConfigError::InvalidSetting {
                key: "proxy_password".to_string(),
                message: e.to_string(),
            })?;
            Some((user.clone(), SecretString::new(password)))
        }
        (Some(_), None) => {
            return Err(ConfigError::InvalidSetting {
                key: "proxy_password".to_string(),
                message: "required when proxy_username is set".to_string(),
            });
        }
        (None, _) => None,
    };

    Ok(Some(ProxyConfig { url, credentials }))
}

fn compile_retry(settings: &HandlerSettings) -> Result<RetryPolicy, ConfigError> {
    let defaults = RetryPolicy::default();
    let retries = settings.webhook_retries.unwrap_or(defaults.retries);
    if retries == 0 {
        return Err(ConfigError::InvalidSetting {
            key: "webhook_retries".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    let timeout = settings
        .webhook_timeout
        .map(|d| d.as_duration())
        .unwrap_or(defaults.timeout);
    if timeout.is_zero() {
        return Err(ConfigError::InvalidSetting {
            key: "webhook_timeout".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    Ok(RetryPolicy {
        retries,
        timeout,
        retry_sleep: settings
            .webhook_retry_sleep
            .map(|d| d.as_duration())
            .unwrap_or(defaults.retry_sleep),
    })
}
