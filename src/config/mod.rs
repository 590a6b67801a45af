//! Handler settings loading and validation.
//!
//! Settings are read from a YAML (or JSON) file holding named sections, one
//! per handler. A section is deserialized into [`HandlerSettings`] and then
//! compiled into a [`HandlerConfig`] with defaults applied, `${ENV_VAR}`
//! references resolved and template paths made absolute.

mod env;
mod runtime;
mod secret;
mod types;
mod validation;

pub use env::{resolve_env_vars, resolve_path};
pub use runtime::{
    ChannelRouting, DEFAULT_ICON_URL, Endpoints, HandlerConfig, NoticeOptions, PayloadOptions,
    ProxyConfig,
};
pub use secret::SecretString;
pub use types::{
    ChannelsSettings, DEFAULT_CONFIG_PATH, DEFAULT_SECTION, DurationSetting, HandlerSettings,
    LinkNames, OneOrMany,
};

#[cfg(test)]
mod tests;
