//! URL and template validation utilities.

use super::runtime::HandlerConfig;
use crate::error::ConfigError;
use crate::template::{load_template, validate_template};

/// Webhook URLs must be absolute http(s) URLs with a host.
pub(crate) fn validate_webhook_url(url: &str) -> Result<(), String> {
    let parsed = reqwest::Url::parse(url).map_err(|e| format!("not a valid URL: {}", e))?;
    if !matches!(parsed.scheme(), "https" | "http") {
        return Err(format!(
            "unsupported scheme '{}': expected https",
            parsed.scheme()
        ));
    }
    if parsed.host_str().is_none() {
        return Err("URL has no host".to_string());
    }
    Ok(())
}

/// Proxy URLs must parse and be accepted by the HTTP client.
pub(crate) fn validate_proxy_address(url: &str) -> Result<(), String> {
    let parsed = reqwest::Url::parse(url).map_err(|e| format!("not a valid address: {}", e))?;
    if parsed.host_str().is_none() {
        return Err("proxy address has no host".to_string());
    }
    reqwest::Proxy::all(url).map_err(|e| e.to_string())?;
    Ok(())
}

impl HandlerConfig {
    /// Load and syntax-check every configured template file.
    ///
    /// Used by `--validate`; a normal invocation surfaces the same problems
    /// as template errors when it renders.
    pub fn check_templates(&self) -> Vec<ConfigError> {
        [
            ("template", self.notice.template.as_ref()),
            ("payload_template", self.payload.template.as_ref()),
        ]
        .into_iter()
        .filter_map(|(key, path)| path.map(|p| (key, p)))
        .filter_map(|(key, path)| {
            let result = load_template(path)
                .map_err(|e| e.to_string())
                .and_then(|source| validate_template(&source));
            result.err().map(|message| ConfigError::InvalidSetting {
                key: key.to_string(),
                message,
            })
        })
        .collect()
    }
}
